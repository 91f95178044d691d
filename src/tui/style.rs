//! Color constants and auto-scaling helpers for the TUI.

use ratatui::style::Color;

use super::runtime::Series;

pub const INLET_COLOR: Color = Color::Gray;
pub const OUTLET_COLOR: Color = Color::Blue;
pub const CRITICAL_POINT_COLOR: Color = Color::Green;
pub const FLOW_COLOR: Color = Color::Yellow;
/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Infeasible-setpoint alarm color.
pub const ALARM: Color = Color::Red;
/// Actuator gauge color while travelling.
pub const MOVING: Color = Color::Yellow;
/// Actuator gauge color when settled.
pub const SETTLED: Color = Color::Cyan;
pub const DAY: Color = Color::Yellow;
pub const NIGHT: Color = Color::Magenta;

pub fn series_color(series: Series) -> Color {
    match series {
        Series::Inlet => INLET_COLOR,
        Series::Outlet => OUTLET_COLOR,
        Series::CriticalPoint => CRITICAL_POINT_COLOR,
        Series::Flow => FLOW_COLOR,
    }
}

/// Computes Y-axis bounds from chart data points with 10% padding.
pub fn auto_bounds_y<'a>(series: impl IntoIterator<Item = &'a [(f64, f64)]>) -> [f64; 2] {
    let (min, max) = series
        .into_iter()
        .flatten()
        .map(|&(_, y)| y)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    let range = (max - min).max(0.1);
    let pad = range * 0.1;
    [min - pad, max + pad]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_gets_unit_bounds() {
        assert_eq!(auto_bounds_y(std::iter::empty::<&[(f64, f64)]>()), [0.0, 1.0]);
    }

    #[test]
    fn bounds_span_all_series_with_padding() {
        let a = [(0.0, 10.0), (1.0, 20.0)];
        let b = [(0.0, 60.0)];
        let [lo, hi] = auto_bounds_y([&a[..], &b[..]]);
        assert!((lo - 5.0).abs() < 1e-9);
        assert!((hi - 65.0).abs() < 1e-9);
    }
}
