//! Post-hoc summary statistics over the history window.

use std::fmt;

use serde::Serialize;

use super::controller::MIN_OUTLET_PRESSURE_M;
use super::types::SimulationDataPoint;

/// Cubic meters per hour for one liter per second.
const M3_PER_HOUR_PER_LPS: f64 = 3.6;

/// Aggregate indicators for a window of data points (normally one simulated day).
///
/// Computed from the points themselves so the summary always agrees with
/// what the charts show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    /// Number of points summarized.
    pub hours: usize,
    /// Lowest critical-point pressure (m).
    pub min_critical_pressure_m: f64,
    /// Mean critical-point pressure (m).
    pub mean_critical_pressure_m: f64,
    /// Highest critical-point pressure (m).
    pub max_critical_pressure_m: f64,
    /// Mean valve outlet pressure (m).
    pub mean_outlet_pressure_m: f64,
    /// Highest demand flow (l/s).
    pub peak_flow_lps: f64,
    /// Highest head loss (m).
    pub peak_head_loss_m: f64,
    /// Water delivered over the window, one hour per point (m^3).
    pub delivered_volume_m3: f64,
    /// Points whose outlet fell below the technical floor because the
    /// inlet could not support it.
    pub infeasible_hours: usize,
}

impl DailySummary {
    /// Summarizes `points`; an empty slice yields an all-zero summary.
    pub fn from_history<'a>(points: impl IntoIterator<Item = &'a SimulationDataPoint>) -> Self {
        let mut hours = 0_usize;
        let mut cp_min = f64::INFINITY;
        let mut cp_max = f64::NEG_INFINITY;
        let mut cp_sum = 0.0;
        let mut outlet_sum = 0.0;
        let mut peak_flow = 0.0_f64;
        let mut peak_loss = 0.0_f64;
        let mut volume = 0.0;
        let mut infeasible = 0_usize;

        for p in points {
            hours += 1;
            cp_min = cp_min.min(p.critical_point_pressure_m);
            cp_max = cp_max.max(p.critical_point_pressure_m);
            cp_sum += p.critical_point_pressure_m;
            outlet_sum += p.outlet_pressure_m;
            peak_flow = peak_flow.max(p.flow_lps);
            peak_loss = peak_loss.max(p.head_loss_m);
            volume += p.flow_lps * M3_PER_HOUR_PER_LPS;
            if p.outlet_pressure_m < MIN_OUTLET_PRESSURE_M {
                infeasible += 1;
            }
        }

        if hours == 0 {
            return Self {
                hours: 0,
                min_critical_pressure_m: 0.0,
                mean_critical_pressure_m: 0.0,
                max_critical_pressure_m: 0.0,
                mean_outlet_pressure_m: 0.0,
                peak_flow_lps: 0.0,
                peak_head_loss_m: 0.0,
                delivered_volume_m3: 0.0,
                infeasible_hours: 0,
            };
        }

        let n = hours as f64;
        Self {
            hours,
            min_critical_pressure_m: cp_min,
            mean_critical_pressure_m: cp_sum / n,
            max_critical_pressure_m: cp_max,
            mean_outlet_pressure_m: outlet_sum / n,
            peak_flow_lps: peak_flow,
            peak_head_loss_m: peak_loss,
            delivered_volume_m3: volume,
            infeasible_hours: infeasible,
        }
    }
}

impl fmt::Display for DailySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Daily Summary ({} h) ---", self.hours)?;
        writeln!(
            f,
            "Critical point:     min {:.2} m  mean {:.2} m  max {:.2} m",
            self.min_critical_pressure_m,
            self.mean_critical_pressure_m,
            self.max_critical_pressure_m
        )?;
        writeln!(f, "Mean valve outlet:  {:.2} m", self.mean_outlet_pressure_m)?;
        writeln!(f, "Peak flow:          {:.2} L/s", self.peak_flow_lps)?;
        writeln!(f, "Peak head loss:     {:.2} m", self.peak_head_loss_m)?;
        writeln!(f, "Delivered volume:   {:.1} m3", self.delivered_volume_m3)?;
        write!(f, "Infeasible hours:   {}", self.infeasible_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_gives_zero_summary() {
        let summary = DailySummary::from_history(&[]);
        assert_eq!(summary.hours, 0);
        assert_eq!(summary.min_critical_pressure_m, 0.0);
        assert_eq!(summary.delivered_volume_m3, 0.0);
    }

    #[test]
    fn aggregates_pressures_and_flow() {
        let points = vec![
            SimulationDataPoint::new(0, 10.0, 70.0, 24.5, 4.5),
            SimulationDataPoint::new(1, 20.0, 70.0, 40.0, 18.0),
        ];
        let summary = DailySummary::from_history(&points);
        assert_eq!(summary.hours, 2);
        assert_eq!(summary.min_critical_pressure_m, 20.0);
        assert_eq!(summary.max_critical_pressure_m, 22.0);
        assert_eq!(summary.mean_critical_pressure_m, 21.0);
        assert_eq!(summary.peak_flow_lps, 20.0);
        assert_eq!(summary.peak_head_loss_m, 18.0);
        assert!((summary.delivered_volume_m3 - 108.0).abs() < 1e-9);
        assert_eq!(summary.infeasible_hours, 0);
    }

    #[test]
    fn counts_outlets_below_floor() {
        let points = vec![
            SimulationDataPoint::new(0, 10.0, 8.0, 3.0, 4.5),
            SimulationDataPoint::new(1, 10.0, 70.0, 24.5, 4.5),
        ];
        assert_eq!(DailySummary::from_history(&points).infeasible_hours, 1);
    }

    #[test]
    fn display_does_not_panic() {
        let points = vec![SimulationDataPoint::new(0, 10.0, 70.0, 24.5, 4.5)];
        let s = format!("{}", DailySummary::from_history(&points));
        assert!(s.contains("Daily Summary"));
    }
}
