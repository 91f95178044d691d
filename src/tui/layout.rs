//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, Paragraph, Wrap};

use super::runtime::{App, Series, TARGET_RANGE_M};
use super::style;
use crate::sim::engine::Snapshot;
use crate::sim::types::SimulationDataPoint;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let snapshot = app.snapshot();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(12),   // chart + side panel
            Constraint::Length(3), // stat cards
            Constraint::Length(3), // schematic
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(42)])
        .split(rows[1]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // controls
            Constraint::Length(3), // actuator gauge
            Constraint::Min(4),    // diagnostic
        ])
        .split(body[1]);

    render_header(frame, app, &snapshot, rows[0]);
    render_chart(frame, app, body[0]);
    render_controls(frame, &snapshot, side[0]);
    render_actuator(frame, &snapshot, side[1]);
    render_diagnostic(frame, app, side[2]);
    render_stat_cards(frame, &snapshot, rows[2]);
    render_schematic(frame, &snapshot, rows[3]);
    render_footer(frame, rows[4]);
}

/// Header bar: scenario, clock, day/night, speed, run state.
fn render_header(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    let (state_icon, state_label) = if app.paused {
        ("‖", "PAUSED")
    } else {
        ("▶", "RUNNING")
    };
    let (period, period_color) = if snapshot.is_daytime {
        ("DAY", style::DAY)
    } else {
        ("NIGHT", style::NIGHT)
    };

    let header = Line::from(vec![
        Span::styled(
            " PRV-SIM ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            app.scenario_name.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" │ {} ", snapshot.timestamp)),
        Span::styled(
            period,
            Style::default()
                .fg(period_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " │ {}ms │ {} {} ",
            app.tick_interval_ms(),
            state_icon,
            state_label,
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn series_value(series: Series, p: &SimulationDataPoint) -> f64 {
    match series {
        Series::Inlet => p.inlet_pressure_m,
        Series::Outlet => p.outlet_pressure_m,
        Series::CriticalPoint => p.critical_point_pressure_m,
        Series::Flow => p.flow_lps,
    }
}

/// Pressure and flow over the history window.
fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let history = app.history();
    let visible: Vec<Series> = Series::ALL
        .into_iter()
        .filter(|&s| app.is_visible(s))
        .collect();

    // Hours wrap at midnight, so the x axis is the window index.
    let data: Vec<Vec<(f64, f64)>> = visible
        .iter()
        .map(|&s| {
            history
                .iter()
                .enumerate()
                .map(|(i, p)| (i as f64, series_value(s, p)))
                .collect()
        })
        .collect();

    let y_bounds = style::auto_bounds_y(data.iter().map(Vec::as_slice));
    let x_hi = (history.len().max(2) - 1) as f64;

    let datasets: Vec<Dataset> = visible
        .iter()
        .zip(&data)
        .map(|(&s, points)| {
            let name = if s == Series::Flow {
                "Flow (L/s)"
            } else {
                s.label()
            };
            Dataset::default()
                .name(name)
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(style::series_color(s)))
                .data(points)
        })
        .collect();

    let first = history.iter().next().map_or_else(String::new, |p| p.timestamp.clone());
    let last = history.latest().map_or_else(String::new, |p| p.timestamp.clone());

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" Pressure (m) and Flow (L/s), last 24 h ")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("hour")
                .bounds([0.0, x_hi])
                .labels(vec![first, last]),
        )
        .y_axis(
            Axis::default()
                .bounds(y_bounds)
                .labels(vec![
                    format!("{:.0}", y_bounds[0]),
                    format!("{:.0}", y_bounds[1]),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Operator settings, schedule, and the infeasible-setpoint alarm.
fn render_controls(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let cfg = &snapshot.config;
    let on_off = |b: bool| if b { "ON" } else { "OFF" };

    let mut lines = vec![
        Line::from(format!("  Mode       {}", cfg.control_mode)),
        Line::from(format!(
            "  Schedule   {}{}",
            on_off(cfg.schedule_enabled),
            snapshot.next_change.map_or_else(String::new, |c| format!(
                "  next {:02}:00 → {:.0}m",
                c.hour, c.target_m
            )),
        )),
        Line::from(format!("  Target     {:.0} m", cfg.target_value_m)),
        Line::from(format!(
            "  Inlet      {} ({:.0} m)",
            if cfg.manual_inlet_enabled {
                "MANUAL"
            } else {
                "dynamic"
            },
            cfg.manual_inlet_value_m
        )),
        Line::from(format!("  Friction   k={:.3}", cfg.friction_coefficient)),
    ];

    if snapshot.alarm {
        let inlet = snapshot.latest.as_ref().map_or(0.0, |p| p.inlet_pressure_m);
        lines.push(Line::from(Span::styled(
            format!("  ALARM: target unreachable, inlet {inlet:.1} m too low"),
            Style::default()
                .fg(style::ALARM)
                .add_modifier(Modifier::BOLD),
        )));
    }

    let border = if snapshot.alarm {
        Style::default().fg(style::ALARM)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(border);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// Effective actuator setpoint against the target range.
fn render_actuator(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let effective = snapshot.effective_target_m;
    let color = if snapshot.alarm {
        style::ALARM
    } else if snapshot.moving {
        style::MOVING
    } else {
        style::SETTLED
    };
    let label = if snapshot.moving {
        format!(
            "{effective:.1} m → {:.1} m  MOVING",
            snapshot.config.target_value_m
        )
    } else {
        format!("{effective:.1} m")
    };

    let gauge = Gauge::default()
        .block(Block::default().title(" Actuator ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(color))
        .ratio((effective / TARGET_RANGE_M.end()).clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_diagnostic(frame: &mut Frame, app: &App, area: Rect) {
    let status = app.diagnostic();
    let block = Block::default()
        .title(" Diagnostic (d) ")
        .borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(status.to_string())
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_stat_cards(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let latest = snapshot.latest.as_ref();
    let stats = [
        (Series::Inlet, " Upstream ", "m"),
        (Series::Outlet, " PRV outlet ", "m"),
        (Series::Flow, " Network flow ", "L/s"),
        (Series::CriticalPoint, " Critical point ", "m"),
    ];

    for ((series, title, unit), card) in stats.into_iter().zip(cards.iter()) {
        let alarmed = snapshot.alarm && series == Series::Inlet;
        let color = if alarmed {
            style::ALARM
        } else {
            style::series_color(series)
        };
        let value = latest.map_or_else(
            || "--".to_string(),
            |p| format!("{:.1} {unit}", series_value(series, p)),
        );
        let border = if alarmed {
            Style::default().fg(style::ALARM)
        } else {
            Style::default()
        };
        let widget = Paragraph::new(Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border),
        );
        frame.render_widget(widget, *card);
    }
}

/// One-line valve → pipe → critical point diagram.
fn render_schematic(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let line = match snapshot.latest.as_ref() {
        Some(p) => Line::from(vec![
            Span::styled(
                format!(" inlet {:.1} m ", p.inlet_pressure_m),
                Style::default().fg(style::INLET_COLOR),
            ),
            Span::raw("━▶[PRV]━▶ "),
            Span::styled(
                format!("{:.1} m", p.outlet_pressure_m),
                Style::default().fg(style::OUTLET_COLOR),
            ),
            Span::raw(format!(
                " ━━ pipe {:.1} L/s, -{:.1} m ━━▶ ",
                p.flow_lps, p.head_loss_m
            )),
            Span::styled(
                format!("CP {:.1} m", p.critical_point_pressure_m),
                Style::default()
                    .fg(style::CRITICAL_POINT_COLOR)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        None => Line::from("  Waiting for first point..."),
    };
    frame.render_widget(
        Paragraph::new(line).block(Block::default().title(" Network ").borders(Borders::ALL)),
        area,
    );
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  Space:Pause  +/-:Speed  m:Mode  s:Schedule  ↑/↓:Target  i:Manual inlet  \
         [/]:Inlet  f/F:Friction  1-4:Series  d:Diagnose  r:Restart",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::config::ScenarioConfig;

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn renders_header_and_cards() {
        let app = App::new(ScenarioConfig::baseline(), "baseline");
        let text = screen_text(&app);
        assert!(text.contains("PRV-SIM"));
        assert!(text.contains("23:00"));
        assert!(text.contains("Critical point"));
        assert!(!text.contains("ALARM"));
    }

    #[test]
    fn low_inlet_shows_alarm() {
        let mut app = App::new(ScenarioConfig::low_inlet(), "low_inlet");
        app.tick();
        assert!(screen_text(&app).contains("ALARM"));
    }
}
