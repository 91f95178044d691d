//! TUI application state.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use crate::config::ScenarioConfig;
use crate::diagnostic::{DiagnosticRequest, DiagnosticService, DiagnosticStatus};
use crate::sim::command::ControlCommand;
use crate::sim::engine::{Engine, Snapshot};
use crate::sim::history::History;

/// Tick interval options in milliseconds (slowest → fastest).
const SPEED_LEVELS_MS: [u64; 6] = [2000, 1000, 500, 250, 100, 50];

/// Index of the speed level closest to `tick_ms`.
fn nearest_speed_idx(tick_ms: u64) -> usize {
    (0..SPEED_LEVELS_MS.len())
        .min_by_key(|&i| SPEED_LEVELS_MS[i].abs_diff(tick_ms))
        .unwrap_or(0)
}

/// Operator target range (m).
pub const TARGET_RANGE_M: RangeInclusive<f64> = 5.0..=60.0;
/// Manual inlet range (m).
pub const MANUAL_INLET_RANGE_M: RangeInclusive<f64> = 10.0..=90.0;
/// Friction coefficient range.
pub const FRICTION_RANGE: RangeInclusive<f64> = 0.0..=0.2;

const TARGET_STEP_M: f64 = 1.0;
const INLET_STEP_M: f64 = 1.0;
const FRICTION_STEP: f64 = 0.005;

/// Chart series that can be hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Inlet,
    Outlet,
    CriticalPoint,
    Flow,
}

impl Series {
    pub const ALL: [Series; 4] = [
        Series::Inlet,
        Series::Outlet,
        Series::CriticalPoint,
        Series::Flow,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Inlet => "Inlet",
            Self::Outlet => "Outlet",
            Self::CriticalPoint => "Critical pt",
            Self::Flow => "Flow",
        }
    }
}

/// TUI application state.
pub struct App {
    /// Simulation engine, ticked from the event loop.
    engine: Engine,
    /// Scenario the engine was built from (kept for restart).
    scenario: ScenarioConfig,
    /// Name shown in the header.
    pub scenario_name: String,
    diagnostics: Arc<DiagnosticService>,
    /// Visibility per [`Series::ALL`] entry.
    visible: [bool; 4],
    /// Whether the simulation is paused.
    pub paused: bool,
    /// Current index into `SPEED_LEVELS_MS`.
    pub speed_idx: usize,
    /// Whether the user has requested quit.
    pub quit: bool,
    /// When the last simulation tick was executed.
    pub last_tick: Instant,
    /// Ticks since start or restart.
    pub ticks: u64,
}

impl App {
    /// Creates an app for a validated scenario.
    pub fn new(scenario: ScenarioConfig, scenario_name: &str) -> Self {
        let diagnostics = Arc::new(DiagnosticService::rule_based(scenario.diagnostic_timeout()));
        let speed_idx = nearest_speed_idx(scenario.simulation.tick_ms);
        Self {
            engine: scenario.build_engine(),
            scenario,
            scenario_name: scenario_name.to_string(),
            diagnostics,
            visible: [true; 4],
            paused: false,
            speed_idx,
            quit: false,
            last_tick: Instant::now(),
            ticks: 0,
        }
    }

    /// Advances the simulation by one hour.
    pub fn tick(&mut self) {
        self.engine.step();
        self.ticks += 1;
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.snapshot()
    }

    pub fn history(&self) -> &History {
        self.engine.history()
    }

    /// Toggles pause/resume.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Increases simulation speed (shorter tick interval).
    pub fn speed_up(&mut self) {
        if self.speed_idx + 1 < SPEED_LEVELS_MS.len() {
            self.speed_idx += 1;
        }
    }

    /// Decreases simulation speed (longer tick interval).
    pub fn speed_down(&mut self) {
        if self.speed_idx > 0 {
            self.speed_idx -= 1;
        }
    }

    /// Returns the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        SPEED_LEVELS_MS[self.speed_idx]
    }

    /// Reseeds the engine from the scenario, keeping speed and series toggles.
    pub fn restart(&mut self) {
        self.engine = self.scenario.build_engine();
        self.diagnostics.cancel();
        self.ticks = 0;
        self.paused = false;
    }

    fn apply(&mut self, command: ControlCommand) {
        if let Err(err) = self.engine.apply(command) {
            warn!(error = %err, "control rejected");
        }
    }

    pub fn toggle_mode(&mut self) {
        let mode = self.engine.config().control_mode.toggled();
        self.apply(ControlCommand::SetControlMode(mode));
    }

    pub fn toggle_schedule(&mut self) {
        let on = !self.engine.config().schedule_enabled;
        self.apply(ControlCommand::SetScheduleEnabled(on));
    }

    /// Moves the manual target by `steps`; ignored while the schedule drives it.
    pub fn nudge_target(&mut self, steps: f64) {
        let cfg = self.engine.config();
        if cfg.schedule_enabled {
            return;
        }
        let v = clamp_to(cfg.target_value_m + steps * TARGET_STEP_M, &TARGET_RANGE_M);
        self.apply(ControlCommand::SetTarget(v));
    }

    pub fn toggle_manual_inlet(&mut self) {
        let on = !self.engine.config().manual_inlet_enabled;
        self.apply(ControlCommand::SetManualInletEnabled(on));
    }

    pub fn nudge_inlet(&mut self, steps: f64) {
        let cfg = self.engine.config();
        let v = clamp_to(
            cfg.manual_inlet_value_m + steps * INLET_STEP_M,
            &MANUAL_INLET_RANGE_M,
        );
        self.apply(ControlCommand::SetManualInlet(v));
    }

    pub fn nudge_friction(&mut self, steps: f64) {
        let cfg = self.engine.config();
        let v = clamp_to(
            cfg.friction_coefficient + steps * FRICTION_STEP,
            &FRICTION_RANGE,
        );
        self.apply(ControlCommand::SetFrictionCoefficient(v));
    }

    pub fn toggle_series(&mut self, series: Series) {
        if let Some(idx) = Series::ALL.iter().position(|&s| s == series) {
            self.visible[idx] = !self.visible[idx];
        }
    }

    pub fn is_visible(&self, series: Series) -> bool {
        Series::ALL
            .iter()
            .position(|&s| s == series)
            .is_some_and(|idx| self.visible[idx])
    }

    /// Starts a diagnostic for the current snapshot.
    ///
    /// Must run inside a tokio runtime context for the answer to arrive.
    pub fn request_diagnostic(&self) {
        if let Some(request) = DiagnosticRequest::from_snapshot(&self.engine.snapshot()) {
            self.diagnostics.request(request);
        }
    }

    pub fn diagnostic(&self) -> DiagnosticStatus {
        self.diagnostics.status()
    }
}

fn clamp_to(value: f64, range: &RangeInclusive<f64>) -> f64 {
    value.clamp(*range.start(), *range.end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::controller::ControlMode;

    fn app() -> App {
        App::new(ScenarioConfig::baseline(), "baseline")
    }

    #[test]
    fn app_creates_and_ticks() {
        let mut app = app();
        assert_eq!(app.snapshot().hour, 23);

        app.tick();
        assert_eq!(app.ticks, 1);
        assert_eq!(app.snapshot().hour, 0);
        assert_eq!(app.history().len(), 24);
    }

    #[test]
    fn speed_controls_stay_in_bounds() {
        let mut app = app();
        assert_eq!(app.tick_interval_ms(), 1000);

        for _ in 0..10 {
            app.speed_down();
        }
        assert_eq!(app.speed_idx, 0);

        for _ in 0..10 {
            app.speed_up();
        }
        assert_eq!(app.speed_idx, SPEED_LEVELS_MS.len() - 1);
    }

    #[test]
    fn restart_reseeds_engine() {
        let mut app = app();
        let seeded = app.history().clone();
        for _ in 0..5 {
            app.tick();
        }
        app.restart();
        assert_eq!(app.ticks, 0);
        assert_eq!(app.history(), &seeded);
    }

    #[test]
    fn speed_starts_near_scenario_cadence() {
        assert_eq!(nearest_speed_idx(1000), 1);
        assert_eq!(nearest_speed_idx(5), SPEED_LEVELS_MS.len() - 1);
        assert_eq!(nearest_speed_idx(60_000), 0);
    }

    #[test]
    fn toggle_pause() {
        let mut app = app();
        assert!(!app.paused);
        app.toggle_pause();
        assert!(app.paused);
        app.toggle_pause();
        assert!(!app.paused);
    }

    #[test]
    fn target_nudge_is_ignored_while_scheduled() {
        let mut app = app();
        let before = app.snapshot().config.target_value_m;
        app.nudge_target(5.0);
        assert_eq!(app.snapshot().config.target_value_m, before);

        app.toggle_schedule();
        app.nudge_target(100.0);
        assert_eq!(app.snapshot().config.target_value_m, 60.0);
    }

    #[test]
    fn inlet_nudge_clamps_to_range() {
        let mut app = app();
        app.toggle_manual_inlet();
        app.nudge_inlet(-200.0);
        let cfg = app.snapshot().config;
        assert!(cfg.manual_inlet_enabled);
        assert_eq!(cfg.manual_inlet_value_m, 10.0);
    }

    #[test]
    fn friction_never_goes_negative() {
        let mut app = app();
        app.nudge_friction(-100.0);
        assert_eq!(app.snapshot().config.friction_coefficient, 0.0);
    }

    #[test]
    fn mode_and_series_toggles() {
        let mut app = app();
        app.toggle_mode();
        assert_eq!(app.snapshot().config.control_mode, ControlMode::FixedOutlet);

        assert!(app.is_visible(Series::Flow));
        app.toggle_series(Series::Flow);
        assert!(!app.is_visible(Series::Flow));
        assert!(app.is_visible(Series::Inlet));
    }
}
