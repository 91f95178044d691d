//! Simulation engine: the per-tick state transition and its owning wrapper.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use super::actuator::ActuatorState;
use super::clock::{HOURS_PER_DAY, HourClock, timestamp};
use super::command::ControlCommand;
use super::controller::{required_outlet, target_unreachable};
use super::error::SimResult;
use super::history::History;
use super::physics::{dynamic_inlet, flow_at, head_loss};
use super::schedule::ScheduleChange;
use super::types::{ModelParams, SimulationConfig, SimulationDataPoint, TickOrder};

/// Everything the tick loop owns between ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimState {
    /// Hour of the most recent data point.
    pub clock: HourClock,
    /// Operator settings; `target_value_m` is rewritten by the schedule.
    pub config: SimulationConfig,
    /// Physical valve setpoint.
    pub actuator: ActuatorState,
    /// Rolling 24-point window.
    pub history: History,
}

impl SimState {
    /// Builds the startup state with a full day of history.
    ///
    /// Each seeded hour is computed at its scheduled target, as if the
    /// actuator had always tracked the schedule. The clock is left at 23, the
    /// hour of the last seeded point, so the first tick appends 00:00.
    ///
    /// With the schedule enabled, target and actuator start at the 00:00
    /// scheduled value; otherwise both start at the operator's target.
    pub fn seeded(mut config: SimulationConfig, params: &ModelParams, rng: &mut impl Rng) -> Self {
        let history: History = (0..HOURS_PER_DAY)
            .map(|hour| compute_point(hour, params.schedule.target_at(hour), &config, params, rng))
            .collect();

        if config.schedule_enabled {
            config.target_value_m = params.schedule.target_at(0);
        }

        Self {
            clock: HourClock::new(HOURS_PER_DAY - 1),
            config,
            actuator: ActuatorState::settled_at(config.target_value_m),
            history,
        }
    }

    /// Returns `true` when the target cannot be met at the latest inlet pressure.
    pub fn alarm(&self) -> bool {
        self.history
            .latest()
            .is_some_and(|p| target_unreachable(self.config.target_value_m, p.inlet_pressure_m))
    }

    /// Returns `true` while the actuator is still travelling toward the target.
    pub fn moving(&self) -> bool {
        self.actuator.is_moving(self.config.target_value_m)
    }
}

/// Computes one data point for `hour` with the valve regulating to `effective_target`.
pub fn compute_point(
    hour: u32,
    effective_target: f64,
    config: &SimulationConfig,
    params: &ModelParams,
    rng: &mut impl Rng,
) -> SimulationDataPoint {
    let flow = flow_at(hour, params.flow_noise_lps, rng);
    let inlet = if config.manual_inlet_enabled {
        config.manual_inlet_value_m
    } else {
        dynamic_inlet(hour, params.base_inlet_m, params.inlet_noise_m, rng)
    };
    let loss = head_loss(flow, config.friction_coefficient);
    let outlet = required_outlet(config.control_mode, effective_target, loss, inlet);
    SimulationDataPoint::new(hour, flow, inlet, outlet, loss)
}

/// Advances the simulation by one hour.
///
/// 1. Move the clock to the next hour.
/// 2. If scheduled, load that hour's target.
/// 3. Step the actuator toward the target.
/// 4. Compute the point (against the pre-step actuator under [`TickOrder::Lagged`]).
/// 5. Append it to the history, evicting the oldest.
pub fn tick(state: SimState, params: &ModelParams, rng: &mut impl Rng) -> SimState {
    advance(state, params, rng).0
}

/// [`tick`], also returning a copy of the appended point.
fn advance(
    mut state: SimState,
    params: &ModelParams,
    rng: &mut impl Rng,
) -> (SimState, SimulationDataPoint) {
    let next = state.clock.peek_next();

    if state.config.schedule_enabled {
        state.config.target_value_m = params.schedule.target_at(next);
    }

    let before = state.actuator;
    state.actuator = before.advanced(state.config.target_value_m, params.actuator_step_m);

    let regulating_to = match params.tick_order {
        TickOrder::Lagged => before.effective_target,
        TickOrder::ActuatorFirst => state.actuator.effective_target,
    };

    let point = compute_point(next, regulating_to, &state.config, params, rng);
    state.history.push(point.clone());
    state.clock.tick();
    (state, point)
}

/// Read-only view of the live state for display consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub hour: u32,
    pub timestamp: String,
    pub is_daytime: bool,
    pub config: SimulationConfig,
    pub effective_target_m: f64,
    pub latest: Option<SimulationDataPoint>,
    /// Target cannot be met at the latest inlet pressure.
    pub alarm: bool,
    /// Actuator is still travelling.
    pub moving: bool,
    /// Next day/night switch; present only while the schedule is enabled.
    pub next_change: Option<ScheduleChange>,
}

/// Owns the simulation state, its parameters, and the seeded noise source.
pub struct Engine {
    params: ModelParams,
    state: SimState,
    rng: StdRng,
}

impl Engine {
    /// Creates an engine and seeds a full day of history.
    pub fn new(params: ModelParams, config: SimulationConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(params.seed);
        let state = SimState::seeded(config, &params, &mut rng);
        info!(
            seed = params.seed,
            mode = %config.control_mode,
            tick_order = ?params.tick_order,
            "engine seeded with {} points",
            state.history.len()
        );
        Self { params, state, rng }
    }

    /// Executes one tick and returns the new data point.
    pub fn step(&mut self) -> SimulationDataPoint {
        let state = std::mem::take(&mut self.state);
        let (state, point) = advance(state, &self.params, &mut self.rng);
        self.state = state;
        debug!(
            hour = point.hour,
            outlet_m = point.outlet_pressure_m,
            effective_target_m = self.state.actuator.effective_target,
            "tick"
        );
        point
    }

    /// Executes `ticks` ticks and returns the points they produced, in order.
    pub fn run(&mut self, ticks: usize) -> Vec<SimulationDataPoint> {
        let mut produced = Vec::with_capacity(ticks);
        for _ in 0..ticks {
            produced.push(self.step());
        }
        produced
    }

    /// Applies an operator command to the configuration.
    ///
    /// # Errors
    ///
    /// Returns the validation error; the configuration is left unchanged.
    pub fn apply(&mut self, command: ControlCommand) -> SimResult<()> {
        command.apply(&mut self.state.config)?;
        info!(?command, "operator setting applied");
        Ok(())
    }

    /// Builds a snapshot of the current state.
    pub fn snapshot(&self) -> Snapshot {
        let hour = self.state.clock.hour();
        let schedule = &self.params.schedule;
        Snapshot {
            hour,
            timestamp: timestamp(hour),
            is_daytime: schedule.is_daytime(hour),
            config: self.state.config,
            effective_target_m: self.state.actuator.effective_target,
            latest: self.state.history.latest().cloned(),
            alarm: self.state.alarm(),
            moving: self.state.moving(),
            next_change: self
                .state
                .config
                .schedule_enabled
                .then(|| schedule.next_change(hour)),
        }
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.state.config
    }

    pub fn history(&self) -> &History {
        &self.state.history
    }
}
