//! Wall-clock driven tick loop.
//!
//! The loop owns the [`Engine`] exclusively. Writers send [`ControlCommand`]s
//! over an `mpsc` channel; readers observe [`LiveView`]s through `watch`.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::sim::command::ControlCommand;
use crate::sim::engine::{Engine, Snapshot};
use crate::sim::types::SimulationDataPoint;

/// Capacity of the command queue.
const COMMAND_QUEUE: usize = 64;

/// What display consumers see after every tick or applied command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveView {
    pub snapshot: Snapshot,
    pub history: Vec<SimulationDataPoint>,
}

impl LiveView {
    pub fn of(engine: &Engine) -> Self {
        Self {
            snapshot: engine.snapshot(),
            history: engine.history().to_vec(),
        }
    }
}

/// Runs the tick loop until the command channel closes.
///
/// Ticks never overlap: a late tick is skipped rather than bursted.
pub async fn run_live(
    mut engine: Engine,
    cadence: Duration,
    mut commands: mpsc::Receiver<ControlCommand>,
    views: watch::Sender<LiveView>,
) -> Engine {
    let mut interval = time::interval(cadence);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first interval tick completes immediately; the seeded view is
    // already published.
    interval.tick().await;

    info!(cadence_ms = cadence.as_millis() as u64, "live loop started");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                engine.step();
            }
            command = commands.recv() => {
                let Some(command) = command else { break };
                if let Err(err) = engine.apply(command) {
                    warn!(error = %err, "control command rejected");
                    continue;
                }
            }
        }
        views.send_replace(LiveView::of(&engine));
    }
    info!("command channel closed, live loop stopped");
    engine
}

/// Client side of a spawned live loop.
pub struct LiveHandle {
    pub commands: mpsc::Sender<ControlCommand>,
    pub views: watch::Receiver<LiveView>,
    pub task: JoinHandle<Engine>,
}

/// Spawns [`run_live`] on the current runtime.
pub fn spawn_live(engine: Engine, cadence: Duration) -> LiveHandle {
    let (commands, rx) = mpsc::channel(COMMAND_QUEUE);
    let (views_tx, views) = watch::channel(LiveView::of(&engine));
    let task = tokio::spawn(run_live(engine, cadence, rx, views_tx));
    LiveHandle {
        commands,
        views,
        task,
    }
}
