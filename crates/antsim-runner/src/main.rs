//! Headless runner: drives the simulation on its own thread and inspects it
//! from the async side without holding up the engine.

mod telemetry;

use anyhow::{anyhow, Context, Result};
use antsim_core::{AppConfig, MouseLocation, RunnerConfig};
use antsim_world::{tile_at, EngineOptions, SharedSimulation};
use tokio::signal;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;

    telemetry::init_logging(config.runner.log_format)?;

    info!(
        event = "runner_starting",
        rows = config.simulation.rows,
        columns = config.simulation.columns,
        nests = config.simulation.nest_count,
        ants_per_nest = config.simulation.ant_count_per_nest,
        max_ticks = ?config.runner.max_ticks,
        "Starting ant colony simulation"
    );

    let shared = SharedSimulation::new(config.simulation.clone())
        .context("failed to build simulation")?;
    shared.set_log_ant_movements(config.runner.log_ant_movements);
    shared.set_log_ant_state_changes(config.runner.log_ant_state_changes);
    hover_first_nest(&shared, config.runner.cell_size);

    let engine = shared.spawn_engine(EngineOptions {
        tick_interval: Duration::from_millis(config.runner.tick_interval_ms),
        max_ticks: config.runner.max_ticks,
    })?;

    let inspector = tokio::spawn(run_inspector(shared.clone(), config.runner.clone()));

    tokio::select! {
        _ = shutdown_signal() => {
            info!("Stopping engine");
        }
        _ = wait_for_stop(shared.clone()) => {
            info!("Engine finished");
        }
    }

    shared.stop();
    inspector.abort();

    tokio::task::spawn_blocking(move || engine.join())
        .await?
        .map_err(|_| anyhow!("engine thread panicked"))?;

    let stats = shared.lock().stats();
    info!(
        event = "run_complete",
        tick = stats.tick,
        ants = stats.ant_count,
        food = stats.food_count,
        births = stats.births,
        deaths = stats.deaths,
        "Simulation finished"
    );
    debug!(event = "final_stats", stats = %serde_json::to_string(&stats)?);
    for nest in &stats.nests {
        info!(
            event = "nest_summary",
            nest_id = %nest.nest_id,
            population = nest.population,
            food_supply = nest.food_supply,
            "Nest {} finished with {} ants",
            nest.nest_id,
            nest.population
        );
    }

    Ok(())
}

/// Point the mouse at the first nest so the inspector has something to show
fn hover_first_nest(shared: &SharedSimulation, cell_size: f32) {
    let simulation = shared.lock();
    if let Some(nest) = simulation.nests().first() {
        let center = |coord: i32| (coord as f32 + 0.5) * cell_size;
        shared.set_mouse_location(MouseLocation::new(
            center(nest.location.x),
            center(nest.location.y),
        ));
    }
}

async fn run_inspector(shared: SharedSimulation, config: RunnerConfig) {
    let mut interval = interval(Duration::from_millis(config.inspect_interval_ms));

    loop {
        interval.tick().await;

        // Polled without the lock
        let tick = shared.tick_count();
        let food = shared.food_count();
        let state = shared.state();
        let mouse = shared.mouse_location();

        let Some(simulation) = shared.try_lock() else {
            debug!(event = "inspect_skipped", tick = tick, "Simulation busy");
            continue;
        };

        let ants = simulation.ants().len();
        let hovered = tile_at(mouse, config.cell_size, simulation.grid())
            .and_then(|position| simulation.describe_tile(position));
        drop(simulation);

        info!(
            event = "inspect",
            tick = tick,
            state = %state,
            food_count = food,
            ant_count = ants,
            "Tick {}: {} ants, {:.1} food on the map",
            tick,
            ants,
            food
        );

        if let Some(description) = hovered {
            info!(event = "hover", "{}", description);
        }
    }
}

async fn wait_for_stop(shared: SharedSimulation) {
    let mut interval = interval(Duration::from_millis(50));
    while !shared.stopped() {
        interval.tick().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
