//! PRV simulator entry point: CLI wiring and scenario-driven engine construction.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use prv_sim::config::ScenarioConfig;
use prv_sim::diagnostic::{DiagnosticRequest, RuleBasedDiagnostician};
use prv_sim::io::export::export_csv;
use prv_sim::sim::kpi::DailySummary;

/// Default number of simulated hours in batch mode.
const DEFAULT_HOURS: usize = 24;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    hours: usize,
    telemetry_out: Option<String>,
    diagnose: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
    #[cfg(feature = "tui")]
    tui: bool,
}

fn print_help() {
    eprintln!("prv-sim: pressure-reducing valve network simulator");
    eprintln!();
    eprintln!("Usage: prv-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --hours <n>              Simulated hours to run (default: {DEFAULT_HOURS})");
    eprintln!("  --telemetry-out <path>   Export the history window to CSV");
    eprintln!("  --diagnose               Print a diagnostic note for the final state");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Run live and serve the REST API");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    #[cfg(feature = "tui")]
    eprintln!("  --tui                    Run live in the terminal dashboard");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

/// Returns the value following a flag, or exits with an error.
fn flag_value<'a>(args: &'a [String], i: usize, flag: &str, what: &str) -> &'a str {
    match args.get(i) {
        Some(v) => v,
        None => {
            eprintln!("error: {flag} requires {what}");
            process::exit(1);
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str, what: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        eprintln!("error: {flag} value \"{value}\" is not a valid {what}");
        process::exit(1);
    })
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        hours: DEFAULT_HOURS,
        telemetry_out: None,
        diagnose: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
        #[cfg(feature = "tui")]
        tui: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path = Some(flag_value(&args, i, "--scenario", "a path argument").to_string());
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(flag_value(&args, i, "--preset", "a name argument").to_string());
            }
            "--seed" => {
                i += 1;
                let v = flag_value(&args, i, "--seed", "a u64 argument");
                cli.seed_override = Some(parse_number(v, "--seed", "u64"));
            }
            "--hours" => {
                i += 1;
                let v = flag_value(&args, i, "--hours", "a count argument");
                cli.hours = parse_number(v, "--hours", "count");
            }
            "--telemetry-out" => {
                i += 1;
                cli.telemetry_out =
                    Some(flag_value(&args, i, "--telemetry-out", "a path argument").to_string());
            }
            "--diagnose" => cli.diagnose = true,
            #[cfg(feature = "api")]
            "--serve" => cli.serve = true,
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let v = flag_value(&args, i, "--port", "a u16 argument");
                cli.port = parse_number(v, "--port", "u16");
            }
            #[cfg(feature = "tui")]
            "--tui" => cli.tui = true,
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if cli.scenario_path.is_some() && cli.preset.is_some() {
        eprintln!("error: --scenario and --preset are mutually exclusive");
        process::exit(1);
    }

    cli
}

/// Installs the log subscriber. `RUST_LOG` overrides the `info` default.
fn init_tracing(quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if quiet {
        builder.with_writer(std::io::sink).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
}

/// Runs `hours` ticks, prints them and the summary, then handles exports.
fn run_batch(scenario: &ScenarioConfig, cli: &CliArgs) {
    let mut engine = scenario.build_engine();
    for point in engine.run(cli.hours) {
        println!("{point}");
    }

    let summary = DailySummary::from_history(engine.history().iter());
    println!("\n{summary}");

    if cli.diagnose {
        match DiagnosticRequest::from_snapshot(&engine.snapshot()) {
            Some(request) => println!("\n{}", RuleBasedDiagnostician::note(&request)),
            None => println!("\nNo data point to diagnose."),
        }
    }

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(engine.history().iter(), Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }
}

#[cfg(feature = "api")]
fn run_server(scenario: &ScenarioConfig, port: u16) {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use prv_sim::api::{AppState, serve};
    use prv_sim::diagnostic::DiagnosticService;
    use prv_sim::live::spawn_live;

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(1);
    });

    let result = rt.block_on(async {
        let live = spawn_live(scenario.build_engine(), scenario.tick_interval());
        let diagnostics = Arc::new(DiagnosticService::rule_based(scenario.diagnostic_timeout()));
        let state = Arc::new(AppState::from_live(&live, diagnostics));
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        serve(state, addr).await
    });

    if let Err(e) = result {
        eprintln!("error: API server failed: {e}");
        process::exit(1);
    }
}

fn main() {
    let cli = parse_args();

    #[cfg(feature = "tui")]
    init_tracing(cli.tui);
    #[cfg(not(feature = "tui"))]
    init_tracing(false);

    // Load config: --scenario takes priority, then --preset, then baseline default
    let (mut scenario, name) = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => (cfg, path.clone()),
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        let name = cli.preset.clone().unwrap_or_else(|| "baseline".to_string());
        match ScenarioConfig::from_preset(&name) {
            Ok(cfg) => (cfg, name),
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    };

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    #[cfg(feature = "tui")]
    if cli.tui {
        if let Err(e) = prv_sim::tui::run(scenario, &name) {
            eprintln!("error: TUI crashed: {e}");
            process::exit(1);
        }
        return;
    }

    #[cfg(feature = "api")]
    if cli.serve {
        run_server(&scenario, cli.port);
        return;
    }

    tracing::info!(scenario = %name, hours = cli.hours, "batch run");
    run_batch(&scenario, &cli);
}
