//! GridPulse entry point: CLI wiring and config-driven simulation runs.

use std::path::Path;
use std::process;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gridpulse::config::{ConfigError, ScenarioConfig};
use gridpulse::io::export::export_csv;
use gridpulse::sim::engine::Simulation;
use gridpulse::sim::kpi::KpiReport;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    telemetry_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("gridpulse - neighborhood transformer peak-shave / valley-fill simulator");
    eprintln!();
    eprintln!("Usage: gridpulse [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override fleet seed");
    eprintln!("  --telemetry-out <path>   Export step results to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after simulation");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        telemetry_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
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
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--telemetry-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --telemetry-out requires a path argument");
                    process::exit(1);
                }
                cli.telemetry_out = Some(args[i].clone());
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --port requires a u16 argument");
                    process::exit(1);
                }
                if let Ok(p) = args[i].parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{}\" is not a valid u16", args[i]);
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves the scenario: `--scenario` takes priority, then `--preset`,
/// then the baseline. Returns every validation failure at once.
fn load_scenario(cli: &CliArgs) -> Result<ScenarioConfig, Vec<ConfigError>> {
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        ScenarioConfig::from_toml_file(Path::new(path)).map_err(|e| vec![e])?
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name).map_err(|e| vec![e])?
    } else {
        ScenarioConfig::baseline()
    };

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }

    let errors = scenario.validate();
    if errors.is_empty() {
        Ok(scenario)
    } else {
        Err(errors)
    }
}

fn main() {
    let cli = parse_args();
    init_tracing();

    let scenario = match load_scenario(&cli) {
        Ok(cfg) => cfg,
        Err(errors) => {
            for e in &errors {
                error!("{e}");
            }
            process::exit(1);
        }
    };

    let mut sim = match Simulation::from_params(scenario.engine_params()) {
        Ok(sim) => sim,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    let plan = scenario.run_plan();
    info!(steps = plan.len(), "running scenario");
    let results = sim.run(&plan);

    for r in &results {
        println!("{r}");
    }

    let kpi = KpiReport::from_results(&results, sim.feeder().stress_threshold_pct());
    println!("\n{kpi}");

    match sim.v2g_relief_plan() {
        Ok(relief) if relief.required_w > 0.0 => println!(
            "\nV2G relief: {:.1} kW over threshold, {} EVs dispatched, {:.1} kW short",
            relief.required_w / 1000.0,
            relief.allocations.len(),
            relief.shortfall_w / 1000.0
        ),
        Ok(_) => {}
        Err(e) => error!("{e}"),
    }

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&results, Path::new(path)) {
            error!("failed to write CSV: {e}");
            process::exit(1);
        }
        info!(%path, "telemetry written");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(gridpulse::api::AppState::from_simulation(&sim, results));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            error!("failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(gridpulse::api::serve(state, addr)) {
            error!("API server failed: {e}");
            process::exit(1);
        }
    }
}
