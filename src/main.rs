use anyhow::{Context, Result};
use clap::Parser;
use timeline_window::{
    AppConfig, VerbosityLevel,
    cli::{Cli, Commands, SimulationOptions, handle_config, handle_simulate},
    console::{console, init_console},
    tui::{DemoOptions, run_demo},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // The demo's alternate screen owns stdout and JSON output must stay
    // parseable, so both run quiet.
    let verbosity = match &cli.command {
        None | Some(Commands::Demo { .. }) | Some(Commands::Simulate { json: true, .. }) => {
            VerbosityLevel::Quiet
        }
        _ => cli.get_effective_verbosity(config.get_verbosity()),
    };
    init_console(verbosity);

    if let Some(e) = load_error {
        console().warning(&format!("Using default configuration: {}", e));
    }

    match cli.command {
        Some(Commands::Config { action }) => {
            handle_config(action)?;
        }
        Some(Commands::Simulate {
            seed,
            steps,
            height,
            json,
        }) => {
            let options = SimulationOptions {
                seed,
                steps,
                height,
                ..SimulationOptions::new(config.window.clone(), config.mock.clone())
            };
            handle_simulate(options, json).await?;
        }
        Some(Commands::Demo {
            seed,
            descending,
            latency_ms,
        }) => {
            let options = DemoOptions {
                seed,
                descending,
                latency_ms,
            };
            run_demo(&config, options)
                .await
                .context("Terminal demo failed")?;
        }
        None => {
            run_demo(&config, DemoOptions::default())
                .await
                .context("Terminal demo failed")?;
        }
    }

    Ok(())
}
