pub mod config;
pub mod simulate;

pub use config::handle_config;
pub use simulate::{SimulationOptions, SimulationReport, handle_simulate, run_simulation};

use crate::console::VerbosityLevel;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Increase verbosity (-v verbose, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode - only show errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scroll a mock conversation in the terminal
    Demo {
        /// Seed for the mock history and live messages
        #[arg(long)]
        seed: Option<u64>,

        /// Newest messages at the top
        #[arg(long)]
        descending: bool,

        /// Override the configured fetch latency
        #[arg(long)]
        latency_ms: Option<u64>,
    },
    /// Run a seeded random scroll script headlessly and check the window
    Simulate {
        #[arg(long, default_value_t = 7)]
        seed: u64,

        #[arg(long, default_value_t = 2000)]
        steps: usize,

        /// Viewport height in lines
        #[arg(long, default_value_t = 24)]
        height: u16,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Set { key: String, value: String },
    /// Print where the config file lives
    Path,
}

impl Cli {
    pub fn get_verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else {
            match self.verbose {
                0 => VerbosityLevel::Normal,
                1 => VerbosityLevel::Verbose,
                _ => VerbosityLevel::Debug,
            }
        }
    }

    pub fn get_effective_verbosity(&self, config_verbosity: VerbosityLevel) -> VerbosityLevel {
        if self.quiet || self.verbose > 0 {
            self.get_verbosity()
        } else {
            config_verbosity
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_config_verbosity() {
        let cli = Cli::parse_from(["timeline-window", "-vv", "simulate"]);
        assert_eq!(
            cli.get_effective_verbosity(VerbosityLevel::Quiet),
            VerbosityLevel::Debug
        );

        let cli = Cli::parse_from(["timeline-window", "simulate"]);
        assert_eq!(
            cli.get_effective_verbosity(VerbosityLevel::Verbose),
            VerbosityLevel::Verbose
        );
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["timeline-window", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_simulate_defaults() {
        let cli = Cli::parse_from(["timeline-window", "simulate", "--json"]);
        match cli.command {
            Some(Commands::Simulate {
                seed,
                steps,
                height,
                json,
            }) => {
                assert_eq!(seed, 7);
                assert_eq!(steps, 2000);
                assert_eq!(height, 24);
                assert!(json);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_config_set_parses_key_and_value() {
        let cli = Cli::parse_from(["timeline-window", "config", "set", "window.page_size", "40"]);
        match cli.command {
            Some(Commands::Config {
                action: ConfigAction::Set { key, value },
            }) => {
                assert_eq!(key, "window.page_size");
                assert_eq!(value, "40");
            }
            _ => panic!("expected config set"),
        }
    }
}
