// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::PathBuf;

use crate::helpers::telemetry::setup_simple_tracing;
use crate::{print_config, simulate};
use anyhow::Result;
use clap::{command, ArgAction, Parser, Subcommand};
use tracing::{info, instrument, Level};
use veil_config::{load_config, EngineConfig};

#[derive(Parser, Debug)]
#[command(name = "veil")]
#[command(about = "Confidential project evaluation with encrypted score aggregation", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `veil -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        setup_simple_tracing(self.log_level());

        match &self.command {
            Commands::Config => {
                let config = self.load_config()?;
                info!("Config loaded from: {:?}", config.config_file());
                print_config::execute(&config)?
            }
            Commands::Simulate { scenario, audit } => {
                simulate::execute(self.load_config(), scenario, audit.as_deref()).await?
            }
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<EngineConfig> {
        load_config(self.config.clone())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved configuration
    Config,

    /// Replay a scenario file against a fresh engine
    Simulate {
        /// YAML file listing the operations to run
        scenario: PathBuf,

        /// Write the audit trail here as JSON lines
        #[arg(long)]
        audit: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        let cli = Cli::parse_from(["veil", "-vv", "config"]);
        assert_eq!(cli.log_level(), Level::DEBUG);
        let cli = Cli::parse_from(["veil", "--quiet", "config"]);
        assert_eq!(cli.log_level(), Level::ERROR);
        assert!(Cli::try_parse_from(["veil", "-q", "-v", "config"]).is_err());
    }

    #[test]
    fn simulate_takes_a_scenario_and_audit_path() {
        let cli = Cli::parse_from(["veil", "simulate", "run.yaml", "--audit", "out.jsonl"]);
        match cli.command {
            Commands::Simulate { scenario, audit } => {
                assert_eq!(scenario, PathBuf::from("run.yaml"));
                assert_eq!(audit, Some(PathBuf::from("out.jsonl")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
