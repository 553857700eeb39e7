#[macro_use]
extern crate lazy_static;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use config::{Config, Environment, File};
use resources::config::DeployConfig;

mod apply;
mod cluster;
mod completion;
mod reconcile;
mod status;
mod utils;
mod wait;

lazy_static! {
    static ref CONFIG: DeployConfig = Config::builder()
        .add_source(File::with_name("/etc/rdeploy/config.yaml").required(false))
        .add_source(
            Environment::with_prefix("RDEPLOY")
                .prefix_separator("_")
                .separator("__")
        )
        .build()
        .unwrap_or_default()
        .try_deserialize::<DeployConfig>()
        .with_context(|| "Failed to parse config".to_string())
        .unwrap_or_default();
}

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update a Deployment from a manifest and wait for its pods.
    Apply(apply::Arg),
    /// Wait for the pods of an existing Deployment to run.
    Wait(wait::Arg),
    /// Show the pods of a Deployment.
    Status(status::Arg),
    /// Generate completion script
    Completion(completion::Arg),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Apply(arg) => arg.handle().await?,
        Commands::Wait(arg) => arg.handle().await?,
        Commands::Status(arg) => arg.handle().await?,
        Commands::Completion(arg) => arg.handle(&mut Cli::command(), &mut std::io::stdout())?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_apply() {
        let cli = Cli::parse_from([
            "rdeploy",
            "apply",
            "-f",
            "nginx.yml",
            "--no-wait",
            "-n",
            "web",
        ]);
        assert!(matches!(cli.command, Commands::Apply(_)));
    }
}
