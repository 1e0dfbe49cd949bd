use anyhow::Result;
use clap::Parser;

use return_workflow::cli::commands::{
    check::CheckCommand, estimate::EstimateCommand, submit::SubmitCommand, Command,
};
use return_workflow::cli::{Cli, Commands};
use return_workflow::config::init_config;
use return_workflow::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = init_config()?.clone();
    init_telemetry(&config.observability)?;
    tracing::debug!(base_url = %config.service.base_url, "Configuration loaded");

    let json = cli.json;
    match cli.command {
        Commands::Check { order, policy, now } => {
            tokio::runtime::Runtime::new()?.block_on(async {
                CheckCommand {
                    order,
                    policy,
                    now,
                    json,
                    config,
                }
                .execute()
                .await
            })
        }
        Commands::Estimate {
            order,
            policy,
            reason,
            items,
        } => tokio::runtime::Runtime::new()?.block_on(async {
            EstimateCommand {
                order,
                policy,
                reason,
                items,
                json,
                config,
            }
            .execute()
            .await
        }),
        Commands::Submit {
            order,
            reason,
            items,
            description,
            notes,
        } => tokio::runtime::Runtime::new()?.block_on(async {
            SubmitCommand {
                order,
                reason,
                items,
                description,
                notes,
                json,
                config,
            }
            .execute()
            .await
        }),
    }
}
