use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};
use crate::config;
use crate::jobs::{rent_reminder, TokioDispatcher};

#[derive(Subcommand)]
pub enum ReminderCommands {
    #[command(about = "Send a rent reminder for every active lease")]
    Rent,
}

pub async fn handle(cmd: ReminderCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ReminderCommands::Rent => {
            let jobs = &config::config().jobs;
            let pool = connect()?;
            let dispatcher = TokioDispatcher::new(pool.clone(), jobs.rent_due_in_days);

            let queued = rent_reminder::queue_all(&pool, &dispatcher, jobs.rent_reminder_delay())
                .await
                .context("Failed to load active leases")?;

            // Jobs are delayed; stay alive until every reminder has gone out
            dispatcher.shutdown().await;

            output_success(
                &output_format,
                &format!("Sent rent reminders for {} leases", queued),
                Some(json!({ "leases": queued })),
            )
        }
    }
}
