use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Delete revoked-token records whose tokens have expired")]
    Prune,
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Prune => {
            let pool = connect()?;
            let pruned = DatabaseManager::prune_revoked_tokens(&pool)
                .await
                .context("Failed to prune revoked tokens")?;
            output_success(
                &output_format,
                &format!("Pruned {} expired revoked tokens", pruned),
                Some(json!({ "pruned": pruned })),
            )
        }
    }
}
