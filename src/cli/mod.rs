pub mod commands;
pub mod utils;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::config;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "prop")]
#[command(about = "Property API CLI - Operational commands for the property management backend")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Queue tenant notifications")]
    Reminders {
        #[command(subcommand)]
        cmd: commands::reminders::ReminderCommands,
    },

    #[command(about = "Apply the bundled database migrations")]
    Migrate,

    #[command(about = "User account provisioning")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UserCommands,
    },

    #[command(about = "Revoked token maintenance")]
    Tokens {
        #[command(subcommand)]
        cmd: commands::tokens::TokenCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Pool for the configured database; connects on first query
pub(crate) fn connect() -> anyhow::Result<PgPool> {
    DatabaseManager::connect_lazy(&config::config().database).context("Failed to configure database connection")
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Reminders { cmd } => commands::reminders::handle(cmd, output_format).await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Users { cmd } => commands::users::handle(cmd, output_format).await,
        Commands::Tokens { cmd } => commands::tokens::handle(cmd, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_creation() {
        let cli = Cli::try_parse_from([
            "prop", "--json", "users", "create", "--name", "Ada", "--email", "ada@example.com", "--password",
            "secret-password", "--role", "admin",
        ])
        .unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Users { .. }));
    }

    #[test]
    fn parses_rent_reminders() {
        let cli = Cli::try_parse_from(["prop", "reminders", "rent"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Text));
        assert!(matches!(cli.command, Commands::Reminders { .. }));
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(Cli::try_parse_from([
            "prop", "users", "create", "--name", "Ada", "--email", "ada@example.com", "--password", "x",
            "--role", "owner",
        ])
        .is_err());
    }
}
