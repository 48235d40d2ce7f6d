use anyhow::{anyhow, bail, Context};
use clap::Subcommand;
use serde_json::json;

use crate::auth::password::hash_password;
use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};
use crate::config;
use crate::database::models::{user, NewUser};
use crate::types::UserRole;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user with any role, including admin")]
    Create {
        #[arg(long, help = "Display name")]
        name: String,

        #[arg(long, help = "Login email")]
        email: String,

        #[arg(long, help = "Initial password")]
        password: String,

        #[arg(long, default_value = "landlord", help = "admin, agent or landlord")]
        role: UserRole,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create {
            name,
            email,
            password,
            role,
        } => {
            let min_length = config::config().security.min_password_length;
            if password.chars().count() < min_length {
                bail!("Password must be at least {} characters", min_length);
            }

            let password_hash = hash_password(&password).map_err(|e| anyhow!("Failed to hash password: {}", e))?;
            let pool = connect()?;
            let new_user = NewUser {
                name: name.trim().to_string(),
                email: email.trim().to_lowercase(),
                password_hash,
                role,
            };

            let created = match user::create(&pool, &new_user).await {
                Ok(created) => created,
                Err(e) if e.is_unique_violation_on("uq_users_email") => {
                    bail!("A user with email '{}' already exists", new_user.email)
                }
                Err(e) => return Err(anyhow::Error::new(e)).context("Failed to create user"),
            };

            output_success(
                &output_format,
                &format!("Created {} user {} ({})", created.role, created.email, created.id),
                Some(json!({ "id": created.id, "email": created.email, "role": created.role })),
            )
        }
    }
}
