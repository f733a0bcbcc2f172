//! Bazaar CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! bazaar-cli migrate
//!
//! # Grant or revoke back-office access
//! bazaar-cli user promote -e ann@example.com
//! bazaar-cli user demote -e ann@example.com
//!
//! # Merge duplicate cart lines left by concurrent adds
//! bazaar-cli cart reconcile
//!
//! # Load demo categories and products
//! bazaar-cli seed
//! ```
//!
//! All commands read `BAZAAR_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Cart maintenance
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Seed the catalog with demo data
    Seed,
}

#[derive(Subcommand)]
enum UserAction {
    /// Give an existing account the admin role
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Return an admin account to the user role
    Demote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Merge duplicate (user, product) cart lines
    Reconcile,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Promote { email } => commands::user::promote(&email).await?,
            UserAction::Demote { email } => commands::user::demote(&email).await?,
        },
        Commands::Cart {
            action: CartAction::Reconcile,
        } => commands::cart::reconcile().await?,
        Commands::Seed => commands::seed::demo().await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_promote_requires_email() {
        assert!(Cli::try_parse_from(["bazaar-cli", "user", "promote"]).is_err());
        assert!(
            Cli::try_parse_from(["bazaar-cli", "user", "promote", "-e", "ann@example.com"]).is_ok()
        );
    }
}
