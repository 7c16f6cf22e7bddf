//! Brewery CLI - session store migrations and backend checks.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table
//! brewery-cli migrate
//!
//! # Check the storefront can reach the brewery backend
//! brewery-cli check-backend
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "brewery-cli")]
#[command(author, version, about = "Brewery storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the session store table
    Migrate,
    /// Call the backend health endpoint
    CheckBackend,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::sessions().await?,
        Commands::CheckBackend => commands::backend::check().await?,
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
    fn test_parses_subcommands() {
        assert!(matches!(
            Cli::try_parse_from(["brewery-cli", "migrate"]).map(|c| c.command),
            Ok(Commands::Migrate)
        ));
        assert!(matches!(
            Cli::try_parse_from(["brewery-cli", "check-backend"]).map(|c| c.command),
            Ok(Commands::CheckBackend)
        ));
        assert!(Cli::try_parse_from(["brewery-cli", "seed"]).is_err());
    }
}
