//! Branchline CLI - provisioning and operational tools.
//!
//! # Usage
//!
//! ```bash
//! # Verify the hosted backend is reachable
//! bl-cli check
//!
//! # Seed demo branches, employees, and inventory
//! bl-cli seed
//!
//! # Provision the first admin (or re-assign any user's role)
//! bl-cli profile set-role --user 8f14e45f-... --role admin
//!
//! # Pin a branch manager to a branch
//! bl-cli profile set-role --user 8f14e45f-... --role branch_manager --branch NYC01
//! ```
//!
//! # Environment
//!
//! - `BRANCHLINE_BACKEND_URL` - backend project URL
//! - `BRANCHLINE_PUBLISHABLE_KEY` - publishable API key
//! - `BRANCHLINE_SERVICE_KEY` - service key (bypasses row-level
//!   security; this tool is the only place it is used)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bl-cli")]
#[command(author, version, about = "Branchline CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the hosted backend is reachable
    Check,
    /// Seed demo branches, employees, and inventory
    Seed,
    /// Manage user profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Set a user's role (and optionally pin them to a branch)
    SetRole {
        /// Auth user id (UUID)
        #[arg(short, long)]
        user: String,

        /// Role (`admin`, `branch_manager`)
        #[arg(short, long)]
        role: String,

        /// Branch code for branch managers (e.g. NYC01)
        #[arg(short, long)]
        branch: Option<String>,
    },
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
        Commands::Check => commands::check::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Profile { action } => match action {
            ProfileAction::SetRole { user, role, branch } => {
                commands::profile::set_role(&user, &role, branch.as_deref()).await?;
            }
        },
    }
    Ok(())
}
