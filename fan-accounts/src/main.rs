//! fan-accounts - Connect and disconnect platform accounts

use clap::{Parser, Subcommand};
use libfanout::logging::LoggingConfig;
use libfanout::service::accounts::{simulated_token, AccountSummary};
use libfanout::{FanoutError, FanoutService, Platform, Result};

#[derive(Parser, Debug)]
#[command(name = "fan-accounts")]
#[command(version)]
#[command(about = "Connect and disconnect platform accounts")]
#[command(long_about = "\
fan-accounts - Connect and disconnect platform accounts

Each owner has at most one account per platform. Connecting again replaces
the stored credential. Tokens starting with mock_ are simulated: posts to
that account succeed locally without calling the platform.

USAGE EXAMPLES:
    # Store a real access token (or pass it via FANOUT_ACCESS_TOKEN)
    fan-accounts connect linkedin --token $TOKEN --user urn:li:person:abc123

    # Simulated account for local testing
    fan-accounts connect twitter --simulated

    fan-accounts list --format json
    fan-accounts disconnect twitter

PLATFORM USER:
    linkedin   - person URN used as the post author (required)
    facebook   - page id (defaults to me)
    instagram  - business account id (required)

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Database or configuration error
    3 - Invalid input
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Owner of the accounts (defaults from config)
    #[arg(long, global = true, env = "FANOUT_OWNER")]
    owner: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect an account, replacing any existing one for the platform
    Connect {
        platform: String,

        /// Access token issued by the platform
        #[arg(long, env = "FANOUT_ACCESS_TOKEN", hide_env_values = true)]
        #[arg(required_unless_present = "simulated", conflicts_with = "simulated")]
        token: Option<String>,

        /// Generate a simulated credential instead of a real token
        #[arg(long)]
        simulated: bool,

        /// Platform-side identity (person URN, page id or business account id)
        #[arg(long, value_name = "ID")]
        user: Option<String>,
    },

    /// Mark an account disconnected
    Disconnect { platform: String },

    /// List accounts for the owner
    List {
        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env("error", cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let service = FanoutService::new().await?;
    let owner = cli
        .owner
        .unwrap_or_else(|| service.config().defaults.owner.clone());
    let accounts = service.accounts();

    match cli.command {
        Commands::Connect {
            platform,
            token,
            simulated,
            user,
        } => {
            let platform: Platform = platform.parse()?;
            let token = match token {
                Some(token) if !simulated => token,
                _ => simulated_token(platform),
            };
            let summary = accounts.connect(&owner, platform, token, user).await?;
            println!("{}", summary_line(&summary));
        }
        Commands::Disconnect { platform } => {
            let platform: Platform = platform.parse()?;
            if !accounts.disconnect(&owner, platform).await? {
                return Err(FanoutError::Validation(format!(
                    "No {} account for {}",
                    platform, owner
                )));
            }
            println!("disconnected:{}", platform.as_str());
        }
        Commands::List { format } => {
            if format != "text" && format != "json" {
                return Err(FanoutError::Validation(format!(
                    "Invalid format '{}'. Must be 'text' or 'json'",
                    format
                )));
            }
            let summaries = accounts.list(&owner).await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                for summary in &summaries {
                    println!("{}", summary_line(summary));
                }
            }
        }
    }

    Ok(())
}

/// `<platform> | connected|disconnected | live|simulated | <user> | <updated>`
fn summary_line(summary: &AccountSummary) -> String {
    let updated = chrono::DateTime::from_timestamp(summary.updated_at, 0)
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default();

    format!(
        "{} | {} | {} | {} | {}",
        summary.platform.as_str(),
        if summary.connected { "connected" } else { "disconnected" },
        if summary.simulated { "simulated" } else { "live" },
        summary.platform_user.as_deref().unwrap_or("-"),
        updated
    )
}
