//! fan-queue - Inspect and reorder queued and scheduled posts

use clap::{Parser, Subcommand};
use libfanout::logging::LoggingConfig;
use libfanout::{FanoutError, FanoutService, Post, PostStats, QueueSlot, Result};

#[derive(Parser, Debug)]
#[command(name = "fan-queue")]
#[command(version)]
#[command(about = "Inspect and reorder queued and scheduled posts")]
#[command(long_about = "\
fan-queue - Inspect and reorder queued and scheduled posts

COMMANDS:
    list        List queued posts in queue order
    scheduled   List scheduled posts by time
    reorder     Assign new queue positions (ID=POSITION ...)
    swap        Swap the positions of two queued posts
    delete      Remove a post from the queue
    processing  List posts claimed by a run that never finished
    stats       Count the owner's posts by status

USAGE EXAMPLES:
    fan-queue list --format json
    fan-queue reorder 3f2a...=1 9c41...=2
    fan-queue swap 3f2a... 9c41...
    fan-queue delete 3f2a...
    fan-queue stats --format json

STUCK POSTS:
    A post stays PROCESSING when fan-send stopped (or could not write the
    result) after claiming it. It is never retried automatically. Check the
    platforms for the post, then publish again with fan-post if needed.

CONFIGURATION:
    Override with environment variables:
        FANOUT_CONFIG    - Path to config file
        FANOUT_DB_PATH   - Path to database file
        FANOUT_OWNER     - Owner whose queue to manage

EXIT CODES:
    0 - Success
    1 - Operation failed (including database errors and rejected reorders)
    2 - Configuration error
    3 - Invalid input (unknown post ID, bad position, etc.)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Owner whose queue to manage (defaults from config)
    #[arg(long, global = true, env = "FANOUT_OWNER")]
    owner: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List queued posts in queue order
    List {
        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List scheduled posts, soonest first
    Scheduled {
        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Assign queue positions; all changes apply or none do
    Reorder {
        /// Pairs of POST_ID=POSITION
        #[arg(required = true, value_name = "ID=POSITION")]
        slots: Vec<String>,
    },

    /// Swap the queue positions of two posts
    Swap { first: String, second: String },

    /// Remove a queued post
    Delete { post_id: String },

    /// List posts left in PROCESSING
    Processing {
        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Count the owner's posts by status
    Stats {
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
    let queue = service.queue();

    match cli.command {
        Commands::List { format } => {
            validate_format(&format)?;
            let posts = queue.list(&owner).await?;
            output_posts(&posts, &format, queue_line)
        }
        Commands::Scheduled { format } => {
            validate_format(&format)?;
            let posts = queue.scheduled(&owner).await?;
            let now = chrono::Utc::now().timestamp();
            output_posts(&posts, &format, |post| scheduled_line(post, now))
        }
        Commands::Processing { format } => {
            validate_format(&format)?;
            let posts = queue.processing(&owner).await?;
            output_posts(&posts, &format, processing_line)
        }
        Commands::Stats { format } => {
            validate_format(&format)?;
            let stats = queue.stats(&owner).await?;
            if format == "json" {
                let mut value = serde_json::to_value(stats)?;
                value["total"] = serde_json::Value::from(stats.total());
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                output_stats_text(&stats);
            }
            Ok(())
        }
        Commands::Reorder { slots } => {
            let slots = slots
                .iter()
                .map(|pair| parse_slot(pair))
                .collect::<Result<Vec<_>>>()?;
            queue.reorder(&owner, &slots).await?;
            println!("reordered:{}", slots.len());
            Ok(())
        }
        Commands::Swap { first, second } => {
            queue.swap(&owner, &first, &second).await?;
            println!("swapped:{}:{}", first, second);
            Ok(())
        }
        Commands::Delete { post_id } => {
            if !queue.delete(&owner, &post_id).await? {
                return Err(FanoutError::Validation(format!(
                    "Post {} is not in the queue",
                    post_id
                )));
            }
            println!("deleted:{}", post_id);
            Ok(())
        }
    }
}

fn validate_format(format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(FanoutError::Validation(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }
    Ok(())
}

fn output_posts(posts: &[Post], format: &str, line: impl Fn(&Post) -> String) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(posts)?);
    } else {
        for post in posts {
            println!("{}", line(post));
        }
    }
    Ok(())
}

fn output_stats_text(stats: &PostStats) {
    println!("draft: {}", stats.draft);
    println!("scheduled: {}", stats.scheduled);
    println!("queued: {}", stats.queued);
    println!("processing: {}", stats.processing);
    println!("published: {}", stats.published);
    println!("failed: {}", stats.failed);
    println!("total: {}", stats.total());
}

fn queue_line(post: &Post) -> String {
    format!(
        "{} | {} | {}",
        post.queue_position.unwrap_or_default(),
        post.id,
        truncate_content(&post.content, 50)
    )
}

fn scheduled_line(post: &Post, now: i64) -> String {
    let time_until = post
        .scheduled_at
        .map(|ts| format_time_until(now, ts))
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{} | {} | {}",
        post.id,
        truncate_content(&post.content, 50),
        time_until
    )
}

fn processing_line(post: &Post) -> String {
    let created = chrono::DateTime::from_timestamp(post.created_at, 0)
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{} | {} | created {}",
        post.id,
        truncate_content(&post.content, 50),
        created
    )
}

/// Parse `ID=POSITION`
fn parse_slot(pair: &str) -> Result<QueueSlot> {
    let invalid = || {
        FanoutError::Validation(format!(
            "Invalid reorder item '{}'. Expected POST_ID=POSITION",
            pair
        ))
    };

    let (id, position) = pair.rsplit_once('=').ok_or_else(invalid)?;
    let id = id.trim();
    let position: i64 = position.trim().parse().map_err(|_| invalid())?;
    if id.is_empty() {
        return Err(invalid());
    }

    Ok(QueueSlot {
        id: id.to_string(),
        position,
    })
}

/// First line only, at most `max_chars` characters
fn truncate_content(content: &str, max_chars: usize) -> String {
    let first_line = content.lines().next().unwrap_or_default();
    if first_line.chars().count() <= max_chars {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

fn format_time_until(now: i64, scheduled_at: i64) -> String {
    let diff = scheduled_at - now;

    if diff < 0 {
        return "overdue".to_string();
    }

    let minutes = diff / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("in {} day{}", days, if days == 1 { "" } else { "s" })
    } else if hours > 0 {
        format!("in {} hour{}", hours, if hours == 1 { "" } else { "s" })
    } else if minutes > 0 {
        format!("in {} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    } else {
        "in less than a minute".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slot() {
        let slot = parse_slot("abc-123=4").unwrap();
        assert_eq!(slot.id, "abc-123");
        assert_eq!(slot.position, 4);
    }

    #[test]
    fn test_parse_slot_rejects_garbage() {
        assert!(parse_slot("abc").is_err());
        assert!(parse_slot("abc=first").is_err());
        assert!(parse_slot("=3").is_err());
    }

    #[test]
    fn test_truncate_content_counts_characters() {
        assert_eq!(truncate_content("short", 10), "short");
        assert_eq!(truncate_content("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_content("line one\nline two", 50), "line one");
    }

    #[test]
    fn test_format_time_until() {
        assert_eq!(format_time_until(1000, 900), "overdue");
        assert_eq!(format_time_until(0, 30), "in less than a minute");
        assert_eq!(format_time_until(0, 120), "in 2 minutes");
        assert_eq!(format_time_until(0, 3600), "in 1 hour");
        assert_eq!(format_time_until(0, 3 * 86400), "in 3 days");
    }
}
