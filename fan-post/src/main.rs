//! fan-post - Publish, schedule or queue a post across platforms

use clap::Parser;
use libfanout::logging::LoggingConfig;
use libfanout::publishers::is_video_url;
use libfanout::scheduling::parse_schedule;
use libfanout::service::posting::{PostRequest, PostResponse};
use libfanout::{FanoutError, FanoutService, MediaType, Platform, PostStatus, Result};
use std::io::{IsTerminal, Read};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "fan-post")]
#[command(version)]
#[command(about = "Publish, schedule or queue a post across platforms")]
#[command(long_about = "\
fan-post - Publish, schedule or queue a post across platforms

USAGE EXAMPLES:
    # Publish now to the default platforms
    fan-post \"Launching today\"

    # Read content from stdin
    echo \"Launching today\" | fan-post --platform twitter,linkedin

    # Image post
    fan-post \"Sunset\" --platform instagram --media-url https://cdn.example.com/a.jpg

    # Schedule or queue instead of publishing
    fan-post \"Later\" --schedule \"in 2 hours\"
    fan-post \"Some day\" --queue

OUTPUT:
    One line per platform: <platform>:<external id>
    Scheduled posts print scheduled:<post id>:<time>, queued posts
    print queued:<post id>:<position>. Use --format json for the full
    post and per-platform results.

EXIT CODES:
    0 - Success (published on at least one platform, scheduled or queued)
    1 - Posting failed on every platform
    2 - Configuration error
    3 - Invalid input
")]
struct Cli {
    /// Content to post (reads from stdin if not provided)
    content: Option<String>,

    /// Target platform(s), comma-separated (defaults from config)
    #[arg(short, long)]
    platform: Option<String>,

    /// TEXT, IMAGE or VIDEO (guessed from --media-url when omitted)
    #[arg(long, value_name = "TYPE")]
    media_type: Option<String>,

    /// Public URL of the image or video
    #[arg(short, long, value_name = "URL")]
    media_url: Option<String>,

    /// When to publish: RFC 3339, unix seconds, "30m" or "tomorrow 9am"
    #[arg(short, long, value_name = "WHEN", conflicts_with = "queue")]
    schedule: Option<String>,

    /// Append to the queue instead of publishing now
    #[arg(short, long)]
    queue: bool,

    /// Owner the post belongs to (defaults from config)
    #[arg(long, env = "FANOUT_OWNER")]
    owner: Option<String>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env("error", cli.verbose).init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    if cli.format != "text" && cli.format != "json" {
        return Err(FanoutError::Validation(format!(
            "Invalid format '{}'. Valid options: text, json",
            cli.format
        )));
    }

    let content = read_content(cli.content)?;
    let media_type = resolve_media_type(cli.media_type.as_deref(), cli.media_url.as_deref())?;
    let scheduled_at = cli
        .schedule
        .as_deref()
        .map(parse_schedule)
        .transpose()?
        .map(|at| at.timestamp());

    let service = FanoutService::new().await?;
    let defaults = &service.config().defaults;

    let platforms = match cli.platform.as_deref() {
        Some(list) => Platform::parse_list(list)?,
        None => defaults
            .platforms
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<Platform>>>()?,
    };
    let owner = cli.owner.unwrap_or_else(|| defaults.owner.clone());

    debug!(owner = %owner, ?platforms, ?scheduled_at, "Submitting post");

    let request = PostRequest {
        content,
        platforms,
        media_type,
        media_url: cli.media_url,
        scheduled_at,
        defer: cli.queue,
    };
    let response = service.posting().submit(&owner, request).await?;

    if cli.format == "json" {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_text(&response);
    }

    Ok(if response.post.status == PostStatus::Failed {
        1
    } else {
        0
    })
}

/// Positional content wins; otherwise read stdin unless it is a terminal
fn read_content(arg: Option<String>) -> Result<String> {
    if let Some(content) = arg {
        return Ok(content);
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }

    let mut buffer = String::new();
    stdin
        .read_to_string(&mut buffer)
        .map_err(|e| FanoutError::Validation(format!("Failed to read stdin: {}", e)))?;
    Ok(buffer.trim_end().to_string())
}

fn resolve_media_type(explicit: Option<&str>, media_url: Option<&str>) -> Result<MediaType> {
    match (explicit, media_url) {
        (Some(name), _) => name.parse(),
        (None, Some(url)) if is_video_url(url) => Ok(MediaType::Video),
        (None, Some(url)) if !url.trim().is_empty() => Ok(MediaType::Image),
        _ => Ok(MediaType::Text),
    }
}

fn print_text(response: &PostResponse) {
    let post = &response.post;
    match post.status {
        PostStatus::Scheduled => {
            let when = post
                .scheduled_at
                .and_then(|at| chrono::DateTime::from_timestamp(at, 0))
                .map(|at| at.to_rfc3339())
                .unwrap_or_default();
            println!("scheduled:{}:{}", post.id, when);
        }
        PostStatus::Queued => {
            println!("queued:{}:{}", post.id, post.queue_position.unwrap_or_default());
        }
        _ => {
            for result in response.results.iter().flatten() {
                match (&result.external_post_id, &result.error) {
                    (Some(id), _) => println!("{}:{}", result.platform.as_str(), id),
                    (None, Some(error)) => {
                        eprintln!("{}: {}", result.platform.as_str(), error)
                    }
                    (None, None) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_guessed_from_url() {
        assert_eq!(
            resolve_media_type(None, Some("https://cdn.example.com/clip.MP4")).unwrap(),
            MediaType::Video
        );
        assert_eq!(
            resolve_media_type(None, Some("https://cdn.example.com/a.jpg")).unwrap(),
            MediaType::Image
        );
        assert_eq!(resolve_media_type(None, None).unwrap(), MediaType::Text);
    }

    #[test]
    fn test_explicit_media_type_wins() {
        assert_eq!(
            resolve_media_type(Some("video"), Some("https://cdn.example.com/a.jpg")).unwrap(),
            MediaType::Video
        );
        assert!(resolve_media_type(Some("gif"), None).is_err());
    }

    #[test]
    fn test_positional_content_skips_stdin() {
        assert_eq!(read_content(Some("hello".to_string())).unwrap(), "hello");
    }
}
