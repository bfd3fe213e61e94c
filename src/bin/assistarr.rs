//! assistarr: Assistarr CLI client
//!
//! Inspect and configure a running assistarrd from the terminal.

use clap::{Parser, Subcommand};
use serde::Serialize;

use assistarr::client::DaemonClient;
use assistarr::{
    LookupQuery, MediaRequestInput, MediaType, SeasonSelection, ServiceConfigInput, ServiceName,
};

/// Assistarr CLI client
#[derive(Parser)]
#[command(name = "assistarr")]
#[command(version = assistarr::PKG_VERSION)]
#[command(about = "Assistarr integration daemon client")]
struct Args {
    /// Daemon address
    #[arg(
        short,
        long,
        env = "ASSISTARR_ADDRESS",
        default_value = "http://127.0.0.1:7474"
    )]
    address: String,

    /// User to act as
    #[arg(short, long, env = "ASSISTARR_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check daemon health
    Health,

    /// Show the status of every service
    Status,

    /// List discovery sections
    Discover {
        /// Only the "For You" section
        #[arg(long)]
        for_you: bool,
    },

    /// Look up a title across services
    Lookup {
        tmdb_id: i64,
        /// movie or tv
        media_type: MediaType,
        /// Service the title was found through
        #[arg(long)]
        source: Option<ServiceName>,
    },

    /// Request a title through Jellyseerr
    Request {
        tmdb_id: i64,
        /// movie or tv
        media_type: MediaType,
        /// Season numbers to request (default: all)
        #[arg(long, value_delimiter = ',')]
        seasons: Vec<u32>,
    },

    /// Manage service settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// List configured services (keys masked)
    List,

    /// Add or replace a service
    Set {
        service: ServiceName,
        base_url: String,
        /// API key, or `username:password` for qBittorrent
        #[arg(long, default_value = "")]
        api_key: String,
        #[arg(long)]
        disabled: bool,
        /// Probe the service without saving
        #[arg(long)]
        test: bool,
    },

    /// Remove a service
    Delete { service: ServiceName },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Default: warn for CLI; override with RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let user = args.user.unwrap_or_else(default_user);
    let client = DaemonClient::new(&args.address, user)?;

    match args.command {
        Command::Health => print_json(&client.health().await?)?,

        Command::Status => {
            let snapshot = client.status().await?;
            for (service, status) in &snapshot.services {
                let state = if !status.configured {
                    "not configured".to_string()
                } else if !status.enabled {
                    "disabled".to_string()
                } else if status.online {
                    format!("online {}", status.version.as_deref().unwrap_or(""))
                } else {
                    format!("offline: {}", status.error.as_deref().unwrap_or("unknown"))
                };
                println!("{service:<12} {}", state.trim_end());
            }
            println!(
                "queue: {}  pending requests: {}  stalled: {}",
                snapshot.queue.len(),
                snapshot.pending_requests.len(),
                snapshot.stalled.len()
            );
        }

        Command::Discover { for_you } => {
            let sections = if for_you {
                vec![client.for_you().await?]
            } else {
                client.discover().await?
            };
            for section in sections {
                println!("{} ({})", section.title, section.items.len());
                for item in &section.items {
                    let year = item.year.map(|y| format!(" ({y})")).unwrap_or_default();
                    println!("  {} {}{year}", item.media_type, item.title);
                }
            }
        }

        Command::Lookup {
            tmdb_id,
            media_type,
            source,
        } => {
            let details = client
                .lookup(&LookupQuery {
                    tmdb_id,
                    media_type,
                    source,
                })
                .await?;
            print_json(&details)?;
        }

        Command::Request {
            tmdb_id,
            media_type,
            seasons,
        } => {
            let seasons = match media_type {
                MediaType::Movie => None,
                MediaType::Tv if seasons.is_empty() => Some(SeasonSelection::All),
                MediaType::Tv => Some(SeasonSelection::Numbers(seasons)),
            };
            let receipt = client
                .request_media(&MediaRequestInput {
                    tmdb_id,
                    media_type,
                    seasons,
                })
                .await?;
            print_json(&receipt)?;
        }

        Command::Settings(SettingsCommand::List) => print_json(&client.list_settings().await?)?,

        Command::Settings(SettingsCommand::Set {
            service,
            base_url,
            api_key,
            disabled,
            test,
        }) => {
            let input = ServiceConfigInput {
                service_name: service,
                base_url,
                api_key,
                is_enabled: !disabled,
            };
            if test {
                print_json(&client.test_settings(&input).await?)?;
            } else {
                print_json(&client.save_settings(&input).await?)?;
            }
        }

        Command::Settings(SettingsCommand::Delete { service }) => {
            client.delete_settings(service).await?;
            println!("{service} removed");
        }
    }

    Ok(())
}

fn default_user() -> String {
    std::env::var("USER").unwrap_or_else(|_| "default".to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
