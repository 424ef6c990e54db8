use clap::{Parser, Subcommand};
use releaser_cli::{logging, AdminConsole};
use releaser_config::{Settings, CONFIG_FILE_NAME};
use releaser_core::{FileStore, PublishRequest, ReleaseService, ADMIN_PLATFORMS};
use releaser_server::ReleaseServer;
use std::path::PathBuf;
use std::sync::Arc;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "releaser")]
#[command(about = "Serve and manage release metadata for desktop app updates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (JSON); missing file means defaults
    #[arg(long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Directory holding the release records
    #[arg(long)]
    releases_dir: Option<PathBuf>,

    /// Product name used in release titles and asset filenames
    #[arg(long)]
    product_name: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP update server
    Serve {
        /// Listen host
        #[arg(long)]
        host: Option<String>,
        /// Listen port
        #[arg(long)]
        port: Option<u16>,
        /// Directory served as static files
        #[arg(long)]
        public_dir: Option<PathBuf>,
    },
    /// Interactive release management menu
    Admin,
    /// Publish a release and make it the latest
    Publish {
        /// Version to publish
        version: String,
        /// Release notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Download URL as platform=url; defaults are generated when omitted
        #[arg(short, long = "url", value_parser = parse_key_val)]
        urls: Vec<(String, String)>,
        /// Mark the update as mandatory
        #[arg(short, long)]
        mandatory: bool,
        /// Publish timestamp (ISO-8601), defaults to now
        #[arg(long)]
        published_at: Option<String>,
    },
    /// List releases, newest first
    List,
    /// Print a release as JSON (latest when no version is given)
    Show {
        version: Option<String>,
    },
    /// Copy a release over the latest pointer
    Promote {
        version: String,
    },
    /// Delete a release
    Delete {
        version: String,
    },
}

/// Parse platform=url pairs from command line
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid PLATFORM=url: no `=` found in `{s}`"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn load_settings(cli: &Cli) -> Result<Settings, BoxError> {
    let mut settings = Settings::load(&cli.config)?;
    settings.apply_env()?;
    if let Some(dir) = &cli.releases_dir {
        settings.releases_dir = dir.clone();
    }
    if let Some(name) = &cli.product_name {
        settings.product_name = name.clone();
    }
    if let Commands::Serve {
        host,
        port,
        public_dir,
    } = &cli.command
    {
        if let Some(host) = host {
            settings.host = host.clone();
        }
        if let Some(port) = port {
            settings.port = *port;
        }
        if let Some(dir) = public_dir {
            settings.public_dir = dir.clone();
        }
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    // Keep the admin menu readable: only warnings and errors by default.
    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    logging::init(default_level);

    let settings = load_settings(&cli)?;
    let store = FileStore::open(&settings.releases_dir).await?;
    let service = ReleaseService::from_settings(Arc::new(store), &settings);

    match cli.command {
        Commands::Serve { .. } => {
            tokio::fs::create_dir_all(&settings.public_dir).await?;
            let addr = settings.socket_addr().await?;
            let handle = ReleaseServer::new(service, &settings.public_dir)
                .bind(addr)
                .await?;

            let url = handle.url();
            tracing::info!("Update server running on port {}", handle.addr.port());
            tracing::info!("- Latest release API: {}/api/updates/latest", url);
            tracing::info!("- Version API: {}/api/updates/version/{{version}}", url);
            tracing::info!("- Admin publish API: POST {}/api/admin/publish", url);

            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutting down server...");
            handle.stop();
        }
        Commands::Admin => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            let mut console = AdminConsole::new(&service, stdin.lock(), stdout.lock());
            console.run().await?;
        }
        Commands::Publish {
            version,
            notes,
            urls,
            mandatory,
            published_at,
        } => {
            let mut request = PublishRequest::new(version.as_str())
                .notes(notes)
                .mandatory(mandatory);
            if let Some(published_at) = published_at {
                request = request.published_at(published_at);
            }
            if urls.is_empty() {
                for platform in ADMIN_PLATFORMS {
                    let url = service.default_download_url(&version, platform);
                    request = request.url(platform, url);
                }
            } else {
                for (platform, url) in urls {
                    request = request.url(platform, url);
                }
            }
            let version = service.publish(request).await?;
            println!("Published version {}", version);
        }
        Commands::List => {
            let releases = service.list().await?;
            if releases.is_empty() {
                println!("No releases found.");
            }
            let latest = service.latest().await.ok();
            for (version, record) in releases {
                let marker = match &latest {
                    Some(latest) if latest.is_tagged(&version) => " (latest)",
                    _ => "",
                };
                println!(
                    "{}\t{}\t{}{}",
                    record.tag,
                    releaser_utils::format_local(&record.published_at),
                    if record.mandatory { "mandatory" } else { "optional" },
                    marker
                );
            }
        }
        Commands::Show { version } => {
            let record = match version {
                Some(version) => service.version(&version).await?,
                None => service.latest().await?,
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Promote { version } => {
            service.promote(&version).await?;
            println!("v{} has been set as the latest release.", version);
        }
        Commands::Delete { version } => {
            let outcome = service.delete(&version).await?;
            if outcome.latest_is_stale {
                eprintln!(
                    "Warning: You deleted the latest release. Please set a new latest release."
                );
            }
            println!("v{} has been deleted.", outcome.version);
        }
    }

    Ok(())
}
