use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use artifact_search::client::ApiClient;
use artifact_search::config::{get_config, load_config, Config};
use artifact_search::display::{format_item_response, format_list_response};
use artifact_search::errors::{log_error, FormattedError};
use artifact_search::query::QueryBuilder;
use artifact_search::search::{SearchController, SearchOptions};
use artifact_search::ClientError;

/// Artifact Search - query a cultural-artifact catalog from the command line
#[derive(Parser, Debug)]
#[command(name = "artifact-search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search a cultural-artifact catalog", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Catalog API base URL (overrides configuration)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List catalog artifacts page by page
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        per_page: u32,
    },

    /// Fetch a single artifact by id
    Get {
        /// Artifact id
        id: String,
    },

    /// Search artifacts with filters
    Search {
        /// Artifact id filter
        #[arg(long)]
        id: Option<String>,

        /// Artifact name (partial match)
        #[arg(long)]
        name: Option<String>,

        /// Creator name
        #[arg(long)]
        creator: Option<String>,

        /// Format name (e.g. "Painting")
        #[arg(long)]
        format: Option<String>,

        /// Location name
        #[arg(long)]
        location: Option<String>,

        /// Material name
        #[arg(long)]
        material: Option<String>,

        /// Conservation report name
        #[arg(long)]
        conservation_report: Option<String>,

        /// Tag name; repeat for multiple tags
        #[arg(long)]
        tag: Vec<String>,

        /// General text search query
        #[arg(long, short = 'q')]
        query: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        per_page: u32,
    },

    /// Read search terms from stdin and search as you type (debounced)
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("artifact_search={log_level}")),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = if let Some(path) = &cli.config {
        load_config(path)?
    } else {
        get_config()
    };
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    if let Some(timeout) = cli.timeout {
        config.api.timeout_ms = timeout;
    }

    let client = ApiClient::from_config(&config)?;

    match cli.command {
        Commands::List { page, per_page } => {
            let response = report(client.list_artifacts(page, per_page, None).await)?;
            print_json(&format_list_response(&response))?;
        }
        Commands::Get { id } => {
            let response = report(client.get_artifact_by_id(&id, None).await)?;
            print_json(&format_item_response(&response))?;
        }
        Commands::Search {
            id,
            name,
            creator,
            format,
            location,
            material,
            conservation_report,
            tag,
            query,
            page,
            per_page,
        } => {
            let mut builder = QueryBuilder::new();
            builder.set_id(id);
            let joined_tags = tag.join(",");
            let result = (|| {
                builder.set_name(name.as_deref())?;
                builder.set_creator(creator.as_deref())?;
                builder.set_format(format.as_deref())?;
                builder.set_location(location.as_deref())?;
                builder.set_material(material.as_deref())?;
                builder.set_conservation_report(conservation_report.as_deref())?;
                if !joined_tags.is_empty() {
                    builder.set_tag(Some(joined_tags.as_str()))?;
                }
                builder.set_text_search(query.as_deref())?;
                builder.set_pagination(page, Some(per_page))?;
                Ok::<_, artifact_search::ValidationError>(builder.build())
            })();
            let params = match result {
                Ok(params) => params,
                Err(validation) => {
                    // Validation failures never reach the network.
                    let formatted =
                        FormattedError::from_error(&ClientError::Validation(validation));
                    log_error(&formatted, "cli");
                    eprintln!("{} {}", formatted.message, formatted.suggestion());
                    std::process::exit(1);
                }
            };

            let response = report(client.search_artifacts(&params, None).await)?;
            print_json(&format_list_response(&response))?;
        }
        Commands::Interactive => {
            run_interactive(client, &config).await?;
        }
    }

    Ok(())
}

/// Classify a gateway failure for the user, then propagate.
fn report<T>(result: Result<T, ClientError>) -> Result<T> {
    result.map_err(|error| {
        let formatted = FormattedError::from_error(&error);
        log_error(&formatted, "cli");
        eprintln!("{} {}", formatted.message, formatted.suggestion());
        anyhow::anyhow!(error)
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Feed stdin lines through the search controller, printing each settled
/// state. Stands in for the UI layer: one line is one search-term change.
async fn run_interactive(client: ApiClient, config: &Config) -> Result<()> {
    let controller = SearchController::new(
        Arc::new(client),
        SearchOptions::from(&config.search),
    );
    let mut state = controller.subscribe();

    let printer = tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let snapshot = state.borrow().clone();
            if snapshot.is_loading {
                eprintln!("searching \"{}\"...", snapshot.search_term);
            } else if let Some(error) = &snapshot.error {
                eprintln!("{} {}", error.message, error.suggestion());
            } else if let Some(data) = &snapshot.data {
                for artifact in data {
                    println!(
                        "{:>6}  {}  [{}]",
                        artifact.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                        artifact.name,
                        artifact.tags.join(", ")
                    );
                }
                eprintln!("{} results", data.len());
            }
        }
    });

    eprintln!("type to search; empty line clears, Ctrl-D exits");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        controller.set_search_term(&line);
    }

    controller.shutdown();
    // Let the last prints flush before tearing down.
    tokio::time::sleep(Duration::from_millis(50)).await;
    printer.abort();
    Ok(())
}
