//! # CSAPI CLI
//!
//! Explore an OGC API - Connected Systems server from the command line.
//! Results go to stdout as JSON; logs go to stderr.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use csapi_client::{Endpoint, HttpTransport};
use csapi_core::{
    classify, DatastreamsQuery, LimitQuery, Navigator, Negotiation, ObservationsQuery,
    ResourceKind, SystemsQuery,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

mod config;

use config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "csapi", version)]
#[command(about = "Discover and query OGC API - Connected Systems servers")]
struct Cli {
    /// API root URL (overrides CSAPI_SERVER)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Basic auth user (overrides CSAPI_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Basic auth password (overrides CSAPI_PASS)
    #[arg(long, global = true)]
    password: Option<String>,

    /// Bearer token (overrides CSAPI_BEARER_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Request timeout in seconds (overrides CSAPI_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// CA certificate for self-signed servers (overrides CSAPI_CA_CERT)
    #[arg(long, global = true)]
    ca_cert: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the landing page, Connected Systems conformance and collection negotiation
    Discover,

    /// Print the navigator URL for every resource kind
    Urls {
        /// Collection id (default: first negotiable collection)
        #[arg(long)]
        collection: Option<String>,
    },

    /// Fetch and print a normalized page
    Fetch {
        /// Resource kind
        #[arg(value_enum)]
        kind: FetchKind,

        /// Collection id (default: first negotiable collection)
        #[arg(long)]
        collection: Option<String>,

        /// Entity id: fetches one entity for systems/datastreams, required for sub-resources
        #[arg(long)]
        id: Option<String>,

        /// Page size
        #[arg(long)]
        limit: Option<u32>,

        /// Follow `next` links and print every item
        #[arg(long)]
        all: bool,

        /// Stop after this many pages when following links
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Print the format tag for a content type
    Classify {
        /// Content-Type header value
        content_type: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FetchKind {
    Systems,
    Datastreams,
    Observations,
    SystemDatastreams,
    DatastreamObservations,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let connect = || -> Result<Endpoint<HttpTransport>> {
        let config = load_config(&cli)?;
        tracing::debug!(server = %config.server, "Configuration loaded");
        let endpoint = Endpoint::connect(&config.server, &config.transport)
            .context("Failed to create endpoint")?;
        Ok(endpoint.with_options(config.fetch_options()))
    };

    let output = match &cli.command {
        Command::Classify { content_type } => {
            println!("{}", classify(Some(content_type.as_str())));
            return Ok(());
        }
        Command::Discover => discover(&connect()?).await?,
        Command::Urls { collection } => {
            let endpoint = connect()?;
            let navigator = navigator(&endpoint, collection.as_deref()).await?;
            urls(&navigator)
        }
        Command::Fetch {
            kind,
            collection,
            id,
            limit,
            all,
            max_pages,
        } => {
            let endpoint = connect()?;
            let navigator = navigator(&endpoint, collection.as_deref()).await?;
            let request = FetchRequest {
                kind: *kind,
                id: id.as_deref(),
                limit: *limit,
                all: *all,
                max_pages: *max_pages,
            };
            fetch(&endpoint, &navigator, &request).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Environment first, then command-line overrides.
fn load_config(cli: &Cli) -> Result<CliConfig> {
    let mut config = CliConfig::from_env()?;

    if let Some(server) = &cli.server {
        config.server.clone_from(server);
    }
    if cli.user.is_some() {
        config.user.clone_from(&cli.user);
    }
    if cli.password.is_some() {
        config.password.clone_from(&cli.password);
    }
    if cli.token.is_some() {
        config.bearer_token.clone_from(&cli.token);
    }
    if let Some(secs) = cli.timeout {
        config.transport.timeout = Duration::from_secs(secs);
    }
    if cli.ca_cert.is_some() {
        config.transport.ca_cert_path.clone_from(&cli.ca_cert);
    }

    Ok(config)
}

async fn discover(endpoint: &Endpoint<HttpTransport>) -> Result<Value> {
    let landing = endpoint
        .info()
        .await
        .context("Failed to load landing page")?;
    let conformance = endpoint.conformance().await?;
    let collections = endpoint
        .collections()
        .await
        .context("Failed to load collections")?;

    let mut report = Vec::with_capacity(collections.len());
    for collection in collections {
        let entry = match endpoint.negotiate_collection(collection).await? {
            Negotiation::Supported { capabilities, tier } => json!({
                "id": collection.id,
                "title": collection.display_name(),
                "supported": true,
                "tier": tier,
                "capabilities": capabilities,
            }),
            Negotiation::NotSupported => json!({
                "id": collection.id,
                "title": collection.display_name(),
                "supported": false,
            }),
        };
        report.push(entry);
    }

    Ok(json!({
        "server": endpoint.api_url().as_str(),
        "title": landing.title,
        "connectedSystems": conformance.filter(csapi_core::CONNECTED_SYSTEMS_KEYWORDS),
        "conformanceClasses": conformance.len(),
        "collections": report,
    }))
}

async fn navigator(
    endpoint: &Endpoint<HttpTransport>,
    collection: Option<&str>,
) -> Result<Navigator> {
    match collection {
        Some(id) => endpoint
            .navigator_for(id)
            .await
            .with_context(|| format!("Collection {id} is not navigable")),
        None => {
            let (collection, navigator) = endpoint
                .find_navigator()
                .await
                .context("No Connected Systems collection found")?;
            tracing::info!(collection = %collection.id, "Using collection");
            Ok(navigator)
        }
    }
}

fn urls(navigator: &Navigator) -> Value {
    let placeholder = "{id}";
    let mut urls = serde_json::Map::new();
    for kind in ResourceKind::ALL {
        let url = match kind {
            ResourceKind::Systems => navigator.systems_url(&SystemsQuery::new()),
            ResourceKind::Datastreams => navigator.datastreams_url(&DatastreamsQuery::new()),
            ResourceKind::Observations => navigator.observations_url(&ObservationsQuery::new()),
            ResourceKind::SystemDatastreams => {
                navigator.system_datastreams_url(placeholder, &LimitQuery::default())
            }
            ResourceKind::DatastreamObservations => {
                navigator.datastream_observations_url(placeholder, &ObservationsQuery::new())
            }
        };
        urls.insert(
            kind.to_string(),
            json!({"url": url.as_str(), "advertised": navigator.supports(kind)}),
        );
    }

    json!({
        "base": navigator.base_url().as_str(),
        "formats": navigator.supported_formats(),
        "crs": navigator.supported_crs(),
        "resources": urls,
    })
}

struct FetchRequest<'a> {
    kind: FetchKind,
    id: Option<&'a str>,
    limit: Option<u32>,
    all: bool,
    max_pages: Option<usize>,
}

async fn fetch(
    endpoint: &Endpoint<HttpTransport>,
    navigator: &Navigator,
    request: &FetchRequest<'_>,
) -> Result<Value> {
    let require_id = || {
        request
            .id
            .context("--id is required for this resource kind")
    };

    let url: Url = match (request.kind, request.id) {
        (FetchKind::Systems, Some(id)) => return fetch_entity(endpoint, navigator.system_url(id)).await,
        (FetchKind::Datastreams, Some(id)) => {
            return fetch_entity(endpoint, navigator.datastream_url(id)).await
        }
        (FetchKind::Systems, None) => {
            let mut query = SystemsQuery::new();
            query.limit = request.limit;
            navigator.systems_url(&query)
        }
        (FetchKind::Datastreams, None) => {
            let mut query = DatastreamsQuery::new();
            query.limit = request.limit;
            navigator.datastreams_url(&query)
        }
        (FetchKind::Observations, _) => {
            let mut query = ObservationsQuery::new();
            query.limit = request.limit;
            navigator.observations_url(&query)
        }
        (FetchKind::SystemDatastreams, _) => navigator.system_datastreams_url(
            require_id()?,
            &LimitQuery {
                limit: request.limit,
            },
        ),
        (FetchKind::DatastreamObservations, _) => {
            let mut query = ObservationsQuery::new();
            query.limit = request.limit;
            navigator.datastream_observations_url(require_id()?, &query)
        }
    };

    if !request.all {
        let page = endpoint.fetch_page(&url).await?;
        return Ok(json!({
            "url": page.url.as_str(),
            "status": page.status,
            "format": page.format,
            "envelope": page.envelope,
            "items": page.page.items,
            "links": page.page.links,
            "next": page.next_url().map(|next| next.to_string()),
        }));
    }

    let mut walker = endpoint.pages(url.clone());
    if let Some(max_pages) = request.max_pages {
        if max_pages == 0 {
            bail!("--max-pages must be at least 1");
        }
        walker = walker.with_max_pages(max_pages);
    }
    let items = walker.collect_all().await?;

    Ok(json!({
        "url": url.as_str(),
        "pages": walker.pages_fetched(),
        "count": items.len(),
        "items": items,
    }))
}

async fn fetch_entity(endpoint: &Endpoint<HttpTransport>, url: Url) -> Result<Value> {
    match endpoint.fetch_entity(&url).await? {
        Some(entity) => Ok(entity),
        None => bail!("Not found: {url}"),
    }
}
