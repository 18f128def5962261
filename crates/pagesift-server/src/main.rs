use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pagesift_core::{Error, ExtractLimits, RankLimits, SearchRequest};
use pagesift_local::pipeline::{search_markup, search_page, SearchOptions};
use pagesift_local::{LocalFetcher, LocalFetcherConfig, DEFAULT_USER_AGENT};
use pagesift_server::{api, envelope};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "pagesift")]
#[command(about = "Fetch a page and rank its content fragments against a query", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (`POST /api/search/`, `GET /api/health/`).
    Serve(ServeCmd),
    /// Run one search and print the JSON envelope to stdout.
    Search(SearchCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug, Clone)]
struct FetchArgs {
    /// Fetch timeout (ms), network + body read.
    #[arg(long, env = "PAGESIFT_TIMEOUT_MS", default_value_t = pagesift_core::DEFAULT_FETCH_TIMEOUT_MS)]
    timeout_ms: u64,
    /// Hard cap on response body bytes.
    #[arg(long, env = "PAGESIFT_MAX_BYTES", default_value_t = pagesift_core::DEFAULT_MAX_BYTES)]
    max_bytes: u64,
    /// User-Agent sent to origin servers.
    #[arg(long, env = "PAGESIFT_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

impl FetchArgs {
    fn fetcher(&self) -> Result<LocalFetcher> {
        let cfg = LocalFetcherConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_millis(self.timeout_ms.max(1)),
            ..LocalFetcherConfig::default()
        };
        LocalFetcher::new(cfg).context("failed to build HTTP client")
    }

    fn options(&self) -> SearchOptions {
        SearchOptions {
            extract: ExtractLimits::default(),
            rank: RankLimits::default(),
            timeout_ms: Some(self.timeout_ms.max(1)),
            max_bytes: Some(self.max_bytes),
        }
    }
}

#[derive(clap::Args, Debug)]
struct ServeCmd {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "PAGESIFT_BIND", default_value = "127.0.0.1:8000")]
    bind: String,
    #[command(flatten)]
    fetch: FetchArgs,
}

#[derive(clap::Args, Debug)]
struct SearchCmd {
    /// Page to fetch.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    url: Option<String>,
    /// Read markup from a local file instead of fetching.
    #[arg(long)]
    file: Option<std::path::PathBuf>,
    /// Free-text query.
    #[arg(long)]
    query: String,
    /// Maximum results to print.
    #[arg(long, default_value_t = RankLimits::default().max_results)]
    max_results: usize,
    #[command(flatten)]
    fetch: FetchArgs,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    // stderr keeps stdout clean for the JSON printed by `search` / `version`.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_serve(args: ServeCmd) -> Result<()> {
    let fetcher = args.fetch.fetcher()?;
    let state = api::AppState {
        fetcher: Arc::new(fetcher),
        opts: Arc::new(args.fetch.options()),
    };
    let app = api::router(state);

    let addr: SocketAddr = args
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", args.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("pagesift listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn run_search(args: SearchCmd) -> Result<()> {
    let started = Instant::now();
    let mut opts = args.fetch.options();
    opts.rank.max_results = args.max_results;

    let outcome = match (&args.url, &args.file) {
        (_, Some(path)) => {
            let markup = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            if args.query.trim().is_empty() {
                Err(Error::InvalidInput("Both URL and query are required".into()))
            } else {
                search_markup(&markup, args.query.trim(), &opts.extract, &opts.rank)
            }
        }
        (Some(url), None) => {
            let fetcher = args.fetch.fetcher()?;
            let req = SearchRequest {
                url: url.clone(),
                query: args.query.clone(),
            };
            search_page(&fetcher, &req, &opts).await
        }
        (None, None) => anyhow::bail!("either --url or --file is required"),
    };

    match outcome {
        Ok(outcome) => {
            let v = envelope::success(&outcome, started.elapsed().as_millis());
            println!("{}", serde_json::to_string_pretty(&v)?);
            Ok(())
        }
        Err(e) => {
            let (_status, v) = envelope::error(&e);
            println!("{}", serde_json::to_string_pretty(&v)?);
            Err(e).context("search failed")
        }
    }
}

fn run_version(args: VersionCmd) -> Result<()> {
    let name = "pagesift";
    let version = env!("CARGO_PKG_VERSION");
    match args.output.as_str() {
        "text" => println!("{name} {version}"),
        "json" => {
            let v = serde_json::json!({
                "schema_version": envelope::SCHEMA_VERSION,
                "name": name,
                "version": version,
            });
            println!("{}", serde_json::to_string_pretty(&v)?);
        }
        other => anyhow::bail!("unknown output format: {other} (allowed: json, text)"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Search(args) => run_search(args).await,
        Commands::Version(args) => run_version(args),
    }
}
