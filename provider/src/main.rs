//! The provider binary serves the product scraping tools over MCP and can drive
//! them itself with an OpenAI model through Rig.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use rig::client::{CompletionClient, ProviderClient};
use rig::providers::openai;
use rig_scrape_mcp::prelude::*;
use rig_scrape_provider::errors::ProviderError;
use rig_scrape_provider::{extract_file, render_extraction, ASK_PREAMBLE};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log line format (logs always go to stderr)
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(clap::Args, Clone)]
struct FetchArgs {
    /// Page download timeout in seconds
    #[arg(long, default_value_t = 90)]
    timeout_secs: u64,
    /// User-Agent header for page downloads
    #[arg(long)]
    user_agent: Option<String>,
    /// Largest page body accepted, in bytes
    #[arg(long, default_value_t = 10 * 1024 * 1024)]
    max_bytes: usize,
    /// Number of fetched pages kept for extract_info
    #[arg(long, default_value = "8")]
    max_cached_pages: NonZeroUsize,
}

impl FetchArgs {
    fn config(&self) -> FetchConfig {
        let config = FetchConfig::default()
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_bytes(self.max_bytes)
            .with_max_cached_pages(self.max_cached_pages);
        match &self.user_agent {
            Some(user_agent) => config.with_user_agent(user_agent.clone()),
            None => config,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serves fetch_page and extract_info over MCP stdio (default)
    Serve {
        #[command(flatten)]
        fetch: FetchArgs,
    },
    /// Extracts product data from a saved HTML page and prints it as JSON
    Extract {
        /// Path to the HTML file
        file: PathBuf,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Answers a request with an OpenAI model calling the product tools
    Ask {
        /// What to ask, e.g. "Extract the product data from https://..."
        request: String,
        /// OpenAI model name
        #[arg(long, default_value = "gpt-4o")]
        model: String,
        /// Maximum number of model turns (at least 1)
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        max_turns: u64,
        #[command(flatten)]
        fetch: FetchArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), ProviderError> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Some(Commands::Extract { file, pretty }) => {
            let extraction = extract_file(&file)?;
            println!("{}", render_extraction(&extraction, pretty)?);
        }
        Some(Commands::Ask {
            request,
            model,
            max_turns,
            fetch,
        }) => {
            run_ask(&request, &model, max_turns, &fetch.config()).await?;
        }
        Some(Commands::Serve { fetch }) => run_serve(&fetch.config()).await?,
        None => run_serve(&FetchConfig::default()).await?,
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run_serve(config: &FetchConfig) -> Result<(), ProviderError> {
    let registry = product_tools(config).await?;
    ScrapeMcpHandler::new(registry)
        .serve_stdio()
        .await
        .map_err(|e| ProviderError::Serve(e.to_string()))
}

async fn run_ask(
    request: &str,
    model_name: &str,
    max_turns: u64,
    config: &FetchConfig,
) -> Result<(), ProviderError> {
    if std::env::var("OPENAI_API_KEY").is_err() {
        return Err(ProviderError::Config(
            "OPENAI_API_KEY must be set to use `ask`".to_string(),
        ));
    }

    let client: openai::Client = openai::Client::from_env();
    let model = RigModel::new(client.completion_model(model_name)).with_preamble(ASK_PREAMBLE);
    let session = AgentSession::with_config(
        model,
        product_tools(config).await?,
        AgentConfig::default().with_max_turns(usize::try_from(max_turns).unwrap_or(usize::MAX)),
    );

    let outcome = session.run(request).await?;
    tracing::info!(
        event = "ask_finished",
        status = ?outcome.status,
        turns = outcome.metrics.turns,
        tool_calls = outcome.metrics.tool_calls,
        failed_tool_calls = outcome.metrics.failed_tool_calls,
        estimated_input_tokens = outcome.metrics.estimated_input_tokens,
        wall_time_ms = outcome.metrics.wall_time.as_millis(),
        "ask_finished"
    );
    println!("{}", outcome.content);
    Ok(())
}
