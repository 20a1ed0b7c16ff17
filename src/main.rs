use clap::{Parser, Subcommand};
use filing_analyst::config::Config;
use filing_analyst::llm::{EmbeddingProvider, GeminiClient, GenerationProvider};
use filing_analyst::rag::{RagEngine, VectorIndex};
use filing_analyst::types::{AppError, AppResult};
use filing_analyst::{console, create_router, ingest, AppState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "filing-analyst")]
#[command(about = "Retrieval-augmented Q&A over an annual report filing")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server with the streaming chat endpoint
    Serve,
    /// Build the vector index from the source document
    Ingest {
        /// Path to the source PDF (defaults to DOCUMENT_PATH)
        #[arg(long)]
        document: Option<PathBuf>,
        /// Where to write the index (defaults to INDEX_PATH)
        #[arg(long)]
        index: Option<PathBuf>,
    },
    /// Interactive question-answering loop in the terminal
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filing_analyst=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Ingest { document, index } => {
            let document = document.unwrap_or_else(|| PathBuf::from(&config.ingest.document_path));
            let index = index.unwrap_or_else(|| PathBuf::from(&config.ingest.index_path));
            let client = gemini_client(&config);
            ingest::run(&document, &index, &config.ingest, client.as_ref()).await?;
            Ok(())
        }
        Command::Chat => {
            let engine = match build_engine(&config) {
                Ok(engine) => engine,
                Err(AppError::IndexNotFound(msg)) => {
                    eprintln!("Error: index not found ({msg}). Run `filing-analyst ingest` first!");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            console::run(&engine).await?;
            Ok(())
        }
    }
}

fn gemini_client(config: &Config) -> Arc<GeminiClient> {
    Arc::new(GeminiClient::new(
        &config.llm.google_api_key,
        &config.llm.generation_model,
        &config.llm.embedding_model,
        config.llm.max_retries,
    ))
}

fn build_engine(config: &Config) -> AppResult<RagEngine> {
    let index = VectorIndex::open(Path::new(&config.ingest.index_path))?;
    if index.embedding_model() != config.llm.embedding_model {
        warn!(
            index_model = index.embedding_model(),
            configured_model = %config.llm.embedding_model,
            "Index was built with a different embedding model; similarity scores may be meaningless"
        );
    }
    info!(
        entries = index.len(),
        model = %config.llm.generation_model,
        "Initializing Financial Analyst AI"
    );

    let client = gemini_client(config);
    let embedder: Arc<dyn EmbeddingProvider> = client.clone();
    let generator: Arc<dyn GenerationProvider> = client;
    Ok(RagEngine::new(
        index,
        embedder,
        generator,
        &config.retrieval,
    ))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let engine = match build_engine(&config) {
        Ok(engine) => Some(Arc::new(engine)),
        Err(AppError::IndexNotFound(msg)) => {
            warn!(reason = %msg, "Starting without an index; /chat will report not ready");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let state = AppState {
        engine,
        config: config.clone(),
    };
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {addr}");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
