//! Pitchside CLI - ask football statistics questions over a document folder
//!
//! # Commands
//!
//! ```bash
//! # One-shot question
//! pitchside --data ./data ask "Who won the 2023 Champions League?"
//!
//! # Conversation (/reset clears history, /quit leaves)
//! pitchside chat
//!
//! # Build the index ahead of time, or rebuild it after the data changed
//! pitchside index --rebuild
//!
//! # Inspect retrieval and chunking without the LLM
//! pitchside search "Haaland goals" -k 5
//! pitchside chunk data/season.txt --strategy fixed
//! ```

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pitchside_lib::{
    chunk::ChunkMetadata,
    config::{ChunkStrategy, ErrorHandling, LlmProvider, ReporterConfig},
    document::DirectoryReader,
    embed,
    index::VectorIndex,
    reporter::FootballStatsReporter,
    store::MemoryStore,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pitchside")]
#[command(about = "Football statistics assistant over your own documents")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Environment file with API keys; defaults to the nearest `.env`
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Document directory (overrides the config)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Index directory (overrides the config)
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    /// LLM provider: groq, openrouter or openai
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Answer provider failures with a short message instead of an error
    #[arg(long, global = true)]
    friendly_errors: bool,

    /// Log at info level when RUST_LOG is unset
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question
    Ask {
        question: String,
    },

    /// Interactive conversation on stdin
    Chat,

    /// Build and persist the index
    Index {
        /// Delete an existing index first
        #[arg(long)]
        rebuild: bool,
    },

    /// Show the chunks retrieved for a query
    Search {
        query: String,

        #[arg(short, long, default_value = "5")]
        k: usize,
    },

    /// Chunk a file and show the result
    Chunk {
        input: PathBuf,

        /// Chunking strategy: "paragraph" or "fixed"
        #[arg(short, long)]
        strategy: Option<String>,
    },
}

fn load_config(cli: &Cli) -> Result<ReporterConfig> {
    let mut config = match &cli.config {
        Some(path) => ReporterConfig::from_file(path)?,
        None => ReporterConfig::default(),
    };

    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }
    if let Some(index) = &cli.index {
        config.index_path = index.clone();
    }
    if let Some(provider) = &cli.provider {
        let provider: LlmProvider = provider.parse()?;
        if provider != config.llm.provider {
            // a model id from the config file belongs to the old provider
            config.llm.model = None;
        }
        config.llm.provider = provider;
    }
    if cli.friendly_errors {
        config.error_handling = ErrorHandling::Classify;
    }
    config.validate()?;
    Ok(config)
}

/// Load variables from `path`, or from the nearest `.env` when `None`.
/// Variables already set in the environment win.
fn load_env(path: Option<&Path>) -> Option<PathBuf> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    loaded.ok()
}

fn preview(text: &str, max: usize) -> String {
    let mut out: String = text.chars().take(max).collect();
    if text.chars().count() > max {
        out.push_str("...");
    }
    out
}

fn ask(config: ReporterConfig, question: &str) -> Result<()> {
    let mut reporter = FootballStatsReporter::new(config).context("failed to start the reporter")?;
    let result = reporter.query(question)?;
    println!("{}", result.answer);
    Ok(())
}

fn chat(config: ReporterConfig) -> Result<()> {
    let mut reporter = FootballStatsReporter::new(config).context("failed to start the reporter")?;
    println!("Ask about football statistics. /reset clears the conversation, /quit exits.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                reporter.reset_chat();
                println!("Conversation cleared.");
            }
            question => match reporter.query(question) {
                Ok(result) => println!("{}\n", result.answer),
                Err(e) => eprintln!("error: {e}\n"),
            },
        }
    }
    Ok(())
}

fn build_index(config: &ReporterConfig, rebuild: bool) -> Result<()> {
    let path = &config.index_path;
    if VectorIndex::<MemoryStore>::exists(path) {
        if !rebuild {
            bail!("an index already exists at {}; pass --rebuild to replace it", path.display());
        }
        fs::remove_dir_all(path).with_context(|| format!("cannot remove {}", path.display()))?;
        info!(path = %path.display(), "removed existing index");
    }

    let documents = DirectoryReader::new(&config.data_path).load_data()?;
    if documents.is_empty() {
        bail!("no documents found in {}", config.data_path.display());
    }

    let embedder = embed::from_config(&config.embedding)?;
    let chunker = config.chunking.build();
    let index = VectorIndex::from_documents(&documents, chunker.as_ref(), embedder)?;
    index.persist(path)?;

    println!(
        "Indexed {} documents into {} chunks at {}",
        documents.len(),
        index.len(),
        path.display()
    );
    Ok(())
}

fn search(config: &ReporterConfig, query: &str, k: usize) -> Result<()> {
    let path = &config.index_path;
    if !VectorIndex::<MemoryStore>::exists(path) {
        bail!("no index at {}; run `pitchside index` first", path.display());
    }

    let embedder = embed::from_config(&config.embedding)?;
    let index: VectorIndex = VectorIndex::load(path, embedder)?;
    let results = index.retrieve(query, k)?;

    println!("Searching '{query}' over {} chunks (k={k})\n", index.len());
    for (i, result) in results.iter().enumerate() {
        let source = result.chunk.metadata.extra.get("file_name").map_or("-", String::as_str);
        println!("#{} (score: {:.4}, source: {source})", i + 1, result.score);
        println!("---");
        println!("{}\n", preview(&result.chunk.content, 300));
    }
    Ok(())
}

fn chunk(config: &ReporterConfig, input: &Path, strategy: Option<&str>) -> Result<()> {
    let mut chunking = config.chunking.clone();
    match strategy {
        Some("paragraph") => chunking.strategy = ChunkStrategy::Paragraph,
        Some("fixed") => chunking.strategy = ChunkStrategy::Fixed,
        Some(other) => bail!("unknown chunking strategy: {other}"),
        None => {}
    }

    let text = fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    let chunker = chunking.build();
    let chunks = chunker.chunk(&text, ChunkMetadata::default());

    println!(
        "Chunked '{}' into {} chunks using {} strategy:\n",
        input.display(),
        chunks.len(),
        chunker.name()
    );
    for (i, chunk) in chunks.iter().enumerate() {
        println!(
            "--- Chunk {} ({} chars, position {}, id: {}) ---",
            i + 1,
            chunk.content.chars().count(),
            chunk.metadata.position,
            &chunk.id[..8]
        );
        println!("{}\n", preview(&chunk.content, 200));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_file = load_env(cli.env_file.as_deref());

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match (&env_file, &cli.env_file) {
        (Some(path), _) => debug!(path = %path.display(), "loaded environment file"),
        (None, Some(path)) => warn!(path = %path.display(), "cannot load environment file"),
        (None, None) => {}
    }

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Ask { question } => ask(config, &question),
        Commands::Chat => chat(config),
        Commands::Index { rebuild } => build_index(&config, rebuild),
        Commands::Search { query, k } => search(&config, &query, k),
        Commands::Chunk { input, strategy } => chunk(&config, &input, strategy.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchside_lib::config::LlmConfig;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pitchside").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_overrides_apply() {
        let cli = parse(&[
            "--data",
            "d",
            "--index",
            "i",
            "--provider",
            "openrouter",
            "--friendly-errors",
            "ask",
            "q",
        ]);
        let config = load_config(&cli).unwrap();

        assert_eq!(config.data_path, PathBuf::from("d"));
        assert_eq!(config.index_path, PathBuf::from("i"));
        assert_eq!(config.llm.provider, LlmProvider::OpenRouter);
        assert_eq!(config.error_handling, ErrorHandling::Classify);
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = load_config(&parse(&["chat"])).unwrap();
        assert_eq!(config, ReporterConfig::default());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(load_config(&parse(&["--provider", "acme", "chat"])).is_err());
    }

    #[test]
    fn test_env_file_supplies_api_key() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(".env");
        fs::write(&path, "# keys\nPITCHSIDE_CLI_TEST_KEY=gsk-from-file\n").unwrap();

        assert_eq!(load_env(Some(&path)), Some(path.clone()));

        let llm = LlmConfig {
            api_key_env: Some("PITCHSIDE_CLI_TEST_KEY".to_string()),
            ..LlmConfig::default()
        };
        assert_eq!(llm.api_key().as_deref(), Some("gsk-from-file"));
    }

    #[test]
    fn test_missing_env_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert_eq!(load_env(Some(&tmp.path().join("absent.env"))), None);
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("Haaland", 4), "Haal...");
    }
}
