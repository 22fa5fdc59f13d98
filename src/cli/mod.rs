use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "htmltrans")]
#[command(author, version, about = "Translate the visible text of HTML documents without touching their markup", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate HTML files with a generative model
    Translate(TranslateArgs),

    /// Show the text segments and chunk plan of an HTML file
    Extract(ExtractArgs),

    /// Manage the translated document cache
    Cache(CacheArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., api.gemini_api_key)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show config file path
    Path,

    /// Edit config file with default editor
    Edit,
}

#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show number of cached documents per language
    Stats,

    /// Remove every cached document
    Clear,

    /// Show cache database path
    Path,
}

#[derive(Parser, Debug)]
pub struct TranslateArgs {
    /// Input HTML file or directory
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file or directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target language code (e.g., es, ru, zh-CN)
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Subject area of the content, used to steer tone (e.g., "travel", "legal")
    #[arg(long)]
    pub domain: Option<String>,

    /// API provider (gemini, openai, claude, ollama)
    #[arg(long)]
    pub api: Option<String>,

    /// API key (can also be set via environment variable)
    #[arg(long)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[arg(long)]
    pub api_base: Option<String>,

    /// Model name to use
    #[arg(long)]
    pub model: Option<String>,

    /// Process subdirectories recursively
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Translate all documents concurrently; any failure fails the batch
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    /// Glossary file for consistent term translation
    #[arg(long)]
    pub glossary: Option<PathBuf>,

    /// Do not read or write the translated document cache
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,

    /// Rounds to retry failed documents before giving up on them
    #[arg(long)]
    pub job_attempts: Option<u32>,

    /// Write a JSON summary of translated and failed documents
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// HTML file to inspect
    #[arg(required = true)]
    pub input: PathBuf,

    /// Chunk budget in characters
    #[arg(short, long)]
    pub budget: Option<usize>,
}
