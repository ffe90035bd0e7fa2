//! CLI module for recall
//!
//! Provides command-line parsing for the `recall` binary. Uses clap for
//! argument parsing and owo-colors for colored terminal output.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// recall - retrieval over a personal knowledge base
///
/// Chunks and embeds notes, searches the configured vector index, and
/// assembles retrieval-augmented prompts.
#[derive(Parser, Debug)]
#[command(
    name = "recall",
    version,
    about = "recall - retrieval over a personal knowledge base",
    after_help = "EXAMPLES:\n    \
                  recall chunk notes/today.md --max-length 200\n    \
                  recall query \"semantic search\" --file notes/vector-dbs.md\n    \
                  recall prompt \"what is RAG?\" --file notes/rag.md\n    \
                  recall --config my.toml config --validate"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "recall.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a file into sentence-packed chunks
    Chunk {
        /// File to chunk
        file: PathBuf,

        /// Maximum chunk length in characters (defaults to context.max_chunk_length)
        #[arg(short, long)]
        max_length: Option<usize>,
    },

    /// Embed a text and report the backend used
    Embed {
        /// Text to embed
        text: String,
    },

    /// Chunk, embed and upsert a file into the index
    Ingest {
        /// File to ingest
        file: PathBuf,

        /// Document id (defaults to the file path)
        #[arg(long)]
        id: Option<String>,

        /// Source recorded in metadata (defaults to the file name)
        #[arg(long)]
        source: Option<String>,

        /// Category recorded in metadata
        #[arg(long)]
        category: Option<String>,
    },

    /// Search the index
    Query {
        /// Query text
        text: String,

        /// Files to ingest before searching
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        /// Number of results (defaults to index.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Restrict to these categories
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Restrict to documents dated within the last 30 days
        #[arg(long, conflicts_with = "categories")]
        recent: bool,
    },

    /// Print the completion request for a question
    Prompt {
        /// Question to answer
        text: String,

        /// Files to ingest before assembling context
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
