use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "encquery")]
#[command(about = "Build and parse encoder CLI queries", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print debug logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate an encoder query from a JSON settings file
    Generate {
        /// Path to the settings JSON
        settings: PathBuf,

        /// Emit a preview query starting at this preview index
        #[arg(long, value_name = "INDEX")]
        preview: Option<u32>,

        /// Preview length in seconds
        #[arg(long, default_value_t = 30)]
        duration: u32,

        /// Prefix the query with the encoder executable, shell-quoted
        #[arg(long, value_name = "PATH")]
        with_program: Option<String>,
    },

    /// Parse an encoder query and print the settings as JSON
    Parse {
        /// The query string (quote it)
        query: String,
    },

    /// Canonicalize an x264 advanced option string
    Standardize {
        /// Colon-separated name=value list
        options: String,
    },

    /// Check a JSON settings file for conflicting or out-of-range options
    Validate {
        /// Path to the settings JSON
        settings: PathBuf,
    },

    /// Convert a quality slider position to the encoder's -q value
    Quality {
        /// Video encoder token (x264, ffmpeg, theora)
        #[arg(long, default_value = "x264")]
        encoder: String,

        /// Slider position
        slider: u32,
    },

    /// Manage presets
    Preset {
        #[command(subcommand)]
        action: PresetAction,
    },

    /// Manage the encode queue
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },

    /// Show config status and location, or create default config if missing
    InitConfig,
}

#[derive(Subcommand)]
pub enum PresetAction {
    /// List built-in and user presets
    List,

    /// Print a preset's query and settings
    Show { name: String },

    /// Save a query as a user preset
    Add {
        name: String,
        query: String,

        /// Keep crop and picture size in the preset
        #[arg(long)]
        picture_settings: bool,
    },

    /// Delete a user preset
    Remove { name: String },
}

#[derive(Subcommand)]
pub enum QueueAction {
    /// List queued encodes
    List,

    /// Queue the query generated from a JSON settings file
    Add { settings: PathBuf },

    /// Remove a queued encode by id
    Remove { id: uuid::Uuid },
}

pub fn parse() -> Cli {
    Cli::parse()
}
