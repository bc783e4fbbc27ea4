use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "newswire")]
#[command(about = "RSS/Atom news aggregator with an offline cache")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch all feeds and show the latest headlines
    Run {
        /// Don't touch the network, serve the cached headlines
        #[arg(long)]
        offline: bool,

        /// Print headlines as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the cached headlines snapshot
    Cached {
        /// Print headlines as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the configured feeds
    Feeds,

    /// Export the feed list to OPML format
    Export {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Discard the cached headlines
    ClearCache,
}
