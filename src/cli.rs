use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "reddit-digest",
    about = "Fetch and rank subreddit posts for digest summarization",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch posts from the configured subreddits into a raw artifact
    Fetch(FetchArgs),
    /// Score, rank, and truncate a raw artifact for summarization
    Preprocess(PreprocessArgs),
}

#[derive(Debug, Parser)]
pub struct FetchArgs {
    /// Window start (RFC 3339, "YYYY-MM-DD HH:MM:SS", or bare date)
    #[arg(short, long)]
    pub start: Option<String>,

    /// Window end, same formats as --start
    #[arg(short, long)]
    pub end: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Output path for the raw artifact
    #[arg(short, long, default_value = "output/raw_posts.json")]
    pub output: PathBuf,

    /// Write raw_posts.json into this directory instead of --output
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,

    /// Subreddit to fetch (repeatable; overrides the configured list)
    #[arg(short = 'r', long = "subreddit")]
    pub subreddits: Vec<String>,

    /// Per-subreddit post cap (overrides the configured value)
    #[arg(short, long)]
    pub max_posts: Option<usize>,
}

#[derive(Debug, Parser)]
pub struct PreprocessArgs {
    /// Raw artifact produced by the fetch command
    #[arg(short, long, default_value = "output/raw_posts.json")]
    pub input: PathBuf,

    /// Output path for the processed artifact
    #[arg(short, long, default_value = "output/processed_posts.json")]
    pub output: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Number of top-ranked posts to keep
    #[arg(short = 'n', long = "top", default_value_t = 50)]
    pub top: usize,

    /// Read and write the fixed-name artifacts in this directory
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,
}
