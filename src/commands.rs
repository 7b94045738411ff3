use crate::cli::{FetchArgs, PreprocessArgs};
use digest_core::{
    preprocess, time_window, AppConfig, DataError, DigestError, FetchArtifact, ProcessedArtifact,
};
use reddit_client::{FixedDelayPacer, RedditFetcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// `--output-dir` pins both stages to fixed artifact names inside one
/// directory so the two commands chain without repeating paths.
fn resolve_artifact_path(path: &Path, output_dir: Option<&Path>, file_name: &str) -> PathBuf {
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => path.to_path_buf(),
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), DigestError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn read_fetch_artifact(path: &Path) -> Result<FetchArtifact, DigestError> {
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DigestError::Data(DataError::FileNotFound {
                path: path.to_path_buf(),
            })
        } else {
            DigestError::Io(e)
        }
    })?;
    serde_json::from_str(&text).map_err(|e| {
        DigestError::Data(DataError::MalformedJson {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    })
}

pub async fn run_fetch(args: FetchArgs) -> Result<(), DigestError> {
    let mut config = AppConfig::load(&args.config)?;

    if !args.subreddits.is_empty() {
        config.subreddits = args.subreddits.clone();
    }
    if let Some(max_posts) = args.max_posts {
        config.fetch.max_posts_per_subreddit = max_posts;
    }

    let window = time_window::resolve(
        args.start.as_deref(),
        args.end.as_deref(),
        &config.time_window,
    )?;

    let pacer = Arc::new(FixedDelayPacer::from_secs(config.fetch.rate_limit_delay_secs));
    let fetcher = RedditFetcher::connect(&config, pacer).await;
    let artifact = fetcher.fetch_all(&config.subreddits, &window).await;

    // Nothing is written until the whole fetch succeeds, so a partial
    // run never clobbers a previous artifact.
    let output = resolve_artifact_path(&args.output, args.output_dir.as_deref(), "raw_posts.json");
    write_json(&output, &artifact)?;
    info!("Saved {} posts to {}", artifact.posts.len(), output.display());

    Ok(())
}

pub async fn run_preprocess(args: PreprocessArgs) -> Result<(), DigestError> {
    let config = AppConfig::load(&args.config)?;

    let input = resolve_artifact_path(&args.input, args.output_dir.as_deref(), "raw_posts.json");
    let artifact = read_fetch_artifact(&input)?;
    info!("Loaded {} posts from {}", artifact.posts.len(), input.display());

    let processed: ProcessedArtifact = preprocess::preprocess_posts(artifact, &config, args.top);

    let stats = &processed.preprocessing;
    info!(
        "Kept {} of {} posts ({} filtered out)",
        stats.output_count, stats.input_count, stats.filtered_count
    );
    for (subreddit, median) in &stats.subreddit_medians {
        info!("r/{subreddit} median score: {median}");
    }

    let output =
        resolve_artifact_path(&args.output, args.output_dir.as_deref(), "processed_posts.json");
    write_json(&output, &processed)?;
    info!("Saved processed posts to {}", output.display());

    Ok(())
}
