use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{Level, info, warn};

use person_search::presentation::{CardView, MatchCard, PlaybackToggles};
use person_search::workflow::{Dispatch, WorkflowHandle};
use person_search::{AppError, CoordinatorBuilder, MediaUpload, SearchScope, Settings};

/// Finds a person from a reference photo in footage indexed by the search service.
#[derive(Parser, Debug)]
#[command(name = "person-search", version)]
struct Cli {
    /// Reference image of the person to look for
    #[arg(long, value_name = "IMAGE")]
    reference: PathBuf,
    /// Video to upload and search within
    #[arg(long, value_name = "FILE", conflicts_with = "job_id")]
    video: Option<PathBuf>,
    /// Previously ingested video to search within; omit to search all videos
    #[arg(long, value_name = "ID")]
    job_id: Option<String>,
    /// Number of matches to return
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    top_k: Option<u32>,
    /// Settings file (toml, yaml or json)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

async fn read_upload(path: &Path) -> Result<MediaUpload, AppError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(MediaUpload::new(file_name, bytes))
}

/// Waits for an action to finish, echoing the status narrative on failure.
async fn settle(handle: &WorkflowHandle, dispatch: Dispatch) -> Result<(), AppError> {
    let result = dispatch.settle().await;
    if result.is_err() {
        eprintln!("{}", handle.snapshot().status_message());
    }
    result
}

fn print_card(card: &MatchCard) {
    println!(
        "#{:<3} {} (job {}) frame {} at {}",
        card.rank, card.title, card.job_id, card.frame_number, card.timestamp
    );
    println!(
        "     face {} [{}]  combined {} [{}]  gender {}  age {}",
        card.face.percent, card.face.band, card.combined.percent, card.combined.band, card.gender, card.age
    );
    match &card.view {
        CardView::Frame { image_url, .. } => println!("     frame {}", image_url),
        CardView::Unavailable { asset_name } => println!("     frame {} not available", asset_name),
        CardView::Playback { stream_url, .. } => println!("     video {}", stream_url),
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let settings = Settings::load(cli.config.as_deref())?;
    let mut builder = CoordinatorBuilder::new(settings);
    if let Some(top_k) = cli.top_k {
        builder = builder.top_k(top_k as usize);
    }
    let (coordinator, handle) = builder.build()?;

    let reference = read_upload(&cli.reference).await?;
    settle(&handle, handle.enroll(reference).await?).await?;
    info!("{}", handle.snapshot().status_message());

    match (&cli.video, &cli.job_id) {
        (Some(video), _) => {
            let video = read_upload(video).await?;
            settle(&handle, handle.ingest(video).await?).await?;
        }
        (None, Some(job_id)) => {
            settle(&handle, handle.select_scope(SearchScope::from_job_input(job_id)).await?).await?;
        }
        (None, None) => {
            settle(&handle, handle.select_scope(SearchScope::AllFootage).await?).await?;
        }
    }
    info!("{}", handle.snapshot().status_message());

    let scoped_job = handle.snapshot().scope().job_filter().map(str::to_string);
    if let Some(job_id) = scoped_job {
        if let Err(e) = handle.load_footage_info(job_id).await?.settle().await {
            warn!("Using the assumed frame rate: {}", e);
        }
    }

    settle(&handle, handle.search().await?).await?;
    let state = handle.snapshot();
    println!("{}", state.status_message());
    for card in coordinator.presenter().present(&state, &PlaybackToggles::new()) {
        print_card(&card);
    }

    coordinator.shutdown().await
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli).await
}
