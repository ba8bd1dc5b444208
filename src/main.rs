use anyhow::Result;
use clap::Parser;
use josm_session::config::AppConfig;
use josm_session::metadata::TrackReference;
use josm_session::session::{SessionDocument, SessionOptions, WriteStatus};
use josm_session::{processor, remote, walker};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

/// Build a JOSM session file from folders of geotagged JPEG pictures.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Folder holding one sub-folder of pictures per layer. Defaults to the current directory.
    source: Option<PathBuf>,

    /// GPX/NMEA track files. Without this, track files are searched for in the source folder.
    #[arg(short, long = "gpxfile")]
    gpxfile: Vec<PathBuf>,

    /// Load the session in JOSM (must be running with remote control enabled).
    #[arg(short, long)]
    josm: bool,

    /// Where to write the session file. Defaults to `session.jos` in the source folder.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn build_document(
    source: PathBuf,
    tracks: Vec<PathBuf>,
    config: &AppConfig,
) -> Result<SessionDocument> {
    let tracks = if tracks.is_empty() {
        walker::find_track_files(&source, &config.track_extensions)
    } else {
        walker::resolve_track_paths(tracks)?
    };

    let folders = walker::find_image_folders(&source)?;
    info!("Searching for jpeg images in {} folders", folders.len());
    let layers = processor::scan_folders(&folders, config)?;

    Ok(SessionDocument::new(
        layers,
        tracks.into_iter().map(TrackReference::new).collect(),
        SessionOptions::from(config),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::new()?;
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    info!("Starting josm-session");
    log::debug!("Arguments: {:?}", args);

    let source = match args.source {
        Some(source) => source,
        None => std::env::current_dir()?,
    };
    let source = std::path::absolute(&source)?;
    let session_path = match args.output {
        Some(output) => std::path::absolute(output)?,
        None => source.join(&config.session_file_name),
    };

    let scan_config = config.clone();
    let document = tokio::task::spawn_blocking(move || {
        build_document(source, args.gpxfile, &scan_config)
    })
    .await??;

    match document.write_to(&session_path)? {
        WriteStatus::Written(path) => info!("Session written to {:?}", path),
        WriteStatus::DirectoryMissing(dir) => {
            log::error!("Session not written, {:?} does not exist", dir);
            return Ok(());
        }
    }

    if args.josm {
        let timeout = Duration::from_secs(config.remote_timeout_secs);
        if let Err(e) = remote::open_in_josm(&session_path, config.josm_port, timeout).await {
            log::error!("Could not open the session in JOSM: {}", e);
        }
    }

    info!("josm-session finished");
    Ok(())
}
