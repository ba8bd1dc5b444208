use crate::error::AppError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Immediate sub-directories of `source`, sorted by name. Each becomes one image layer.
pub fn find_image_folders(source: &Path) -> Result<Vec<PathBuf>, AppError> {
    log::info!("Looking for image folders in {:?}", source);

    let mut folders = Vec::new();
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            log::trace!("Discovered folder: {:?}", entry.path());
            folders.push(entry.path());
        } else {
            log::trace!("Skipping non-directory entry: {:?}", entry.path());
        }
    }
    folders.sort();

    log::debug!("Found {} image folders", folders.len());
    Ok(folders)
}

/// Files below `dir` whose extension matches one of `extensions`, ignoring case.
pub fn find_files(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    log::debug!("Searching {:?} for extensions {:?}", dir, extensions);

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            log::trace!("Skipping non-file entry: {:?}", entry.path());
            continue;
        }
        let path = entry.path();
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if has_extension(ext, extensions) => {
                log::trace!("Matched file: {:?}", path);
                files.push(path.to_path_buf());
            }
            Some(_) => log::trace!("Skipping file due to unsupported extension: {:?}", path),
            None => log::trace!("Skipping file with no extension: {:?}", path),
        }
    }
    files
}

/// Track files for each extension in turn, keeping the configured extension order.
pub fn find_track_files(source: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut tracks = Vec::new();
    for extension in extensions {
        let found = find_files(source, std::slice::from_ref(extension));
        if found.is_empty() {
            log::info!("No .{} file found", extension);
        }
        tracks.extend(found);
    }
    tracks
}

/// Makes user-supplied track paths absolute against the current directory.
pub fn resolve_track_paths(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>, AppError> {
    paths
        .into_iter()
        .map(|path| Ok(std::path::absolute(path)?))
        .collect()
}

fn has_extension(ext: &str, extensions: &[String]) -> bool {
    extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
}
