//! JOSM remote control client. Remote control and "open local files" must be enabled in JOSM.

use crate::error::AppError;
use crate::session::normalize_separators;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub fn open_file_url(session_path: &Path, port: u16) -> Result<Url, AppError> {
    let filename = normalize_separators(&session_path.to_string_lossy());
    let url = Url::parse_with_params(
        &format!("http://127.0.0.1:{}/open_file", port),
        &[("filename", filename.as_str())],
    )?;
    Ok(url)
}

/// Asks a running JOSM instance to load the session file.
pub async fn open_in_josm(
    session_path: &Path,
    port: u16,
    timeout: Duration,
) -> Result<(), AppError> {
    let url = open_file_url(session_path, port)?;
    log::info!("Opening the session in JOSM: {}", url);

    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(AppError::RemoteStatus(response.status()));
    }

    log::info!("JOSM accepted the session file");
    Ok(())
}
