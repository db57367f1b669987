use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

const KEYDB_URL: &str = "http://www.labdv.com/aacs/KEYDB.cfg";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// `~/.config/aacs/KEYDB.cfg`, where libaacs looks for its key database.
pub(crate) fn keydb_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(".config").join("aacs").join("KEYDB.cfg"))
}

/// Downloads the AACS key database used for Blu-ray playback.
pub(crate) fn download_keydb() -> Result<PathBuf> {
    let path = keydb_path().context("HOME is not set")?;
    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;
    let body = client
        .get(KEYDB_URL)
        .send()
        .and_then(|response| response.error_for_status())
        .with_context(|| format!("failed to download {}", KEYDB_URL))?
        .bytes()
        .context("failed to read the key database")?;

    store(&path, &body)?;
    log::info!("Stored AACS key database in {}", path.display());
    Ok(path)
}

fn store(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config/aacs/KEYDB.cfg");
        store(&path, b"; KEYDB").expect("store");
        assert_eq!(fs::read(&path).expect("read"), b"; KEYDB");
    }
}
