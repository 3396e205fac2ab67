use crate::error::{Result, WatchError};
use crate::models::Watchlist;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// JSON file holding the whole watchlist.
///
/// Nothing is cached between calls: every read goes to disk. Writers go through
/// [`WatchlistStore::update`], which serialises the load, mutate and save steps so
/// two commands touching the file at once cannot drop each other's change.
pub struct WatchlistStore {
    path: PathBuf,
    writer: Mutex<()>,
}

impl WatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Watchlist> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Watchlist file missing, starting empty");
                return Ok(Watchlist::new());
            }
            Err(e) => return Err(e.into()),
        };

        let list: Watchlist = serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        debug!("Loaded {} entries", list.len());
        Ok(list)
    }

    /// Writes to a sibling temp file and renames it over the target.
    #[instrument(skip(self, list), fields(path = %self.path.display(), entries = list.len()))]
    pub async fn save(&self, list: &Watchlist) -> Result<()> {
        let json = serde_json::to_string_pretty(list)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.temp_path();
        if let Err(e) = fs::write(&tmp_path, json.as_bytes()).await {
            warn!("Failed to write temp file {}: {}", tmp_path.display(), e);
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(WatchError::Io(e));
        }

        debug!("Watchlist saved");
        Ok(())
    }

    /// Runs `mutate` against a fresh copy of the file and saves the result when it succeeds.
    pub async fn update<T, F>(&self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut Watchlist) -> Result<T>,
    {
        let _guard = self.writer.lock().await;
        let mut list = self.load().await?;
        let outcome = mutate(&mut list)?;
        self.save(&list).await?;
        info!("Watchlist updated ({} entries)", list.len());
        Ok(outcome)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("watchlist.json"));
        name.push(format!(".{}.tmp", uuid::Uuid::new_v4()));
        self.path.with_file_name(name)
    }
}
