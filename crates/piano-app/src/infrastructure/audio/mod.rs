//! Sample file adapter for [`SamplePlayer`].
//!
//! Every key is bound to one sample file, `<sounds_dir>/<key>.<extension>`
//! (`sounds/a.wav`, `sounds/[.wav`).  [`SampleFilePlayer`] resolves that path,
//! loads the file once, and keeps the bytes cached for later presses.
//!
//! This adapter makes no sound.  `play` only checks that the key's sample can
//! be loaded and reports a missing or unreadable one as an [`AudioError`].
//! Decoding and device output belong to the host UI that embeds the session.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use piano_core::KeyId;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::application::dispatch_key::{AudioError, SamplePlayer};
use crate::infrastructure::storage::config::AudioConfig;

/// Resolves and caches key samples from a directory.
///
/// Does not output audio: [`SamplePlayer::play`] succeeds once the sample is
/// loaded.
pub struct SampleFilePlayer {
    sounds_dir: PathBuf,
    extension: String,
    cache: RwLock<HashMap<KeyId, Arc<[u8]>>>,
}

impl SampleFilePlayer {
    pub fn new(sounds_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            sounds_dir: sounds_dir.into(),
            extension: extension.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(&config.sounds_dir, &config.sample_extension)
    }

    /// Path of the sample bound to `key`.
    pub fn sample_path(&self, key: KeyId) -> PathBuf {
        self.sounds_dir
            .join(format!("{}.{}", key.as_str(), self.extension))
    }

    /// Loads every key's sample ahead of the first press.
    ///
    /// Missing samples are logged and skipped; they will fail again (and be
    /// logged again) when their key is pressed.  Returns the number loaded.
    pub async fn preload(&self) -> usize {
        let mut loaded = 0;
        for key in KeyId::ALL {
            match self.sample(key).await {
                Ok(_) => loaded += 1,
                Err(e) => warn!("{e}"),
            }
        }
        info!(
            loaded,
            total = KeyId::ALL.len(),
            dir = %self.sounds_dir.display(),
            "samples preloaded"
        );
        loaded
    }

    async fn sample(&self, key: KeyId) -> Result<Arc<[u8]>, AudioError> {
        if let Some(data) = self.cache.read().await.get(&key) {
            return Ok(Arc::clone(data));
        }

        let path = self.sample_path(key);
        let data: Arc<[u8]> = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => {
                return Err(AudioError::Output(format!("{} is empty", path.display())))
            }
            Ok(bytes) => bytes.into(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AudioError::SampleMissing { key, path })
            }
            Err(source) => return Err(AudioError::Io { path, source }),
        };

        self.cache.write().await.insert(key, Arc::clone(&data));
        Ok(data)
    }
}

#[async_trait]
impl SamplePlayer for SampleFilePlayer {
    async fn play(&self, key: KeyId, volume: f32) -> Result<(), AudioError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(AudioError::Output(format!(
                "volume {volume} is outside 0.0..=1.0"
            )));
        }
        let data = self.sample(key).await?;
        debug!(%key, volume, bytes = data.len(), "sample ready; no output device attached");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
