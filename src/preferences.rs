use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Preferences {
    pub chart_type: ChartType,
}

/// Where UI preferences live. Injected so tests can swap the file for memory.
pub trait PreferenceStore: Send + Sync + 'static {
    fn load(&self) -> impl Future<Output = Preferences> + Send;
    fn save(&self, prefs: &Preferences) -> impl Future<Output = std::io::Result<()>> + Send;
}

pub struct JsonFilePreferences {
    path: PathBuf,
}

impl JsonFilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFilePreferences {
    async fn load(&self) -> Preferences {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(prefs) => prefs,
                Err(err) => {
                    error!("failed to parse preferences file: {err}");
                    Preferences::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(err) => {
                error!("failed to read preferences file: {err}");
                Preferences::default()
            }
        }
    }

    async fn save(&self, prefs: &Preferences) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(prefs)?;
        fs::write(&self.path, payload).await
    }
}

#[derive(Default)]
pub struct MemoryPreferences {
    inner: Mutex<Preferences>,
}

impl PreferenceStore for MemoryPreferences {
    async fn load(&self) -> Preferences {
        self.inner.lock().map(|prefs| prefs.clone()).unwrap_or_default()
    }

    async fn save(&self, prefs: &Preferences) -> std::io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| std::io::Error::other("preferences lock poisoned"))?;
        *guard = prefs.clone();
        Ok(())
    }
}
