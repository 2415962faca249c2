//! UI theme state shared by the preview surfaces.
//!
//! The UI theme is unrelated to the PDF theme picked for an export, it only drives
//! the preview stylesheet and the code highlight palette.

use crate::render::highlight_stylesheet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;

/// Key under which the UI theme is persisted.
pub const THEME_KEY: &str = "mdpress-theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiTheme {
    Light,
    #[default]
    Dark,
}

impl UiTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Class put on the preview root element.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Light => "solarized-light",
            Self::Dark => "solarized-dark",
        }
    }

    /// Label of the toggle button, naming the theme a click switches to.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Self::Light => "Dark",
            Self::Dark => "Light",
        }
    }

    pub fn toggle_icon(&self) -> &'static str {
        match self {
            Self::Light => "🌙",
            Self::Dark => "☀️",
        }
    }

    /// syntect theme used for the code highlight palette.
    pub fn highlight_theme(&self) -> &'static str {
        match self {
            Self::Light => "Solarized (light)",
            Self::Dark => "Solarized (dark)",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl std::fmt::Display for UiTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown UI theme `{0}`, expected `light` or `dark`")]
pub struct UnknownUiTheme(pub String);

impl FromStr for UiTheme {
    type Err = UnknownUiTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(UnknownUiTheme(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ThemeStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupted state file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Small key-value persistence for UI preferences.
pub trait ThemeStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, ThemeStoreError>;

    fn save(&self, key: &str, value: &str) -> Result<(), ThemeStoreError>;
}

/// Stores the preferences as a JSON object in a file.
#[derive(Debug)]
pub struct FileThemeStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store located in the project data directory.
    pub fn in_state_dir() -> std::io::Result<Self> {
        Ok(Self::new(dirs::Dirs::state_dir()?.join("state.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<HashMap<String, String>, ThemeStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl ThemeStore for FileThemeStore {
    fn load(&self, key: &str) -> Result<Option<String>, ThemeStoreError> {
        let _guard = self.lock.lock();
        Ok(self.read_entries()?.remove(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), ThemeStoreError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryThemeStore {
    entries: Mutex<HashMap<String, String>>,
}

impl ThemeStore for MemoryThemeStore {
    fn load(&self, key: &str) -> Result<Option<String>, ThemeStoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), ThemeStoreError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Owns the current [`UiTheme`] and broadcasts its changes.
pub struct ThemeManager {
    store: Arc<dyn ThemeStore>,
    sender: watch::Sender<UiTheme>,
}

impl std::fmt::Debug for ThemeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeManager")
            .field("theme", &self.theme())
            .finish()
    }
}

impl ThemeManager {
    /// Restores the persisted theme, an absent or unreadable entry yields the default.
    pub fn new(store: Arc<dyn ThemeStore>) -> Self {
        let theme = match store.load(THEME_KEY) {
            Ok(Some(value)) => value.parse().unwrap_or_else(|err| {
                tracing::warn!(?err, "Ignoring invalid persisted UI theme");
                UiTheme::default()
            }),
            Ok(None) => UiTheme::default(),
            Err(err) => {
                tracing::warn!(?err, "Failed to load the persisted UI theme");
                UiTheme::default()
            }
        };
        let (sender, _) = watch::channel(theme);
        Self { store, sender }
    }

    pub fn theme(&self) -> UiTheme {
        *self.sender.borrow()
    }

    /// Returns `true` if the theme has changed. Subscribers are only notified on change.
    pub fn set_theme(&self, theme: UiTheme) -> Result<bool, ThemeStoreError> {
        if self.theme() == theme {
            return Ok(false);
        }
        self.store.save(THEME_KEY, theme.as_str())?;
        let changed = self.sender.send_if_modified(|current| {
            if *current == theme {
                false
            } else {
                *current = theme;
                true
            }
        });
        if changed {
            tracing::debug!(%theme, "UI theme changed");
        }
        Ok(changed)
    }

    pub fn toggle(&self) -> Result<UiTheme, ThemeStoreError> {
        let next = self.theme().toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    /// Picks up a theme persisted by another process. Returns `true` if it has changed.
    pub fn reload(&self) -> Result<bool, ThemeStoreError> {
        let Some(theme) = self
            .store
            .load(THEME_KEY)?
            .and_then(|value| value.parse::<UiTheme>().ok())
        else {
            return Ok(false);
        };
        Ok(self.sender.send_if_modified(|current| {
            if *current == theme {
                false
            } else {
                *current = theme;
                true
            }
        }))
    }

    pub fn subscribe(&self) -> watch::Receiver<UiTheme> {
        self.sender.subscribe()
    }

    /// Highlight stylesheet matching the current theme.
    pub fn highlight_stylesheet(&self) -> String {
        highlight_stylesheet(self.theme().highlight_theme())
    }
}
