use dirs::Dirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

static CONFIG: OnceLock<ConfigInner> = OnceLock::new();

#[derive(Debug)]
struct ConfigInner {
    config: Config,
    file_path: PathBuf,
}

struct LoadedConfig {
    config: Config,
    file_path: PathBuf,
    maybe_error: Option<toml::de::Error>,
}

fn load_config(specified_config_file: Option<PathBuf>) -> LoadedConfig {
    let config_file = specified_config_file.unwrap_or_else(Dirs::config_file);

    let mut maybe_config_err = None;
    let config = std::fs::read_to_string(&config_file)
        .and_then(|contents| {
            toml::from_str(&contents).map_err(|err| {
                maybe_config_err.replace(err);
                std::io::Error::new(std::io::ErrorKind::Other, "Error occurred in config.toml")
            })
        })
        .unwrap_or_default();

    LoadedConfig {
        config,
        file_path: config_file,
        maybe_error: maybe_config_err,
    }
}

/// Loads the config file once and installs it as the process-wide [`Config`].
///
/// A malformed config file does not abort the startup, the default config is used
/// instead and the parse error is handed back to the caller for reporting.
pub fn load_config_on_startup(
    specified_config_file: Option<PathBuf>,
) -> (&'static Config, Option<toml::de::Error>) {
    let mut maybe_error = None;

    CONFIG.get_or_init(|| {
        let LoadedConfig {
            config,
            file_path,
            maybe_error: err,
        } = load_config(specified_config_file);
        maybe_error = err;
        tracing::debug!(?file_path, "Loaded config");
        ConfigInner { config, file_path }
    });

    (config(), maybe_error)
}

/// [`Config`] is a global singleton, explicitly initialized by [`load_config_on_startup`]
/// when the program is started from CLI. Code paths that run without the CLI (tests,
/// embedding) get the config from the default location.
pub fn config() -> &'static Config {
    &CONFIG
        .get_or_init(|| {
            let LoadedConfig {
                config, file_path, ..
            } = load_config(None);
            ConfigInner { config, file_path }
        })
        .config
}

pub fn config_file() -> Option<&'static PathBuf> {
    CONFIG.get().map(|c| &c.file_path)
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LogConfig {
    /// Specify the log file path.
    ///
    /// This path must be an absolute path.
    pub log_file: Option<String>,

    /// Specify the max log level.
    pub max_level: String,

    /// Specify the log target to enable more detailed logging.
    ///
    /// ```toml
    /// [log]
    /// log-target = "pdf_export=trace,tower_http=debug"
    /// ```
    pub log_target: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            max_level: "debug".into(),
            log_target: "".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,

    /// Port to listen on, the `PORT` environment variable takes precedence.
    pub port: u16,

    /// Max size of a request body, 10MiB by default.
    ///
    /// Larger requests are rejected by the transport with `413 Payload Too Large`.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn port(&self) -> u16 {
        std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.port)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Quiet period after the last edit before the preview is re-rendered.
    pub debounce_ms: u64,

    /// Delay between a UI theme switch and the forced re-render, letting the new
    /// stylesheet apply first.
    pub theme_change_delay_ms: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            theme_change_delay_ms: 100,
        }
    }
}

impl PreviewConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn theme_change_delay(&self) -> Duration {
        Duration::from_millis(self.theme_change_delay_ms)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ExportConfig {
    /// PDF theme used when a request does not name one.
    pub default_theme: String,

    /// Max size of the markdown source accepted by the export pipeline.
    pub max_markdown_bytes: usize,

    /// Give up on a PDF rendering after this many seconds.
    pub render_timeout_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_theme: "solarized-light".into(),
            max_markdown_bytes: 10 * 1024 * 1024,
            render_timeout_secs: 60,
        }
    }
}

impl ExportConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Path to the Chrome/Chromium executable.
    ///
    /// Falls back to the `CHROME` environment variable, then to auto-detection.
    pub executable_path: Option<PathBuf>,

    /// The browser is torn down by the driver after being idle for this long, the
    /// next export relaunches it.
    pub idle_timeout_secs: u64,

    /// Extra command line switches passed to the browser.
    pub extra_args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executable_path: None,
            idle_timeout_secs: 60 * 60,
            extra_args: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn executable_path(&self) -> Option<PathBuf> {
        self.executable_path
            .clone()
            .or_else(|| std::env::var_os("CHROME").map(PathBuf::from))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Log configuration.
    pub log: LogConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Live preview configuration.
    pub preview: PreviewConfig,

    /// PDF export configuration.
    pub export: ExportConfig,

    /// Headless browser configuration.
    pub engine: EngineConfig,
}
