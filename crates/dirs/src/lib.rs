use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

pub struct Dirs;

impl Dirs {
    /// Project directory for mdpress.
    ///
    /// Config, persisted UI state and logs all live under it.
    pub fn project() -> &'static ProjectDirs {
        static CELL: OnceLock<ProjectDirs> = OnceLock::new();

        CELL.get_or_init(|| {
            ProjectDirs::from("org", "mdpress", "mdpress")
                .expect("Couldn't create project directory for mdpress")
        })
    }

    /// Default location of `config.toml`.
    ///
    /// Linux: ~/.config/mdpress/config.toml
    /// macOS: ~/Library/Application Support/org.mdpress.mdpress/config.toml
    pub fn config_file() -> PathBuf {
        Self::project().config_dir().join("config.toml")
    }

    /// Data directory for client-side state such as the UI theme, created on demand.
    pub fn state_dir() -> std::io::Result<PathBuf> {
        let data_dir = Self::project().data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.to_path_buf())
    }
}
