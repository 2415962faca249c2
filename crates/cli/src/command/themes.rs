use anyhow::Result;
use clap::Parser;
use mdpress_config::Config;
use pdf_export::catalog;
use std::io::Write;

/// Lists the themes available to the PDF export.
#[derive(Parser, Debug, Clone)]
pub struct Themes;

impl Themes {
    pub fn run(&self, config: &Config) -> Result<()> {
        let default = catalog::resolve(&config.export.default_theme);
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();

        for theme in catalog::list() {
            let marker = if theme.id == default.id { "*" } else { " " };
            writeln!(
                lock,
                "{marker} {:<16} {:<18} {}",
                theme.id, theme.name, theme.description
            )?;
        }

        Ok(())
    }
}
