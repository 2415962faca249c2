use anyhow::Result;
use clap::{Parser, Subcommand};
use mdpress_core::{FileThemeStore, ThemeManager, UiTheme};
use std::sync::Arc;

/// Show or change the UI theme used by the preview.
#[derive(Subcommand, Debug, Clone)]
pub enum Theme {
    /// Print the current theme.
    Show,
    /// Switch to the given theme.
    Set(Set),
    /// Switch between light and dark.
    Toggle,
}

#[derive(Parser, Debug, Clone)]
pub struct Set {
    /// `light` or `dark`.
    theme: UiTheme,
}

fn describe(theme: UiTheme) -> String {
    format!(
        "{} {theme} (class: {}, highlight: {})",
        theme.toggled().toggle_icon(),
        theme.css_class(),
        theme.highlight_theme()
    )
}

impl Theme {
    pub fn run(&self) -> Result<()> {
        let manager = ThemeManager::new(Arc::new(FileThemeStore::in_state_dir()?));

        match self {
            Self::Show => {}
            Self::Set(set) => {
                if !manager.set_theme(set.theme)? {
                    println!("Theme unchanged");
                }
            }
            Self::Toggle => {
                manager.toggle()?;
            }
        }

        println!("{}", describe(manager.theme()));

        Ok(())
    }
}
