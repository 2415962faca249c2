//! Named visual themes of the exported PDF.

use serde::Serialize;

pub const DEFAULT_THEME_ID: &str = "solarized-light";

/// Colors bound to the CSS custom properties of the PDF stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    pub page_background: &'static str,
    pub text: &'static str,
    pub heading: &'static str,
    /// Heading rules, block quote and code block bars.
    pub accent: &'static str,
    pub code_background: &'static str,
    pub code_text: &'static str,
    pub border: &'static str,
    pub link: &'static str,
    pub table_stripe: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfTheme {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// syntect theme coloring the code blocks, `None` leaves them in the code text color.
    pub highlight: Option<&'static str>,
    pub colors: ThemeColors,
}

/// Entry of the public theme listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeSummary {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

impl PdfTheme {
    pub fn summary(&self) -> ThemeSummary {
        ThemeSummary {
            id: self.id,
            name: self.name,
            description: self.description,
        }
    }

    /// `:root` rule declaring the theme colors as CSS custom properties.
    pub fn css_variables(&self) -> String {
        let c = &self.colors;
        let bindings = [
            ("page-bg", c.page_background),
            ("text", c.text),
            ("heading", c.heading),
            ("accent", c.accent),
            ("code-bg", c.code_background),
            ("code-text", c.code_text),
            ("border", c.border),
            ("link", c.link),
            ("table-stripe", c.table_stripe),
        ];

        let mut css = String::from(":root {\n");
        for (name, value) in bindings {
            css.push_str(&format!("  --{name}: {value};\n"));
        }
        css.push('}');
        css
    }

    pub fn highlight_theme(&self) -> Option<&'static str> {
        self.highlight
    }
}

static THEMES: [PdfTheme; 4] = [
    PdfTheme {
        id: "solarized-light",
        name: "Solarized Light",
        description: "Warm cream background with Solarized accents",
        highlight: Some("Solarized (light)"),
        colors: ThemeColors {
            page_background: "#fdf6e3",
            text: "#657b83",
            heading: "#586e75",
            accent: "#2aa198",
            code_background: "#eee8d5",
            code_text: "#cb4b16",
            border: "#93a1a1",
            link: "#268bd2",
            table_stripe: "rgba(238, 232, 213, 0.3)",
        },
    },
    PdfTheme {
        id: "solarized-dark",
        name: "Solarized Dark",
        description: "Deep blue-green background for screen reading",
        highlight: Some("Solarized (dark)"),
        colors: ThemeColors {
            page_background: "#002b36",
            text: "#839496",
            heading: "#93a1a1",
            accent: "#2aa198",
            code_background: "#073642",
            code_text: "#cb4b16",
            border: "#586e75",
            link: "#268bd2",
            table_stripe: "rgba(7, 54, 66, 0.5)",
        },
    },
    PdfTheme {
        id: "printer",
        name: "Printer Friendly",
        description: "Black and white, optimized for printing",
        highlight: None,
        colors: ThemeColors {
            page_background: "#ffffff",
            text: "#000000",
            heading: "#000000",
            accent: "#000000",
            code_background: "#f5f5f5",
            code_text: "#000000",
            border: "#999999",
            link: "#000000",
            table_stripe: "#f2f2f2",
        },
    },
    PdfTheme {
        id: "github",
        name: "GitHub",
        description: "Plain white page with blue accents",
        highlight: Some("InspiredGitHub"),
        colors: ThemeColors {
            page_background: "#ffffff",
            text: "#24292f",
            heading: "#1f2328",
            accent: "#0969da",
            code_background: "#f6f8fa",
            code_text: "#cf222e",
            border: "#d0d7de",
            link: "#0969da",
            table_stripe: "#f6f8fa",
        },
    },
];

/// All themes, in a stable order.
pub fn list() -> &'static [PdfTheme] {
    &THEMES
}

pub fn default_theme() -> &'static PdfTheme {
    &THEMES[0]
}

/// Looks up a theme by id, falling back to the default theme for unknown ids.
pub fn resolve(id: &str) -> &'static PdfTheme {
    find(id).unwrap_or_else(default_theme)
}

pub fn find(id: &str) -> Option<&'static PdfTheme> {
    THEMES.iter().find(|theme| theme.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_unknown_id_yields_default() {
        assert_eq!(resolve("no-such-theme"), resolve(DEFAULT_THEME_ID));
        assert_eq!(resolve(""), default_theme());
        assert_eq!(default_theme().id, DEFAULT_THEME_ID);
    }

    #[test]
    fn test_list_is_stable() {
        let ids: Vec<_> = list().iter().map(|t| t.id).collect();
        assert_eq!(
            ids,
            ["solarized-light", "solarized-dark", "printer", "github"]
        );
        for theme in list() {
            assert_eq!(resolve(theme.id), theme);
        }
    }

    #[test]
    fn test_css_variables() {
        let css = resolve("printer").css_variables();
        assert!(css.starts_with(":root {"));
        assert!(css.contains("--page-bg: #ffffff;"));
        assert!(css.contains("--table-stripe: #f2f2f2;"));
    }

    #[test]
    fn test_highlight_theme() {
        assert_eq!(
            resolve("solarized-dark").highlight_theme(),
            Some("Solarized (dark)")
        );
        assert_eq!(
            resolve("solarized-light").highlight_theme(),
            Some("Solarized (light)")
        );
        assert_eq!(resolve("printer").highlight_theme(), None);
    }
}
