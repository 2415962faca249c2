//! Code block highlighting backed by syntect's bundled syntaxes.
//!
//! The output only carries CSS classes, the colors come from the stylesheet returned by
//! [`highlight_stylesheet`] so the same HTML can be re-themed without re-rendering.

use once_cell::sync::Lazy;
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Prefix of every class emitted by the highlighter.
pub const HIGHLIGHT_CLASS_PREFIX: &str = "hl-";

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed {
    prefix: HIGHLIGHT_CLASS_PREFIX,
};

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Highlights `code` as the language named by the fence token `lang`.
///
/// Returns `None` if the language is unknown, the caller is expected to fall back to
/// the escaped code.
pub fn highlight_code(code: &str, lang: &str) -> Option<String> {
    let syntax = SYNTAX_SET.find_syntax_by_token(lang)?;

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, CLASS_STYLE);

    for line in LinesWithEndings::from(code) {
        if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::debug!(?err, lang, "Failed to highlight code block");
            return None;
        }
    }

    Some(generator.finalize())
}

/// Returns the stylesheet coloring the highlighted tokens with the named syntect theme.
///
/// An unknown theme yields an empty stylesheet, the code stays readable uncolored.
pub fn highlight_stylesheet(theme_name: &str) -> String {
    let Some(theme) = THEME_SET.themes.get(theme_name) else {
        tracing::warn!(theme_name, "Unknown highlight theme");
        return String::new();
    };

    match css_for_theme_with_class_style(theme, CLASS_STYLE) {
        Ok(css) => css,
        Err(err) => {
            tracing::warn!(?err, theme_name, "Failed to generate highlight stylesheet");
            String::new()
        }
    }
}
