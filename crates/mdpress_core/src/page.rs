//! Standalone HTML page wrapping a rendered preview.

use crate::render::escape_html;
use crate::scheduler::RenderedPreview;
use crate::theme::UiTheme;

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>__TITLE__</title>
<style>
/*__PAGE_CSS__*/
/*__HIGHLIGHT_CSS__*/
</style>
</head>
<body class="__THEME_CLASS__">
<main class="preview">
__CONTENT__
</main>
<footer class="stats">__STATS__</footer>
</body>
</html>
"#;

const PAGE_CSS: &str = r#"body.solarized-light { --bg: #fdf6e3; --bg-alt: #eee8d5; --fg: #657b83; --heading: #586e75; --accent: #268bd2; --border: #93a1a1; }
body.solarized-dark { --bg: #002b36; --bg-alt: #073642; --fg: #839496; --heading: #93a1a1; --accent: #268bd2; --border: #586e75; }
body { margin: 0; background: var(--bg); color: var(--fg); font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif; line-height: 1.6; }
.preview { max-width: 860px; margin: 0 auto; padding: 2rem; }
h1, h2, h3, h4, h5, h6 { color: var(--heading); }
a { color: var(--accent); }
pre { background: var(--bg-alt); padding: 1rem; border-radius: 4px; overflow-x: auto; }
code { font-family: "SF Mono", Monaco, Consolas, monospace; }
blockquote { border-left: 4px solid var(--border); margin: 0; padding-left: 1rem; }
table { border-collapse: collapse; }
th, td { border: 1px solid var(--border); padding: 0.4rem 0.8rem; }
.stats { position: fixed; bottom: 0; right: 0; padding: 0.3rem 0.8rem; background: var(--bg-alt); font-size: 0.8rem; }"#;

/// Builds a self-contained page showing `preview`.
///
/// `highlight_css` is the stylesheet of the code highlight palette matching the
/// preview theme, see [`crate::render::highlight_stylesheet`].
pub fn preview_page(title: &str, preview: &RenderedPreview, highlight_css: &str) -> String {
    page(title, &preview.html, preview.theme, highlight_css, &preview.stats.summary())
}

fn page(title: &str, content: &str, theme: UiTheme, highlight_css: &str, stats: &str) -> String {
    PAGE_TEMPLATE
        .replace("/*__PAGE_CSS__*/", PAGE_CSS)
        .replace("/*__HIGHLIGHT_CSS__*/", highlight_css)
        .replace("__THEME_CLASS__", theme.css_class())
        .replace("__TITLE__", &escape_html(title))
        .replace("__STATS__", &escape_html(stats))
        .replace("__CONTENT__", content)
}
