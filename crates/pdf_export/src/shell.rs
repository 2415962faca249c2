//! Full HTML document handed to the browser for printing.

use crate::catalog::PdfTheme;
use mdpress_core::escape_html;
use mdpress_core::render::highlight_stylesheet;

pub const DEFAULT_TITLE: &str = "Document";

const BASE_CSS: &str = r#"
* {
  margin: 0;
  padding: 0;
  box-sizing: border-box;
}

html, body {
  background: var(--page-bg);
}

body {
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
  font-size: 12pt;
  line-height: 1.6;
  color: var(--text);
}

h1, h2, h3, h4, h5, h6 {
  color: var(--heading);
  margin-top: 1.5em;
  margin-bottom: 0.5em;
  font-weight: 600;
  line-height: 1.3;
  page-break-after: avoid;
}

h1 { font-size: 2em; border-bottom: 2px solid var(--accent); padding-bottom: 0.3em; }
h2 { font-size: 1.5em; border-bottom: 1px solid var(--border); padding-bottom: 0.2em; }
h3 { font-size: 1.25em; }
h4 { font-size: 1.1em; }

h1:first-child, h2:first-child {
  margin-top: 0;
}

p, ul, ol, table, pre, blockquote {
  margin-bottom: 1em;
}

a {
  color: var(--link);
  text-decoration: none;
}

strong {
  font-weight: 600;
  color: var(--heading);
}

code {
  font-family: 'SF Mono', 'Fira Code', Monaco, Consolas, monospace;
  font-size: 0.9em;
  background-color: var(--code-bg);
  padding: 0.2em 0.4em;
  border-radius: 3px;
  color: var(--code-text);
}

pre {
  background-color: var(--code-bg);
  padding: 1em;
  border-radius: 6px;
  overflow-x: auto;
  border-left: 4px solid var(--accent);
  page-break-inside: avoid;
}

pre code {
  background: transparent;
  padding: 0;
  color: var(--text);
}

blockquote {
  padding: 0.5em 1em;
  border-left: 4px solid var(--accent);
  background-color: var(--code-bg);
  color: var(--heading);
  font-style: italic;
}

ul, ol {
  padding-left: 2em;
}

li {
  margin-bottom: 0.25em;
}

li input[type="checkbox"] {
  margin-right: 0.4em;
}

table {
  width: 100%;
  border-collapse: collapse;
}

th, td {
  padding: 0.5em 0.75em;
  text-align: left;
  border: 1px solid var(--border);
}

th {
  background-color: var(--code-bg);
  font-weight: 600;
  color: var(--heading);
}

tr:nth-child(even) {
  background-color: var(--table-stripe);
}

hr {
  border: none;
  height: 1px;
  background-color: var(--border);
  margin: 2em 0;
}

img {
  max-width: 100%;
  height: auto;
}

@media print {
  pre, code {
    white-space: pre-wrap;
    word-wrap: break-word;
  }
}
"#;

/// Wraps an HTML fragment in a document styled by `theme`.
pub fn document_shell(fragment: &str, theme: &PdfTheme, title: Option<&str>) -> String {
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>{title}</title>
<style>
{variables}
{base}
{highlight}
</style>
</head>
<body class="pdf-theme-{id}">
{fragment}
</body>
</html>
"#,
        title = escape_html(title),
        variables = theme.css_variables(),
        base = BASE_CSS,
        highlight = theme
            .highlight_theme()
            .map(highlight_stylesheet)
            .unwrap_or_default(),
        id = theme.id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::resolve;

    #[test]
    fn test_document_shell() {
        let html = document_shell("<p>hi</p>", resolve("solarized-dark"), Some("A & B"));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains("--page-bg: #002b36;"));
        assert!(html.contains("<p>hi</p>"));
        assert!(html.contains("white-space: pre-wrap"));
        assert!(html.contains(".hl-"));
    }

    #[test]
    fn test_default_title() {
        let theme = resolve("printer");
        assert!(document_shell("", theme, None).contains("<title>Document</title>"));
        assert!(document_shell("", theme, Some("  ")).contains("<title>Document</title>"));
    }

    #[test]
    fn test_printer_has_no_color_palette() {
        let html = document_shell(
            "<pre><code><span class=\"hl-keyword\">fn</span></code></pre>",
            resolve("printer"),
            None,
        );
        assert!(!html.contains(".hl-"));
        assert!(html.contains("--code-text: #000000;"));
    }
}
