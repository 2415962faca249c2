use anyhow::Result;
use clap::Parser;
use mdpress_core::{Document, MarkdownRenderer, TextRenderer};
use std::io::Write;
use std::path::PathBuf;

/// Renders a markdown file to an HTML fragment.
#[derive(Parser, Debug, Clone)]
pub struct Render {
    /// Markdown file (.md, .markdown or .txt).
    file: PathBuf,

    /// Write the HTML to this file instead of stdout.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Print the document statistics to stderr.
    #[clap(long)]
    stats: bool,
}

impl Render {
    pub fn run(&self) -> Result<()> {
        let document = Document::load(&self.file)?;
        let renderer = MarkdownRenderer::default();
        let html = renderer.render_text(document.text());

        match &self.output {
            Some(output) => std::fs::write(output, &html)?,
            None => std::io::stdout().lock().write_all(html.as_bytes())?,
        }

        if self.stats {
            eprintln!("{}", document.stats().summary());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.md");
        let output = dir.path().join("doc.html");
        std::fs::write(&input, "*hi*").unwrap();

        Render {
            file: input,
            output: Some(output.clone()),
            stats: false,
        }
        .run()
        .unwrap();

        assert_eq!(std::fs::read_to_string(output).unwrap(), "<p><em>hi</em></p>\n");
    }
}
