//! Markdown to HTML rendering.
//!
//! The renderer is a pure transformation on top of [`pulldown_cmark`] with:
//! - GitHub Flavored Markdown (tables, strikethrough, task lists, footnotes, bare URL autolinks)
//! - soft line breaks rendered as `<br />`, matching what the user typed
//! - class-based syntax highlighting of fenced code blocks
//! - raw HTML passthrough, so embedded `<img>` and friends survive
//!
//! Rendering never fails: anything the parser does not understand ends up as escaped text.

mod autolink;
mod highlight;
mod markdown_renderer;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use pulldown_cmark_escape::escape_href;

pub use highlight::{highlight_code, highlight_stylesheet, HIGHLIGHT_CLASS_PREFIX};
pub use markdown_renderer::{MarkdownRenderer, TextRenderer};

/// How single newlines inside a paragraph are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineBreaks {
    /// CommonMark behaviour, soft breaks are folded into the paragraph.
    Folded,
    /// Every newline becomes a `<br />`.
    #[default]
    Hard,
}

/// How fenced code blocks are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CodeHighlight {
    /// Escaped code without any markup.
    Off,
    /// Tokens wrapped in `<span class="hl-...">`, colored by [`highlight_stylesheet`].
    #[default]
    Classed,
}

/// What to do with raw HTML found in the markdown source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RawHtml {
    /// Emit it verbatim.
    #[default]
    Passthrough,
    /// Emit it as escaped text.
    Escape,
}

/// GitHub Flavored Markdown extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GfmExtensions {
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub footnotes: bool,
    /// Turn bare `http(s)://` and `www.` URLs into links.
    pub autolinks: bool,
}

impl GfmExtensions {
    pub const ALL: Self = Self {
        tables: true,
        strikethrough: true,
        tasklists: true,
        footnotes: true,
        autolinks: true,
    };

    pub const NONE: Self = Self {
        tables: false,
        strikethrough: false,
        tasklists: false,
        footnotes: false,
        autolinks: false,
    };
}

impl Default for GfmExtensions {
    fn default() -> Self {
        Self::ALL
    }
}

/// Options for rendering markdown to HTML.
///
/// Every knob is an enumerated value so that an options value is always a valid
/// configuration of the parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub line_breaks: LineBreaks,
    pub gfm: GfmExtensions,
    pub code_highlight: CodeHighlight,
    pub raw_html: RawHtml,
}

impl RenderOptions {
    /// Options used by the live preview and the PDF export.
    pub fn gfm() -> Self {
        Self::default()
    }

    /// Plain CommonMark, no highlighting, raw HTML escaped.
    pub fn commonmark() -> Self {
        Self {
            line_breaks: LineBreaks::Folded,
            gfm: GfmExtensions::NONE,
            code_highlight: CodeHighlight::Off,
            raw_html: RawHtml::Escape,
        }
    }

    fn to_pulldown_options(self) -> Options {
        let mut options = Options::empty();
        if self.gfm.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.gfm.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.gfm.tasklists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        if self.gfm.footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        options
    }
}

/// Escapes the characters that are significant in HTML text and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Fenced code block being collected.
struct PendingCodeBlock {
    lang: Option<String>,
    code: String,
}

/// Image being collected, the alt text is spread over the inner events.
struct PendingImage {
    dest_url: String,
    title: String,
    alt: String,
}

/// Render markdown content to HTML.
///
/// # Example
///
/// ```
/// use mdpress_core::render::{to_html, RenderOptions};
///
/// let html = to_html("**bold**", &RenderOptions::gfm());
/// assert_eq!(html, "<p><strong>bold</strong></p>\n");
/// ```
pub fn to_html(markdown_content: &str, options: &RenderOptions) -> String {
    let parser = Parser::new_ext(markdown_content, options.to_pulldown_options());

    let mut processed_events: Vec<Event> = Vec::new();
    let mut pending_text = String::new();
    let mut code_block: Option<PendingCodeBlock> = None;
    let mut image: Option<PendingImage> = None;
    let mut link_depth = 0usize;

    for event in parser {
        if let Some(block) = code_block.as_mut() {
            match event {
                Event::Text(text) => block.code.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = code_block.take() {
                        processed_events.push(Event::Html(CowStr::from(render_code_block(
                            &block,
                            options.code_highlight,
                        ))));
                    }
                }
                _ => {}
            }
            continue;
        }

        if let Some(img) = image.as_mut() {
            match event {
                Event::Text(text) | Event::Code(text) => img.alt.push_str(&text),
                Event::SoftBreak | Event::HardBreak => img.alt.push(' '),
                Event::End(TagEnd::Image) => {
                    if let Some(img) = image.take() {
                        processed_events.push(Event::InlineHtml(CowStr::from(render_image(&img))));
                    }
                }
                _ => {}
            }
            continue;
        }

        if let Event::Text(text) = &event {
            pending_text.push_str(text);
            continue;
        }

        flush_text(
            &mut pending_text,
            &mut processed_events,
            options.gfm.autolinks && link_depth == 0,
        );

        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split(|c: char| c.is_whitespace() || c == ',')
                        .next()
                        .filter(|token| !token.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                code_block.replace(PendingCodeBlock {
                    lang,
                    code: String::new(),
                });
            }
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => {
                image.replace(PendingImage {
                    dest_url: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
            }
            Event::Start(Tag::Link { .. }) => {
                link_depth += 1;
                processed_events.push(event);
            }
            Event::End(TagEnd::Link) => {
                link_depth = link_depth.saturating_sub(1);
                processed_events.push(event);
            }
            Event::InlineHtml(html) if options.raw_html == RawHtml::Passthrough => {
                match raw_anchor(&html) {
                    Some(RawAnchor::Open) => link_depth += 1,
                    Some(RawAnchor::Close) => link_depth = link_depth.saturating_sub(1),
                    None => {}
                }
                processed_events.push(Event::InlineHtml(html));
            }
            Event::SoftBreak if options.line_breaks == LineBreaks::Hard => {
                processed_events.push(Event::HardBreak);
            }
            Event::Html(html) | Event::InlineHtml(html) if options.raw_html == RawHtml::Escape => {
                processed_events.push(Event::Text(html));
            }
            event => processed_events.push(event),
        }
    }

    flush_text(
        &mut pending_text,
        &mut processed_events,
        options.gfm.autolinks && link_depth == 0,
    );

    let mut html_output = String::with_capacity(markdown_content.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html_output, processed_events.into_iter());

    html_output
}

enum RawAnchor {
    Open,
    Close,
}

/// Recognizes `<a ...>` and `</a>` written as inline HTML.
fn raw_anchor(html: &str) -> Option<RawAnchor> {
    let tag = html.trim().strip_prefix('<')?;
    let (anchor, name) = match tag.strip_prefix('/') {
        Some(name) => (RawAnchor::Close, name),
        None if tag.ends_with("/>") => return None,
        None => (RawAnchor::Open, tag),
    };

    let mut chars = name.chars();
    let is_a = matches!(chars.next(), Some('a' | 'A'))
        && matches!(chars.next(), None | Some('>' | '/') | Some(' ' | '\t' | '\n' | '\r'));
    is_a.then_some(anchor)
}

/// Emits the merged text, adjacent text events are merged so that autolinking sees whole URLs.
fn flush_text<'a>(pending_text: &mut String, events: &mut Vec<Event<'a>>, autolink: bool) {
    if pending_text.is_empty() {
        return;
    }
    let text = std::mem::take(pending_text);
    if autolink {
        events.extend(autolink::linkify(&text));
    } else {
        events.push(Event::Text(CowStr::from(text)));
    }
}

fn render_code_block(block: &PendingCodeBlock, code_highlight: CodeHighlight) -> String {
    let body = match (&block.lang, code_highlight) {
        (Some(lang), CodeHighlight::Classed) => {
            highlight_code(&block.code, lang).unwrap_or_else(|| escape_html(&block.code))
        }
        _ => escape_html(&block.code),
    };

    match &block.lang {
        Some(lang) => format!(
            "<pre><code class=\"language-{}\">{body}</code></pre>\n",
            escape_html(lang)
        ),
        None => format!("<pre><code>{body}</code></pre>\n"),
    }
}

fn render_image(image: &PendingImage) -> String {
    let title_attr = if image.title.is_empty() {
        String::new()
    } else {
        format!(" title=\"{}\"", escape_html(&image.title))
    };
    let mut src = String::with_capacity(image.dest_url.len());
    if escape_href(&mut src, &image.dest_url).is_err() {
        src = escape_html(&image.dest_url);
    }
    format!(
        "<img src=\"{src}\" alt=\"{}\"{title_attr} style=\"max-width: 100%; height: auto;\">",
        escape_html(&image.alt)
    )
}
