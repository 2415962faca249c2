//! Bare URL autolinking, the GFM "extended autolink" extension.

use super::escape_html;
use once_cell::sync::Lazy;
use pulldown_cmark::{CowStr, Event};
use regex::Regex;

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:https?://|www\.)[^\s<]*[^\s<.,:;"'!?)\]*_~]"#).expect("Invalid url regex")
});

/// Splits `text` into plain text and link events.
pub(super) fn linkify<'a>(text: &str) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    let mut last_end = 0;

    for url in URL_REGEX.find_iter(text) {
        // `www.` is only a link at a word boundary.
        if url.start() > 0 && !text[..url.start()].ends_with(|c: char| c.is_whitespace() || c == '(') {
            continue;
        }

        if url.start() > last_end {
            events.push(Event::Text(CowStr::from(text[last_end..url.start()].to_string())));
        }

        let href = if url.as_str().starts_with("www.") {
            format!("http://{}", url.as_str())
        } else {
            url.as_str().to_string()
        };

        events.push(Event::InlineHtml(CowStr::from(format!(
            "<a href=\"{}\">",
            escape_html(&href)
        ))));
        events.push(Event::Text(CowStr::from(url.as_str().to_string())));
        events.push(Event::InlineHtml(CowStr::from("</a>")));

        last_end = url.end();
    }

    if last_end < text.len() {
        events.push(Event::Text(CowStr::from(text[last_end..].to_string())));
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_untouched() {
        let events = linkify("no links here");
        assert_eq!(events, vec![Event::Text("no links here".into())]);
    }

    #[test]
    fn test_trailing_punctuation_is_excluded() {
        let events = linkify("(see http://a.io/x).");
        assert_eq!(events[1], Event::InlineHtml("<a href=\"http://a.io/x\">".into()));
        assert_eq!(events[2], Event::Text("http://a.io/x".into()));
        assert_eq!(events[4], Event::Text(").".into()));
    }

    #[test]
    fn test_embedded_www_is_not_a_link() {
        assert_eq!(linkify("foowww.bar.com").len(), 1);
    }
}
