//! Download name of an exported PDF.

use mdpress_core::document::strip_source_extension;

const FALLBACK_STEM: &str = "document";

fn is_unsafe(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

fn normalize_stem(name: &str) -> Option<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim();
    let stem = strip_source_extension(base);
    let stem = match stem.rsplit_once('.') {
        Some((base, ext)) if ext.eq_ignore_ascii_case("pdf") => base,
        _ => stem,
    }
    .trim();

    if stem.is_empty() {
        return None;
    }

    Some(stem.chars().map(|c| if is_unsafe(c) { '_' } else { c }).collect())
}

/// Picks the download name: the explicit filename, else the title, else `document.pdf`.
///
/// ```
/// use pdf_export::filename::pdf_filename;
///
/// assert_eq!(pdf_filename(Some("notes/Report.MD"), None), "Report.pdf");
/// assert_eq!(pdf_filename(None, Some("Q3: plan")), "Q3_ plan.pdf");
/// assert_eq!(pdf_filename(None, None), "document.pdf");
/// ```
pub fn pdf_filename(filename: Option<&str>, title: Option<&str>) -> String {
    let stem = filename
        .and_then(normalize_stem)
        .or_else(|| title.and_then(normalize_stem))
        .unwrap_or_else(|| FALLBACK_STEM.to_string());
    format!("{stem}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_directories_and_extension() {
        assert_eq!(pdf_filename(Some("../../etc/passwd"), None), "passwd.pdf");
        assert_eq!(pdf_filename(Some("C:\\docs\\draft.markdown"), None), "draft.pdf");
        assert_eq!(pdf_filename(Some("readme.txt"), None), "readme.pdf");
        assert_eq!(pdf_filename(Some("archive.tar.md"), None), "archive.tar.pdf");
        assert_eq!(pdf_filename(Some("already.pdf"), None), "already.pdf");
        assert_eq!(pdf_filename(Some("mixed.Pdf"), None), "mixed.pdf");
        assert_eq!(pdf_filename(None, Some("Slides.PDF")), "Slides.pdf");
    }

    #[test]
    fn test_replaces_unsafe_characters() {
        assert_eq!(
            pdf_filename(Some("a*b?c\"d<e>f|g.md"), None),
            "a_b_c_d_e_f_g.pdf"
        );
        assert_eq!(pdf_filename(Some("line\nbreak"), None), "line_break.pdf");
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(pdf_filename(Some(".md"), Some("Title")), "Title.pdf");
        assert_eq!(pdf_filename(Some("  "), None), "document.pdf");
        assert_eq!(pdf_filename(None, Some("dir/")), "document.pdf");
        assert_eq!(pdf_filename(None, Some("Ünïcode")), "Ünïcode.pdf");
    }
}
