//! List-row preview derivation.
//!
//! Rules:
//! - markdown images are dropped, links keep their label;
//! - markdown symbols are removed and whitespace collapsed;
//! - the first 100 chars are kept; empty results yield `None`.

use once_cell::sync::Lazy;
use regex::Regex;

const PREVIEW_MAX_CHARS: usize = 100;

static IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*]\([^)]*\)").expect("valid image regex"));
static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("valid link regex"));
static SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\*_`#>~\[\]]+").expect("valid symbol regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Plain-text preview of note content for list display.
pub fn derive_preview(content: &str) -> Option<String> {
    let without_images = IMAGE_RE.replace_all(content, " ");
    let without_links = LINK_RE.replace_all(&without_images, "$1");
    let without_symbols = SYMBOL_RE.replace_all(&without_links, " ");
    let collapsed = WHITESPACE_RE.replace_all(&without_symbols, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut preview: String = trimmed.chars().take(PREVIEW_MAX_CHARS).collect();
    if trimmed.chars().count() > PREVIEW_MAX_CHARS {
        preview.push('…');
    }
    Some(preview)
}
