//! Link neutralization: every anchor's visible text becomes `click here`.
//!
//! This is a textual substitution, not an HTML parse. An anchor runs from its
//! opening tag to the first following `</a>`.

use std::sync::LazyLock;

use regex::{Captures, Regex};

pub const LINK_TEXT: &str = "click here";

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<a\s(?:[^>]*?\s)?href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))[^>]*>.*?</a\s*>"#,
    )
    .expect("anchor pattern is valid")
});

/// Replace every `<a href=...>...</a>` with `<a href="...">click here</a>`.
pub fn rewrite_links(html: &str) -> String {
    ANCHOR
        .replace_all(html, |caps: &Captures<'_>| {
            let href = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            format!(r#"<a href="{href}">{LINK_TEXT}</a>"#)
        })
        .into_owned()
}
