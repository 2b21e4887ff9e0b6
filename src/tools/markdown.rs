//! Minimal HTML to markdown conversion for fetched pages
//!
//! Regex based. Good enough to hand a page to the model, not a full HTML parser.

use regex::{Captures, Regex};
use std::sync::LazyLock;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("markdown patterns are valid")
}

static TAG: LazyLock<Regex> = LazyLock::new(|| re(r"<[^>]*>"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| re(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);"));
static DROPPED_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "head", "noscript", "svg", "iframe"]
        .iter()
        .map(|tag| re(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")))
        .collect()
});
static COMMENT: LazyLock<Regex> = LazyLock::new(|| re(r"(?s)<!--.*?-->"));
static PRE: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<pre\b[^>]*>(.*?)</pre\s*>"));
static HEADING: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| re(r#"(?is)<a\b[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#));
static STRONG: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?is)<(?:strong|b)\b[^>]*>(.*?)</(?:strong|b)\s*>"));
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<(?:em|i)\b[^>]*>(.*?)</(?:em|i)\s*>"));
static CODE: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<code\b[^>]*>(.*?)</code\s*>"));
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<li\b[^>]*>(.*?)</li\s*>"));
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)<br\s*/?>"));
static BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)</?(?:p|div|ul|ol|section|article|main|header|footer|nav|table|tr|blockquote|hr)\b[^>]*>")
});
static SPACES: LazyLock<Regex> = LazyLock::new(|| re(r"[ \t\x{a0}]+"));
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| re(r"\n{3,}"));
static CODE_MARKER: LazyLock<Regex> = LazyLock::new(|| re(r"\x00(\d+)\x00"));

/// Remove all tags and decode entities, keeping only text
fn strip_tags(html: &str) -> String {
    decode_entities(&TAG.replace_all(html, ""))
}

/// Decode named and numeric character references
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    "mdash" => Some('\u{2014}'),
                    "ndash" => Some('\u{2013}'),
                    "hellip" => Some('\u{2026}'),
                    "copy" => Some('\u{a9}'),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Convert an HTML document to markdown
pub fn html_to_markdown(html: &str) -> String {
    let mut text = html.to_string();

    for block in DROPPED_BLOCKS.iter() {
        text = block.replace_all(&text, "").into_owned();
    }
    text = COMMENT.replace_all(&text, "").into_owned();

    // Preformatted blocks keep their whitespace, so park them until the end
    let mut code_blocks = Vec::new();
    text = PRE
        .replace_all(&text, |caps: &Captures| {
            code_blocks.push(strip_tags(&caps[1]).trim_matches('\n').to_string());
            format!("\n\n\u{0}{}\u{0}\n\n", code_blocks.len() - 1)
        })
        .into_owned();

    text = HEADING
        .replace_all(&text, |caps: &Captures| {
            let level: usize = caps[1].parse().unwrap_or(1);
            let title = TAG.replace_all(&caps[2], "");
            format!("\n\n{} {}\n\n", "#".repeat(level), title.trim())
        })
        .into_owned();

    text = LINK
        .replace_all(&text, |caps: &Captures| {
            let label = TAG.replace_all(&caps[2], "");
            let label = label.trim();
            if label.is_empty() {
                String::new()
            } else {
                format!("[{}]({})", label, &caps[1])
            }
        })
        .into_owned();

    text = STRONG.replace_all(&text, "**$1**").into_owned();
    text = EMPHASIS.replace_all(&text, "*$1*").into_owned();
    text = CODE.replace_all(&text, "`$1`").into_owned();
    text = LIST_ITEM
        .replace_all(&text, |caps: &Captures| format!("\n- {}\n", caps[1].trim()))
        .into_owned();
    text = LINE_BREAK.replace_all(&text, "\n").into_owned();
    text = BLOCK.replace_all(&text, "\n\n").into_owned();

    text = strip_tags(&text);

    // Tidy whitespace line by line, then squeeze blank runs
    let lines: Vec<String> = text
        .lines()
        .map(|line| SPACES.replace_all(line, " ").trim().to_string())
        .collect();
    let text = BLANK_RUN.replace_all(&lines.join("\n"), "\n\n").trim().to_string();

    CODE_MARKER
        .replace_all(&text, |caps: &Captures| {
            let index: usize = caps[1].parse().unwrap_or(usize::MAX);
            code_blocks
                .get(index)
                .map(|code| format!("```\n{}\n```", code))
                .unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_and_paragraph() {
        let md = html_to_markdown(
            "<html><body><h1>Test Title</h1><p>Test content</p></body></html>",
        );
        assert_eq!(md, "# Test Title\n\nTest content");
    }

    #[test]
    fn test_scripts_and_styles_removed() {
        let md = html_to_markdown(
            "<head><title>x</title></head><script>alert(1)</script><style>p{}</style><p>kept</p>",
        );
        assert_eq!(md, "kept");
    }

    #[test]
    fn test_links_lists_and_emphasis() {
        let md = html_to_markdown(
            r#"<ul><li><a href="https://a.example">First</a></li><li><b>Second</b> and <em>more</em></li></ul>"#,
        );
        assert_eq!(md, "- [First](https://a.example)\n\n- **Second** and *more*");
    }

    #[test]
    fn test_code_keeps_indentation() {
        let md = html_to_markdown("<p>Run:</p><pre>fn main() {\n    go();\n}</pre>");
        assert_eq!(md, "Run:\n\n```\nfn main() {\n    go();\n}\n```");
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#65;&#x42; &bogus;"), "a & b <c> AB &bogus;");
        assert_eq!(html_to_markdown("<p>&lt;b&gt; is bold</p>"), "<b> is bold");
    }

    #[test]
    fn test_repeated_conversions_agree() {
        let html = "<h2>Again</h2><p>same &amp; same</p>";
        assert_eq!(html_to_markdown(html), html_to_markdown(html));
        assert_eq!(html_to_markdown(html), "## Again\n\nsame & same");
    }
}
