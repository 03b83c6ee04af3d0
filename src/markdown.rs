//! Markdown structure extraction: headings, images, links, tables, and code fences.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{CodeBlock, Heading, Image, Link, ParsedMarkdownStructure};

/// Maximum characters of a code block body kept as preview.
pub const CODE_PREVIEW_CHARS: usize = 180;

/// Compile a hardcoded pattern.
///
/// # Panics
///
/// Panics if the pattern is invalid (compile-time invariant).
#[allow(clippy::expect_used, reason = "hardcoded patterns are compile-time invariants")]
fn pattern(re: &str) -> Regex {
    return Regex::new(re).expect("valid regex");
}

/// ATX heading on a single line.
static HEADING: LazyLock<Regex> = LazyLock::new(|| return pattern(r"^(#{1,6})\s+(.*?)\s*$"));

/// `![alt](url)`.
static IMAGE: LazyLock<Regex> = LazyLock::new(|| return pattern(r"!\[(.*?)\]\((.*?)\)"));

/// `[text](url)`; matches preceded by `!` are images and are skipped.
static LINK: LazyLock<Regex> = LazyLock::new(|| return pattern(r"\[(.*?)\]\((.*?)\)"));

/// Triple-backtick fence with optional language tag.
static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| return pattern(r"(?s)```([a-zA-Z0-9_-]*)\r?\n(.*?)```"));

/// Table delimiter row such as `| --- | :---: |`.
static TABLE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    return pattern(r"^\|?\s*:?-{3,}:?\s*(\|\s*:?-{3,}:?\s*)+\|?$");
});

/// Extract the accessibility-relevant structure of a markdown document.
/// Pure: the same text always yields the same structure.
pub fn extract(markdown_text: &str) -> ParsedMarkdownStructure {
    return ParsedMarkdownStructure {
        code_blocks: extract_code_blocks(markdown_text),
        headings: extract_headings(markdown_text),
        images: extract_images(markdown_text),
        links: extract_links(markdown_text),
        tables: extract_tables(markdown_text),
    };
}

/// Capture group `i` as trimmed text, empty when it did not participate.
fn group(caps: &regex::Captures<'_>, i: usize) -> String {
    return caps.get(i).map_or_else(String::new, |m| m.as_str().trim().to_string());
}

fn extract_headings(text: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    for line in text.lines() {
        let Some(caps) = HEADING.captures(line) else {
            continue;
        };
        let level = caps.get(1).map_or(0, |m| m.as_str().len());
        let Ok(level) = u8::try_from(level) else {
            continue;
        };
        headings.push(Heading { level, text: group(&caps, 2) });
    }
    return headings;
}

fn extract_images(text: &str) -> Vec<Image> {
    return IMAGE
        .captures_iter(text)
        .map(|caps| Image { alt: group(&caps, 1), url: group(&caps, 2) })
        .collect();
}

fn extract_links(text: &str) -> Vec<Link> {
    let mut links = Vec::new();
    let mut start = 0;
    while let Some(caps) = LINK.captures_at(text, start) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        let preceded_by_bang = text
            .get(..whole.start())
            .is_some_and(|before| before.ends_with('!'));
        if preceded_by_bang {
            // Resume just past this `[` so a link nested in the image text is still found.
            start = whole.start().saturating_add(1);
            continue;
        }
        links.push(Link { text: group(&caps, 1), url: group(&caps, 2) });
        start = whole.end();
    }
    return links;
}

fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    return CODE_BLOCK
        .captures_iter(text)
        .map(|caps| {
            let language = group(&caps, 1);
            let body = group(&caps, 2);
            CodeBlock {
                has_language_tag: !language.is_empty(),
                language,
                preview: body.chars().take(CODE_PREVIEW_CHARS).collect(),
            }
        })
        .collect();
}

/// Collect pipe tables: a piped line directly above a delimiter row, then every
/// contiguous piped line below it.
fn extract_tables(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut tables = Vec::new();
    let mut i = 0_usize;

    while let (Some(header), Some(separator)) = (lines.get(i), lines.get(i.saturating_add(1))) {
        if !header.contains('|') || !is_table_separator(separator) {
            i = i.saturating_add(1);
            continue;
        }

        let mut block = vec![*header, *separator];
        i = i.saturating_add(2);
        while let Some(row) = lines.get(i).filter(|l| l.trim().contains('|')) {
            block.push(*row);
            i = i.saturating_add(1);
        }
        tables.push(block.join("\n"));
    }

    return tables;
}

/// Whether a line is a markdown table delimiter row.
fn is_table_separator(line: &str) -> bool {
    let stripped = line.trim();
    return stripped.contains('|') && TABLE_SEPARATOR.is_match(stripped);
}
