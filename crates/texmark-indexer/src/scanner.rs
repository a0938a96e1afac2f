//! Anchor and outline extraction.
//!
//! Scanning is a pure function of text: it knows nothing about files,
//! buffers or the cache. [`LatexScanner`] is the default implementation.

use crate::types::ScanOutput;
use crate::IndexerError;
use regex::Regex;
use tracing::trace;

/// Extracts anchors and outline entries from file content.
pub trait Scanner {
    fn scan(&self, text: &str) -> ScanOutput;
}

impl<F> Scanner for F
where
    F: Fn(&str) -> ScanOutput,
{
    fn scan(&self, text: &str) -> ScanOutput {
        self(text)
    }
}

/// Sectioning commands and their outline levels.
const SECTION_LEVELS: &[(&str, u8)] = &[
    ("part", 0),
    ("chapter", 1),
    ("section", 2),
    ("subsection", 3),
    ("subsubsection", 4),
    ("paragraph", 5),
    ("subparagraph", 6),
];

/// Scanner for `\label{...}` anchors and sectioning commands.
#[derive(Debug, Clone)]
pub struct LatexScanner {
    label: Regex,
    section: Regex,
}

impl LatexScanner {
    pub fn new() -> Result<Self, IndexerError> {
        let commands = SECTION_LEVELS
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join("|");
        Ok(Self {
            label: Regex::new(r"\\label\s*\{([^}]*)\}")?,
            section: Regex::new(&format!(r"\\({commands})\*?\s*(?:\[[^\]]*\])?\s*\{{"))?,
        })
    }

    fn anchors(&self, text: &str) -> Vec<(String, usize)> {
        self.label
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?.as_str().trim();
                if name.is_empty() || is_commented(text, whole.start()) {
                    return None;
                }
                Some((name.to_string(), whole.start()))
            })
            .collect()
    }

    fn outline(&self, text: &str) -> Vec<(String, u8, usize)> {
        self.section
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                if is_commented(text, whole.start()) {
                    return None;
                }
                let level = level_of(caps.get(1)?.as_str())?;
                let title = balanced_group(&text[whole.end()..])?;
                Some((collapse_whitespace(title), level, whole.start()))
            })
            .collect()
    }
}

impl Scanner for LatexScanner {
    fn scan(&self, text: &str) -> ScanOutput {
        let output = ScanOutput {
            anchors: self.anchors(text),
            outline: self.outline(text),
        };
        trace!(
            anchors = output.anchors.len(),
            outline = output.outline.len(),
            "Scanned content"
        );
        output
    }
}

fn level_of(command: &str) -> Option<u8> {
    SECTION_LEVELS
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, level)| *level)
}

/// Content up to the brace closing an already-opened group.
fn balanced_group(rest: &str) -> Option<&str> {
    let mut depth = 1usize;
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `offset` sits after an unescaped `%` on its line.
pub(crate) fn is_commented(text: &str, offset: usize) -> bool {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let mut escaped = false;
    for b in text[line_start..offset].bytes() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'%' => return true,
            _ => {}
        }
    }
    false
}
