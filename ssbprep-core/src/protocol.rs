//! Labeled-block text protocol for free-text AI answers.
//!
//! Some prompts ask the model for plain text laid out as repeated blocks:
//!
//! ```text
//! TITLE: India hosts joint naval exercise
//! CATEGORY: Defence
//! SUMMARY: The navy conducted a week-long exercise with ...
//!   which continues on this line.
//! ---
//! TITLE: ...
//! ```
//!
//! A [`BlockGrammar`] names the delimiter and the expected labels, marking each as
//! required or optional. [`parse_blocks`] splits the text and validates every block
//! against the grammar, independently of whatever call produced the text. Blocks that
//! miss a required label are returned in `rejected` with a reason rather than
//! silently turning into half-empty records.
//!
//! Parsing is deliberately lenient about what models tend to add around labels:
//! markdown bold (`**TITLE:**`), list bullets, numbering, and mixed case.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// One label the grammar knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Upper-case label as it appears before the colon.
    pub label: &'static str,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(label: &'static str) -> Self {
        Self { label, required: true }
    }

    pub const fn optional(label: &'static str) -> Self {
        Self { label, required: false }
    }
}

/// Versioned description of a block layout.
#[derive(Debug, Clone, Copy)]
pub struct BlockGrammar {
    /// Bumped whenever labels or delimiter change so cached text can be told apart.
    pub version: u32,
    /// A line consisting only of this string (after trimming) ends a block.
    pub delimiter: &'static str,
    pub fields: &'static [FieldSpec],
}

impl BlockGrammar {
    fn field(&self, label: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.label == label)
    }
}

/// A block that satisfied every required label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: BTreeMap<&'static str, String>,
}

impl Record {
    /// Returns the trimmed value of `label`, if present and non-empty.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields.get(label).map(String::as_str)
    }

    /// Returns the value of a label the grammar marks as required.
    ///
    /// Records only exist once validation passed, so a required label is always
    /// present; an empty string is returned for labels outside the grammar.
    pub fn required(&self, label: &str) -> &str {
        self.get(label).unwrap_or_default()
    }
}

/// A block that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedBlock {
    /// Zero-based position among the non-empty blocks of the input.
    pub index: usize,
    pub reason: String,
}

/// Output of [`parse_blocks`].
#[derive(Debug, Clone, Default)]
pub struct ParsedBlocks {
    pub records: Vec<Record>,
    pub rejected: Vec<RejectedBlock>,
}

static LABEL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:[-*•]\s+|\d+[.)]\s+)?\**\s*([A-Za-z][A-Za-z _]*?)\s*\**\s*:\s*\**\s*(.*)$",
    )
    .expect("label pattern is valid")
});

/// Splits `text` into blocks and validates each against `grammar`.
pub fn parse_blocks(grammar: &BlockGrammar, text: &str) -> ParsedBlocks {
    let mut parsed = ParsedBlocks::default();
    for (index, block) in split_blocks(grammar.delimiter, text).into_iter().enumerate() {
        match parse_one(grammar, &block) {
            Ok(record) => parsed.records.push(record),
            Err(reason) => parsed.rejected.push(RejectedBlock { index, reason }),
        }
    }
    parsed
}

fn split_blocks<'a>(delimiter: &str, text: &'a str) -> Vec<Vec<&'a str>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim() == delimiter {
            if current.iter().any(|l| !l.trim().is_empty()) {
                blocks.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if current.iter().any(|l| !l.trim().is_empty()) {
        blocks.push(current);
    }
    blocks
}

fn parse_one(grammar: &BlockGrammar, lines: &[&str]) -> Result<Record, String> {
    let mut fields: BTreeMap<&'static str, String> = BTreeMap::new();
    // Label that continuation lines append to; None after an unknown label.
    let mut open: Option<&'static str> = None;

    for line in lines {
        if let Some(caps) = LABEL_LINE.captures(line) {
            let raw = caps[1].trim();
            let label = raw.to_ascii_uppercase().replace(' ', "_");
            if let Some(spec) = grammar.field(&label) {
                let value = caps[2].trim().trim_end_matches("**").trim().to_owned();
                fields.insert(spec.label, value);
                open = Some(spec.label);
                continue;
            }
            // An upper-case label outside the grammar is ignored, and it closes the
            // previous field so its text does not leak into it.
            if !raw.chars().any(|c| c.is_ascii_lowercase()) {
                open = None;
                continue;
            }
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(label) = open {
            let entry = fields.entry(label).or_default();
            if !entry.is_empty() {
                entry.push(' ');
            }
            entry.push_str(trimmed);
        }
    }

    fields.retain(|_, v| !v.trim().is_empty());
    let missing: Vec<&str> = grammar
        .fields
        .iter()
        .filter(|f| f.required && !fields.contains_key(f.label))
        .map(|f| f.label)
        .collect();
    if missing.is_empty() {
        Ok(Record { fields })
    } else {
        Err(format!("missing required field(s): {}", missing.join(", ")))
    }
}

/// Strips a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAMMAR: BlockGrammar = BlockGrammar {
        version: 1,
        delimiter: "---",
        fields: &[
            FieldSpec::required("TITLE"),
            FieldSpec::required("SUMMARY"),
            FieldSpec::optional("RELEVANCE"),
        ],
    };

    #[test]
    fn parses_blocks_with_continuations() {
        let text = "TITLE: First\nSUMMARY: Line one\n  line two\n---\n\
                    **TITLE:** Second\n**Summary**: Body\nRELEVANCE: High\n";
        let parsed = parse_blocks(&GRAMMAR, text);
        assert!(parsed.rejected.is_empty(), "{:?}", parsed.rejected);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].get("SUMMARY"), Some("Line one line two"));
        assert_eq!(parsed.records[0].get("RELEVANCE"), None);
        assert_eq!(parsed.records[1].required("TITLE"), "Second");
        assert_eq!(parsed.records[1].get("RELEVANCE"), Some("High"));
    }

    #[test]
    fn missing_required_field_rejects_block() {
        let text = "TITLE: Only a title\n---\nTITLE: Ok\nSUMMARY: Fine\n";
        let parsed = parse_blocks(&GRAMMAR, text);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].index, 0);
        assert!(parsed.rejected[0].reason.contains("SUMMARY"));
    }

    #[test]
    fn unknown_labels_do_not_leak_into_previous_field() {
        let text = "TITLE: A\nSUMMARY: Body text\nSOURCE: some paper\n";
        let parsed = parse_blocks(&GRAMMAR, text);
        assert_eq!(parsed.records[0].get("SUMMARY"), Some("Body text"));
    }

    #[test]
    fn leading_and_trailing_delimiters_are_harmless() {
        let text = "---\n\nTITLE: A\nSUMMARY: B\n---\n\n---\n";
        let parsed = parse_blocks(&GRAMMAR, text);
        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }
}
