//! Daily current-affairs briefing, generated once per calendar day.
//!
//! The provider answers in the labeled-block layout described by [`BRIEFING_GRAMMAR`].
//! Items are validated locally before anything is shown or cached:
//!
//! - a summary shorter than [`MIN_SUMMARY_CHARS`] or containing a placeholder phrase
//!   drops the item;
//! - the day's content is written to the cache only when at least
//!   [`MIN_CACHEABLE_ITEMS`] items survive, so a thin answer is retried on next load;
//! - no surviving items (or a failed call) substitutes the static fallback, which is
//!   never cached.

use chrono::NaiveDate;
use tokio_rusqlite::Connection;

use crate::catalog::fallback_briefing;
use crate::db;
use crate::gateway::{log_failure, AiGateway};
use crate::protocol::{parse_blocks, BlockGrammar, FieldSpec, ParsedBlocks};
use crate::types::BriefingItem;

/// Cache category for the daily briefing.
pub const CATEGORY: &str = "current_affairs";

pub const MIN_SUMMARY_CHARS: usize = 20;
pub const MIN_CACHEABLE_ITEMS: usize = 3;

/// Case-insensitive phrases that mark a summary as filler.
pub const PLACEHOLDER_PHRASES: &[&str] = &[
    "lorem ipsum",
    "placeholder",
    "[insert",
    "summary goes here",
    "no summary available",
    "details to follow",
    "to be updated",
];

pub const BRIEFING_GRAMMAR: BlockGrammar = BlockGrammar {
    version: 1,
    delimiter: "---",
    fields: &[
        FieldSpec::required("TITLE"),
        FieldSpec::required("CATEGORY"),
        FieldSpec::required("SUMMARY"),
        FieldSpec::optional("RELEVANCE"),
    ],
};

/// Where the items of a [`Briefing`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BriefingSource {
    /// Served from today's cache entry; the provider was not called.
    Cache,
    /// Freshly generated. `cached` is false when too few items survived validation.
    Generated { cached: bool },
    /// Static fallback after a failed or empty generation.
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Briefing {
    pub date_key: String,
    pub items: Vec<BriefingItem>,
    pub source: BriefingSource,
}

impl Briefing {
    pub fn is_fallback(&self) -> bool {
        self.source == BriefingSource::Fallback
    }
}

/// ISO calendar date used as the cache key.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Local-quality rule for a single summary.
pub fn summary_is_usable(summary: &str) -> bool {
    let trimmed = summary.trim();
    if trimmed.chars().count() < MIN_SUMMARY_CHARS {
        return false;
    }
    let lower = trimmed.to_lowercase();
    !PLACEHOLDER_PHRASES.iter().any(|p| lower.contains(p))
}

/// Turns parsed blocks into briefing items, dropping any that fail the summary rule.
pub fn valid_items(parsed: &ParsedBlocks) -> Vec<BriefingItem> {
    parsed
        .records
        .iter()
        .filter(|r| summary_is_usable(r.required("SUMMARY")))
        .map(|r| BriefingItem {
            title: r.required("TITLE").to_owned(),
            category: r.required("CATEGORY").to_owned(),
            summary: r.required("SUMMARY").to_owned(),
            relevance: r.get("RELEVANCE").map(str::to_owned),
        })
        .collect()
}

fn briefing_prompt(date_key: &str) -> String {
    format!(
        "You are preparing a defence-services aspirant for the SSB interview. List 5 \
         important current-affairs items for {date_key} covering national affairs, defence, \
         international relations, economy and science.\n\n\
         Answer ONLY in this exact layout, separating items with a line containing ---\n\n\
         TITLE: <headline>\nCATEGORY: <one word>\nSUMMARY: <two or three factual sentences>\n\
         RELEVANCE: <why an SSB candidate should know this>\n---"
    )
}

/// Returns the briefing for `date`, using the cache when possible.
///
/// Never fails: storage and provider errors are logged and end in the fallback.
pub async fn load_daily_briefing(
    gateway: &dyn AiGateway,
    conn: &Connection,
    date: NaiveDate,
) -> Briefing {
    let key = date_key(date);

    match db::cache_get(conn, CATEGORY, &key).await {
        Ok(Some(content)) => match serde_json::from_str::<Vec<BriefingItem>>(&content) {
            Ok(items) if !items.is_empty() => {
                tracing::debug!(category = CATEGORY, date_key = %key, "briefing cache hit");
                return Briefing {
                    date_key: key,
                    items,
                    source: BriefingSource::Cache,
                };
            }
            Ok(_) => tracing::warn!(date_key = %key, "empty briefing cache entry"),
            Err(e) => {
                tracing::warn!(date_key = %key, error = %e, "unreadable briefing cache entry");
            }
        },
        Ok(None) => {}
        Err(e) => tracing::warn!(date_key = %key, error = %e, "briefing cache read failed"),
    }

    let text = match gateway.generate_text(&briefing_prompt(&key)).await {
        Ok(text) => text,
        Err(e) => {
            log_failure("daily briefing", &e);
            return fallback(key);
        }
    };

    let parsed = parse_blocks(&BRIEFING_GRAMMAR, &text);
    for rejected in &parsed.rejected {
        tracing::debug!(
            index = rejected.index,
            reason = %rejected.reason,
            "briefing block rejected"
        );
    }
    let items = valid_items(&parsed);
    if items.is_empty() {
        tracing::warn!(date_key = %key, raw = %text, "no usable briefing items in response");
        return fallback(key);
    }

    let cached = if items.len() >= MIN_CACHEABLE_ITEMS {
        match store(conn, &key, &items).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(date_key = %key, error = %e, "briefing cache write failed");
                false
            }
        }
    } else {
        tracing::info!(
            date_key = %key,
            count = items.len(),
            "too few briefing items to cache; will regenerate next load"
        );
        false
    };

    Briefing {
        date_key: key,
        items,
        source: BriefingSource::Generated { cached },
    }
}

async fn store(
    conn: &Connection,
    key: &str,
    items: &[BriefingItem],
) -> crate::error::CoreResult<()> {
    let content = serde_json::to_string(items)?;
    db::cache_put(conn, CATEGORY, key, &content).await?;
    Ok(())
}

fn fallback(date_key: String) -> Briefing {
    Briefing {
        date_key,
        items: fallback_briefing(),
        source: BriefingSource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_or_placeholder_summaries_are_dropped() {
        assert!(!summary_is_usable("Too short."));
        assert!(!summary_is_usable("This is a PLACEHOLDER summary for the item."));
        assert!(!summary_is_usable("   [Insert details about the exercise here]   "));
        assert!(summary_is_usable("The navy commissioned a new stealth frigate today."));
    }

    #[test]
    fn summary_length_floor_counts_characters() {
        let nineteen = "Navy drill held now";
        let twenty = "Navy drills held now";
        assert_eq!(nineteen.chars().count(), 19);
        assert_eq!(twenty.chars().count(), 20);
        assert!(!summary_is_usable(nineteen));
        assert!(summary_is_usable(twenty));
        // Surrounding whitespace does not count.
        assert!(!summary_is_usable("   Navy drill held now   "));

        // Multibyte text is measured in characters, not bytes.
        let accented_19 = "é".repeat(19);
        let accented_20 = "é".repeat(20);
        assert!(accented_19.len() > MIN_SUMMARY_CHARS);
        assert!(!summary_is_usable(&accented_19));
        assert!(summary_is_usable(&accented_20));
    }

    #[test]
    fn valid_items_keeps_relevance_optional() {
        let text = "TITLE: A\nCATEGORY: Defence\n\
                    SUMMARY: A long enough summary about defence.\n---\n\
                    TITLE: B\nCATEGORY: Economy\nSUMMARY: tiny\n---\n\
                    TITLE: C\nCATEGORY: Science\n\
                    SUMMARY: A satellite launch was completed successfully.\n\
                    RELEVANCE: Space policy\n";
        let items = valid_items(&parse_blocks(&BRIEFING_GRAMMAR, text));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].relevance, None);
        assert_eq!(items[1].relevance.as_deref(), Some("Space policy"));
    }

    #[test]
    fn date_key_is_iso() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(date_key(d), "2026-03-07");
    }
}
