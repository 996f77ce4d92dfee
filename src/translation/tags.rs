/*!
 * Inline markup protection.
 *
 * Game strings carry markup such as `[Burn]` keyword links or `<color=red>`
 * rich text. Machine translation services mangle or translate that markup,
 * so it is swapped for numbered `[TAG<n>]` placeholders before a request and
 * swapped back afterwards.
 *
 * Restoration is a best-effort textual transform and is lossy: providers tend
 * to rewrite the placeholder punctuation (`【TAG0】`, `[tag 0]`, `{TAG_0}`) but
 * keep the digits, which the tolerant pattern accepts. When a provider drops a
 * placeholder entirely the markup for it is lost for that string.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Placeholder id -> original markup substring
pub type TagMap = HashMap<usize, String>;

/// `[...]` and `<...>` spans, never crossing a closing bracket
static MARKUP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]+\]|<[^>]+>").unwrap());

/// Placeholder as it may come back from a provider
static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\[【{<（]*\s*(?i:tag)[_\s]*(\d+)\s*[\]】}>）]*").unwrap()
});

/// Reversible markup substitution
pub struct TagProtector;

impl TagProtector {
    /// Replace every markup span with `[TAG<n>]`, numbering from zero
    pub fn protect(text: &str) -> (String, TagMap) {
        let mut tag_map = TagMap::new();
        let mut index = 0usize;

        let processed = MARKUP_REGEX.replace_all(text, |caps: &Captures| {
            tag_map.insert(index, caps[0].to_string());
            let placeholder = Self::placeholder(index);
            index += 1;
            placeholder
        });

        (processed.into_owned(), tag_map)
    }

    /// Put the original markup back in place of each recognisable placeholder
    ///
    /// Placeholders whose id is not in `tag_map` are left as they are.
    pub fn restore(translated: &str, tag_map: &TagMap) -> String {
        if tag_map.is_empty() {
            return translated.to_string();
        }

        let restored = PLACEHOLDER_REGEX.replace_all(translated, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|id| tag_map.get(&id))
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        });

        let restored = restored.into_owned();
        if log::log_enabled!(log::Level::Debug) {
            let found = Self::placeholder_ids(translated);
            let lost: Vec<_> = tag_map.keys().filter(|id| !found.contains(id)).collect();
            if !lost.is_empty() {
                debug!("Placeholders {:?} missing from '{}', markup dropped", lost, translated);
            }
        }
        restored
    }

    /// Ids of the placeholders appearing in `text`, in order of appearance
    pub fn placeholder_ids(text: &str) -> Vec<usize> {
        PLACEHOLDER_REGEX
            .captures_iter(text)
            .filter_map(|caps| caps[1].parse().ok())
            .collect()
    }

    /// Canonical spelling of placeholder `index`
    pub fn placeholder(index: usize) -> String {
        format!("[TAG{}]", index)
    }
}
