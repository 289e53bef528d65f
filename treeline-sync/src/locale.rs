//! Delivery-key locale rewriting.
//!
//! Delivery keys may carry a locale prefix (`en-GB-homepage`). When content
//! crosses environments the prefix is kept, stripped, or replaced with the
//! target environment's locale. Pure functions, no I/O.

use serde::{Deserialize, Serialize};

/// How delivery-key locale prefixes are handled during sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LocaleStrategy {
    /// Keys cross unchanged.
    Keep,
    /// A leading locale prefix is stripped.
    Remove,
    /// A leading locale prefix is swapped for `target_locale`, which is
    /// prepended when no prefix is present.
    #[serde(rename_all = "camelCase")]
    Replace { target_locale: String },
}

impl Default for LocaleStrategy {
    fn default() -> Self {
        Self::Keep
    }
}

/// Length of a leading `xx-XX-` locale pattern (two lowercase letters,
/// hyphen, two letters, hyphen), when present.
fn locale_prefix_len(key: &str) -> Option<usize> {
    let bytes = key.as_bytes();
    if bytes.len() < 6 {
        return None;
    }
    let prefixed = bytes[0].is_ascii_lowercase()
        && bytes[1].is_ascii_lowercase()
        && bytes[2] == b'-'
        && bytes[3].is_ascii_alphabetic()
        && bytes[4].is_ascii_alphabetic()
        && bytes[5] == b'-';
    prefixed.then_some(6)
}

/// Rewrites a delivery key's locale prefix per the strategy.
///
/// A missing key is a strict no-op: the transformer never invents a key
/// where none existed.
#[must_use]
pub fn transform_delivery_key(key: Option<&str>, strategy: &LocaleStrategy) -> Option<String> {
    let key = key?;
    let transformed = match strategy {
        LocaleStrategy::Keep => key.to_string(),
        LocaleStrategy::Remove => match locale_prefix_len(key) {
            Some(len) => key[len..].to_string(),
            None => key.to_string(),
        },
        LocaleStrategy::Replace { target_locale } => match locale_prefix_len(key) {
            Some(len) => format!("{target_locale}-{}", &key[len..]),
            None => format!("{target_locale}-{key}"),
        },
    };
    Some(transformed)
}

/// Locale assigned to newly created items: `keep` copies the source item's
/// locale, `replace` assigns the target locale, `remove` assigns none.
#[must_use]
pub fn assigned_locale(strategy: &LocaleStrategy, source_locale: Option<&str>) -> Option<String> {
    match strategy {
        LocaleStrategy::Keep => source_locale.map(str::to_string),
        LocaleStrategy::Remove => None,
        LocaleStrategy::Replace { target_locale } => Some(target_locale.clone()),
    }
}
