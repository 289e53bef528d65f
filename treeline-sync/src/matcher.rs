//! Cross-environment node identity.
//!
//! Source and target items never share remote ids, so the planner matches
//! nodes by a stable content-derived signature. The signature function is
//! injected so callers can adapt to their own key schemes.

use treeline_types::ContentItem;

/// Derives a stable cross-environment identity for a content item.
pub trait NodeMatcher: Send + Sync {
    /// Signature compared between source and target siblings. Items with
    /// equal signatures are treated as the same logical node.
    fn signature(&self, item: &ContentItem) -> String;
}

/// Default matcher: body metadata name (falling back to the label) plus the
/// content schema id.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameSchemaMatcher;

impl NodeMatcher for NameSchemaMatcher {
    fn signature(&self, item: &ContentItem) -> String {
        let name = item.body.meta.name.as_deref().unwrap_or(&item.label);
        let schema = item.schema_id().unwrap_or_default();
        format!("{name}:{schema}")
    }
}

/// Matches by delivery key, falling back to name+schema for keyless items.
///
/// Only suitable when keys cross environments unchanged (`keep` strategy);
/// under `remove`/`replace` the key is rewritten on sync and stops being a
/// stable identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeliveryKeyMatcher;

impl NodeMatcher for DeliveryKeyMatcher {
    fn signature(&self, item: &ContentItem) -> String {
        match item.delivery_key() {
            Some(key) => key.to_string(),
            None => NameSchemaMatcher.signature(item),
        }
    }
}
