//! Namespace-tolerant element lookup.
//!
//! Feed producers are inconsistent about prefixes: the same field may arrive
//! as `demopartynet:country`, as a bare `country`, or under a different
//! prefix. Each `ElementLookup` is one way of finding a field; they are
//! tried in `LOOKUP_CHAIN` order until one matches.

use super::document::{local_part, XmlElement};

/// A tag as asked for by the parser, e.g. `title` or `demopartynet:url`.
#[derive(Debug, Clone, Copy)]
pub struct TagHint<'a> {
    qualified: &'a str,
    local: &'a str,
}

impl<'a> TagHint<'a> {
    pub fn new(tag: &'a str) -> Self {
        Self {
            qualified: tag,
            local: local_part(tag),
        }
    }

    pub fn is_namespaced(&self) -> bool {
        self.qualified.contains(':')
    }
}

pub trait ElementLookup: Sync {
    fn try_find<'e>(&self, item: &'e XmlElement, hint: TagHint<'_>) -> Option<&'e XmlElement>;
}

/// Un-namespaced hints: first descendant with exactly that name.
pub struct DirectTag;

impl ElementLookup for DirectTag {
    fn try_find<'e>(&self, item: &'e XmlElement, hint: TagHint<'_>) -> Option<&'e XmlElement> {
        if hint.is_namespaced() {
            return None;
        }
        item.descendants().find(|e| e.name() == hint.qualified)
    }
}

/// Namespaced hints: the exact prefixed name, else the bare local name.
pub struct PrefixedTag;

impl ElementLookup for PrefixedTag {
    fn try_find<'e>(&self, item: &'e XmlElement, hint: TagHint<'_>) -> Option<&'e XmlElement> {
        if !hint.is_namespaced() {
            return None;
        }
        item.descendants()
            .find(|e| e.name() == hint.qualified)
            .or_else(|| item.descendants().find(|e| e.name() == hint.local))
    }
}

/// Last resort: direct children compared by local name, any prefix.
pub struct ChildLocalName;

impl ElementLookup for ChildLocalName {
    fn try_find<'e>(&self, item: &'e XmlElement, hint: TagHint<'_>) -> Option<&'e XmlElement> {
        item.children().find(|e| e.local_name() == hint.local)
    }
}

pub static LOOKUP_CHAIN: [&dyn ElementLookup; 3] = [&DirectTag, &PrefixedTag, &ChildLocalName];

/// First element any strategy finds for `tag`
pub fn find_element<'e>(item: &'e XmlElement, tag: &str) -> Option<&'e XmlElement> {
    let hint = TagHint::new(tag);
    LOOKUP_CHAIN
        .iter()
        .find_map(|strategy| strategy.try_find(item, hint))
}

/// Trimmed text of the element found for `tag`, empty when nothing matches
pub fn element_text(item: &XmlElement, tag: &str) -> String {
    find_element(item, tag)
        .map(|e| e.text_content().trim().to_string())
        .unwrap_or_default()
}

/// Text of the first tag in `tags` that yields a non-empty value
pub fn first_text(item: &XmlElement, tags: &[&str]) -> String {
    tags.iter()
        .map(|tag| element_text(item, tag))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}
