//! Documents loaded from the network and the link list derived from them.
//!
//! `contact.json` and `blog.json` are parsed into [`ContactData`] and
//! [`FeedData`].  Neither is ever mutated after parsing; a reload replaces the
//! whole value.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

/// Platform name → URL mapping that keeps the order keys appear in the JSON
/// object.  Rotation order is derived from it, so it must not be re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMap(Vec<(String, String)>);

impl LinkMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert or replace.  A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, url: impl Into<String>) {
        let key = key.into();
        let url = url.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = url,
            None => self.0.push((key, url)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LinkMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = LinkMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<'de> Deserialize<'de> for LinkMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LinkMapVisitor;

        impl<'de> Visitor<'de> for LinkMapVisitor {
            type Value = LinkMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping platform names to URL strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<LinkMap, A::Error> {
                let mut map = LinkMap::new();
                while let Some((key, url)) = access.next_entry::<String, String>()? {
                    map.insert(key, url);
                }
                Ok(map)
            }

            fn visit_unit<E: de::Error>(self) -> Result<LinkMap, E> {
                Ok(LinkMap::new())
            }
        }

        deserializer.deserialize_any(LinkMapVisitor)
    }
}

/// Parsed `contact.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContactData {
    pub email: String,
    #[serde(default)]
    pub social: LinkMap,
    #[serde(default)]
    pub additional_contact: LinkMap,
}

/// One blog announcement.  `text` may contain bare URLs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedEntry {
    pub text: String,
}

/// Parsed `blog.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedData {
    pub entries: Vec<FeedEntry>,
}

/// A single rotating contact link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkItem {
    pub label: String,
    pub url: String,
}

impl LinkItem {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

impl ContactData {
    /// Flatten into rotation order: email, then `social`, then
    /// `additional_contact`, each in document order.
    pub fn links(&self) -> Vec<LinkItem> {
        let mut links = Vec::with_capacity(1 + self.social.len() + self.additional_contact.len());
        links.push(LinkItem::new("Email", format!("mailto:{}", self.email)));
        links.extend(
            self.social
                .iter()
                .chain(self.additional_contact.iter())
                .map(|(platform, url)| LinkItem::new(title_case(platform), url)),
        );
        links
    }
}

/// Upper-case the first character, leave the rest untouched
/// (`"github"` → `"Github"`, `"linkedIn"` → `"LinkedIn"`).
pub fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
