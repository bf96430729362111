//! Source registry
//!
//! Maps source names to their compiled matcher and plain word list. Both
//! live in one entry so they are always added and removed together.
//!
//! The registry is not synchronized; mutation needs `&mut` access, so
//! sharing a filter across threads for writing requires the caller to wrap
//! it (e.g. in a `RwLock`).

use crate::compiler::CompiledMatcher;
use crate::error::{FilterError, Result};
use ahash::RandomState;
use hashbrown::HashMap;

/// Everything kept for one registered source
#[derive(Debug, Clone)]
pub struct SourceEntry {
    matcher: CompiledMatcher,
    /// Lowercased patterns for substring matching
    words: Vec<String>,
}

impl SourceEntry {
    pub fn new(matcher: CompiledMatcher) -> Self {
        let words = matcher.patterns().iter().map(|p| p.to_lowercase()).collect();
        Self { matcher, words }
    }

    pub fn matcher(&self) -> &CompiledMatcher {
        &self.matcher
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

/// Named sources in insertion order
#[derive(Debug, Default)]
pub struct SourceRegistry {
    entries: HashMap<String, SourceEntry, RandomState>,
    order: Vec<String>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entry` under `name`. An existing source is kept as-is and
    /// `false` is returned; remove it first to replace it.
    pub fn add(&mut self, name: &str, entry: SourceEntry) -> Result<bool> {
        check_name(name)?;

        if self.entries.contains_key(name) {
            log::debug!("Source '{}' already registered, keeping existing entry", name);
            return Ok(false);
        }

        self.entries.insert(name.to_string(), entry);
        self.order.push(name.to_string());
        log::debug!("Registered source '{}'", name);
        Ok(true)
    }

    /// Remove a source. Returns `true` if it was registered.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        check_name(name)?;

        if self.entries.remove(name).is_none() {
            return Ok(false);
        }

        self.order.retain(|n| n != name);
        log::debug!("Removed source '{}'", name);
        Ok(true)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&SourceEntry> {
        self.entries.get(name)
    }

    /// Entry together with the registered name
    pub fn get_named(&self, name: &str) -> Option<(&str, &SourceEntry)> {
        self.entries
            .get_key_value(name)
            .map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Source names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceEntry)> {
        self.order
            .iter()
            .filter_map(move |name| self.entries.get(name).map(|entry| (name.as_str(), entry)))
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(FilterError::invalid_argument("source name must not be empty"));
    }
    Ok(())
}
