//! Capitalization filter
//!
//! Flags words containing a run of more than `character_number` uppercase
//! letters and rewrites them in title case. Not source based: the `sources`
//! argument of the queries is ignored.

use crate::error::{FilterError, Result};
use crate::query::{rebuild, should_query, sorted_unique, Filter};
use regex::Regex;
use std::borrow::Cow;

pub const DEFAULT_CHARACTER_NUMBER: usize = 3;

#[derive(Debug, Clone)]
pub struct CapitalizationFilter {
    character_number: usize,
    regex: Regex,
}

impl CapitalizationFilter {
    /// Values below 1 are raised to 1
    pub fn new(character_number: usize) -> Result<Self> {
        let character_number = clamp_character_number(character_number);
        Ok(Self {
            character_number,
            regex: build(character_number)?,
        })
    }

    pub fn character_number(&self) -> usize {
        self.character_number
    }

    pub fn set_character_number(&mut self, character_number: usize) -> Result<()> {
        let character_number = clamp_character_number(character_number);
        self.regex = build(character_number)?;
        self.character_number = character_number;
        Ok(())
    }
}

fn clamp_character_number(character_number: usize) -> usize {
    if character_number < 1 {
        log::warn!("CapitalizationFilter: character number must be at least 1, using 1");
        return 1;
    }
    character_number
}

fn build(character_number: usize) -> Result<Regex> {
    let min_run = character_number
        .checked_add(1)
        .ok_or_else(|| FilterError::invalid_argument(format!("character number {} is too large", character_number)))?;
    let pattern = format!(r"\b\w*\p{{Lu}}{{{},}}\w*\b", min_run);
    Regex::new(&pattern).map_err(|e| FilterError::compile("capitalization", e))
}

/// First character uppercase, the rest lowercase
fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

impl Filter for CapitalizationFilter {
    fn kind(&self) -> &'static str {
        "CapitalizationFilter"
    }

    fn contains(&self, text: &str, _sources: &[&str]) -> bool {
        should_query(self.kind(), "contains", text, true) && self.regex.is_match(text)
    }

    fn get_all(&self, text: &str, _sources: &[&str]) -> Vec<String> {
        if !should_query(self.kind(), "get_all", text, true) {
            return Vec::new();
        }
        let spans: Vec<_> = self.regex.find_iter(text).map(|m| m.range()).collect();
        sorted_unique(text, &spans)
    }

    fn replace_all<'a>(&self, text: &'a str, _sources: &[&str]) -> Cow<'a, str> {
        if !should_query(self.kind(), "replace_all", text, true) {
            return Cow::Borrowed(text);
        }
        let spans = self.regex.find_iter(text).map(|m| m.range()).collect();
        rebuild(text, spans, title_case)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_shouting() {
        let filter = CapitalizationFilter::new(3).unwrap();
        let text = "This is BAAAD text";

        assert!(filter.contains(text, &[]));
        assert_eq!(filter.get_all(text, &[]), vec!["BAAAD"]);
        assert_eq!(filter.replace_all(text, &[]), "This is Baaad text");
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let filter = CapitalizationFilter::new(3).unwrap();

        assert!(!filter.contains("The USA summit", &[]));
        assert!(filter.contains("The NATO summit", &[]));
    }

    #[test]
    fn test_sources_are_ignored() {
        let filter = CapitalizationFilter::new(2).unwrap();
        assert!(filter.contains("STOP", &["whatever"]));
    }

    #[test]
    fn test_minimum_character_number() {
        let mut filter = CapitalizationFilter::new(0).unwrap();
        assert_eq!(filter.character_number(), 1);

        assert!(filter.contains("OK", &[]));
        assert!(!filter.contains("Ok", &[]));

        filter.set_character_number(5).unwrap();
        assert!(!filter.contains("LOUD", &[]));
    }

    #[test]
    fn test_oversized_character_number() {
        assert!(matches!(CapitalizationFilter::new(usize::MAX), Err(FilterError::InvalidArgument(_))));

        let mut filter = CapitalizationFilter::new(3).unwrap();
        assert!(filter.set_character_number(usize::MAX).is_err());
        assert_eq!(filter.character_number(), 3);
        assert!(filter.contains("LOUD", &[]));
    }

    #[test]
    fn test_unicode_words() {
        let filter = CapitalizationFilter::new(2).unwrap();
        assert_eq!(filter.replace_all("sehr ÄRGERLICH!", &[]), "sehr Ärgerlich!");
    }

    #[test]
    fn test_empty_and_clean_text() {
        let filter = CapitalizationFilter::new(3).unwrap();

        assert!(!filter.contains("", &[]));
        assert!(filter.get_all("", &[]).is_empty());
        assert_eq!(filter.replace_all("", &[]), "");
        assert!(matches!(filter.replace_all("calm", &[]), Cow::Borrowed("calm")));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("hELLO"), "Hello");
        assert_eq!(title_case(""), "");
    }
}
