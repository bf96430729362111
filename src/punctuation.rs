//! Punctuation filter
//!
//! Flags runs of more than `character_number` punctuation characters and
//! truncates them to `character_number`. The `sources` argument is ignored.

use crate::error::{FilterError, Result};
use crate::query::{rebuild, should_query, sorted_unique, Filter};
use regex::Regex;
use std::borrow::Cow;

pub const DEFAULT_CHARACTER_NUMBER: usize = 3;

/// Characters counted as punctuation
const PUNCTUATION: &str = r"?!,.;:\-";

#[derive(Debug, Clone)]
pub struct PunctuationFilter {
    character_number: usize,
    regex: Regex,
}

impl PunctuationFilter {
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

    fn truncate(&self, run: &str) -> String {
        run.chars().take(self.character_number).collect()
    }
}

fn clamp_character_number(character_number: usize) -> usize {
    if character_number < 1 {
        log::warn!("PunctuationFilter: character number must be at least 1, using 1");
        return 1;
    }
    character_number
}

fn build(character_number: usize) -> Result<Regex> {
    let min_run = character_number
        .checked_add(1)
        .ok_or_else(|| FilterError::invalid_argument(format!("character number {} is too large", character_number)))?;
    let pattern = format!("[{}]{{{},}}", PUNCTUATION, min_run);
    Regex::new(&pattern).map_err(|e| FilterError::compile("punctuation", e))
}

impl Filter for PunctuationFilter {
    fn kind(&self) -> &'static str {
        "PunctuationFilter"
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
        rebuild(text, spans, |run| self.truncate(run))
    }
}
