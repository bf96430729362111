//! Domain filter
//!
//! Domain lists per source. Each entry is wrapped so that a scheme, sub
//! domains, a port and a path are matched together with the domain itself.

use crate::compiler::{PatternCompiler, PatternSyntax, PatternTemplate, DEFAULT_SIZE_LIMIT};
use crate::normalize::NormalizeOptions;
use crate::query::{rebuild, should_query, Filter, Mask, SourceAttribution, SourceEngine, SourceFilter};
use std::borrow::Cow;

/// Domain filter configuration
#[derive(Debug, Clone)]
pub struct DomainOptions {
    pub normalize: NormalizeOptions,
    pub mask: Mask,
    /// Written before the mask of every replaced domain
    pub prefix: String,
    /// Written after the mask of every replaced domain
    pub postfix: String,
    pub diagnostic: bool,
    pub syntax: PatternSyntax,
    pub size_limit: usize,
}

impl Default for DomainOptions {
    fn default() -> Self {
        Self {
            normalize: NormalizeOptions::default(),
            mask: Mask::default(),
            prefix: String::new(),
            postfix: String::new(),
            diagnostic: false,
            syntax: PatternSyntax::Regex,
            size_limit: DEFAULT_SIZE_LIMIT,
        }
    }
}

#[derive(Debug)]
pub struct DomainFilter {
    engine: SourceEngine,
    compiler: PatternCompiler,
    mask: Mask,
    prefix: String,
    postfix: String,
}

impl DomainFilter {
    pub fn new(options: DomainOptions) -> Self {
        let compiler = PatternCompiler::new(PatternTemplate::DOMAIN)
            .syntax(options.syntax)
            .diagnostic(options.diagnostic)
            .size_limit(options.size_limit);

        Self {
            engine: SourceEngine::new(options.normalize, false),
            compiler,
            mask: options.mask,
            prefix: options.prefix,
            postfix: options.postfix,
        }
    }

    pub fn attribute(&self, text: &str, sources: &[&str]) -> Vec<SourceAttribution> {
        if !should_query(self.kind(), "attribute", text, self.is_loaded()) {
            return Vec::new();
        }
        self.engine.attribute(text, sources)
    }

    fn replacement(&self, matched: &str) -> String {
        format!("{}{}{}", self.prefix, self.mask.cover(matched), self.postfix)
    }
}

impl Default for DomainFilter {
    fn default() -> Self {
        Self::new(DomainOptions::default())
    }
}

impl Filter for DomainFilter {
    fn kind(&self) -> &'static str {
        "DomainFilter"
    }

    fn contains(&self, text: &str, sources: &[&str]) -> bool {
        should_query(self.kind(), "contains", text, self.is_loaded()) && self.engine.contains(text, sources)
    }

    fn get_all(&self, text: &str, sources: &[&str]) -> Vec<String> {
        if !should_query(self.kind(), "get_all", text, self.is_loaded()) {
            return Vec::new();
        }
        self.engine.get_all(text, sources)
    }

    fn replace_all<'a>(&self, text: &'a str, sources: &[&str]) -> Cow<'a, str> {
        if !should_query(self.kind(), "replace_all", text, self.is_loaded()) {
            return Cow::Borrowed(text);
        }
        let spans = self.engine.find_spans(text, sources);
        rebuild(text, spans, |matched| self.replacement(matched))
    }
}

impl SourceFilter for DomainFilter {
    fn engine(&self) -> &SourceEngine {
        &self.engine
    }

    fn engine_mut(&mut self) -> &mut SourceEngine {
        &mut self.engine
    }

    fn compiler(&self) -> &PatternCompiler {
        &self.compiler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Direction;

    fn filter(options: DomainOptions) -> DomainFilter {
        let mut filter = DomainFilter::new(options);
        filter
            .add_source("spam", Direction::LeftToRight, &[r"spam\.com", r"cheap-pills\.(net|org)"])
            .unwrap();
        filter
            .add_source("ads", Direction::LeftToRight, &[r"adserver\.io"])
            .unwrap();
        filter
    }

    #[test]
    fn test_contains_domains() {
        let filter = filter(DomainOptions::default());

        assert!(filter.contains("visit spam.com today", &[]));
        assert!(filter.contains("see http://www.cheap-pills.net/buy", &[]));
        assert!(filter.contains("FTP://adserver.io:21", &["ads"]));
        assert!(!filter.contains("visit spam.com today", &["ads"]));
        assert!(!filter.contains("example.com", &[]));
    }

    #[test]
    fn test_get_all_domains() {
        let filter = filter(DomainOptions::default());

        let found = filter.get_all("spam.com, https://adserver.io/x and spam.com", &[]);
        assert_eq!(found, vec!["https://adserver.io/x", "spam.com"]);
    }

    #[test]
    fn test_replace_with_prefix_and_postfix() {
        let filter = filter(DomainOptions {
            mask: Mask::new(['x']),
            prefix: "[".to_string(),
            postfix: "]".to_string(),
            ..Default::default()
        });

        assert_eq!(filter.replace_all("go to spam.com now", &[]), "go to [xxxxxxxx] now");
    }

    #[test]
    fn test_no_match_inside_longer_label() {
        let mut filter = DomainFilter::default();
        filter.add_source("short", Direction::LeftToRight, &[r"x\.com"]).unwrap();

        assert!(!filter.contains("see dropbox.com", &[]));
        assert!(filter.get_all("see dropbox.com", &[]).is_empty());
        assert!(filter.contains("see www.x.com", &[]));
        assert_eq!(filter.get_all("see www.x.com", &[]), vec!["www.x.com"]);
    }

    #[test]
    fn test_clean_text_unchanged() {
        let filter = filter(DomainOptions::default());
        assert!(matches!(filter.replace_all("example.org", &[]), Cow::Borrowed("example.org")));
    }
}
