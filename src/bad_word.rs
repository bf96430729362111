//! Bad-word filter
//!
//! Word lists per source, matched as whole words (or as plain substrings in
//! simple-check mode) after normalization, and covered with mask characters.

use crate::compiler::{PatternCompiler, PatternSyntax, PatternTemplate, DEFAULT_SIZE_LIMIT};
use crate::normalize::NormalizeOptions;
use crate::query::{rebuild, should_query, Filter, Mask, SourceAttribution, SourceEngine, SourceFilter};
use std::borrow::Cow;

/// Bad-word filter configuration
#[derive(Debug, Clone)]
pub struct BadWordOptions {
    pub normalize: NormalizeOptions,
    pub mask: Mask,
    /// Case-insensitive substring matching instead of whole-word regexes,
    /// for scripts without word boundaries
    pub simple_check: bool,
    /// Keep one compiled pattern per line to attribute matches
    pub diagnostic: bool,
    pub syntax: PatternSyntax,
    pub size_limit: usize,
}

impl Default for BadWordOptions {
    fn default() -> Self {
        Self {
            normalize: NormalizeOptions::default(),
            mask: Mask::default(),
            simple_check: false,
            diagnostic: false,
            syntax: PatternSyntax::Regex,
            size_limit: DEFAULT_SIZE_LIMIT,
        }
    }
}

#[derive(Debug)]
pub struct BadWordFilter {
    engine: SourceEngine,
    compiler: PatternCompiler,
    mask: Mask,
}

impl BadWordFilter {
    pub fn new(options: BadWordOptions) -> Self {
        let compiler = PatternCompiler::new(PatternTemplate::WORD)
            .syntax(options.syntax)
            .diagnostic(options.diagnostic)
            .size_limit(options.size_limit);

        Self {
            engine: SourceEngine::new(options.normalize, options.simple_check),
            compiler,
            mask: options.mask,
        }
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn set_mask(&mut self, mask: Mask) {
        self.mask = mask;
    }

    /// Which source line produced each match. Only sources loaded in
    /// diagnostic mode report anything.
    pub fn attribute(&self, text: &str, sources: &[&str]) -> Vec<SourceAttribution> {
        if !should_query(self.kind(), "attribute", text, self.is_loaded()) {
            return Vec::new();
        }
        self.engine.attribute(text, sources)
    }
}

impl Default for BadWordFilter {
    fn default() -> Self {
        Self::new(BadWordOptions::default())
    }
}

impl Filter for BadWordFilter {
    fn kind(&self) -> &'static str {
        "BadWordFilter"
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
        rebuild(text, spans, |matched| self.mask.cover(matched))
    }
}

impl SourceFilter for BadWordFilter {
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
    use crate::error::FilterError;
    use crate::normalize::ReplaceMode;
    use crate::query::SourceSpec;

    fn lines(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn loaded(options: BadWordOptions) -> BadWordFilter {
        let mut filter = BadWordFilter::new(options);
        let report = filter.load([
            SourceSpec::new("english", lines(&["bad", "worse", "# comment"])),
            SourceSpec::new("german", lines(&["schlecht"])),
        ]);
        assert_eq!(report.loaded, vec!["english", "german"]);
        filter
    }

    #[test]
    fn test_clean_text_is_returned_unchanged() {
        let filter = loaded(BadWordOptions::default());
        let text = "nothing to see here";

        assert!(!filter.contains(text, &[]));
        assert!(matches!(filter.replace_all(text, &[]), Cow::Borrowed(t) if std::ptr::eq(t, text)));
    }

    #[test]
    fn test_mask_length() {
        let filter = loaded(BadWordOptions::default());

        assert_eq!(filter.replace_all("this is bad.", &[]), "this is ***.");
        assert_eq!(filter.replace_all("Worse things", &[]), "***** things");
        assert_eq!(filter.replace_all("two bads", &[]), "two ****");
    }

    #[test]
    fn test_random_mask_characters() {
        let filter = loaded(BadWordOptions {
            mask: Mask::new(['#', '@', '!']),
            ..Default::default()
        });

        let out = filter.replace_all("so bad today", &[]);
        assert_eq!(&out[..3], "so ");
        assert_eq!(&out[6..], " today");
        assert!(out[3..6].chars().all(|c| "#@!".contains(c)));
    }

    #[test]
    fn test_get_all() {
        let filter = loaded(BadWordOptions::default());

        let found = filter.get_all("worse and bad, schlecht and bad", &[]);
        assert_eq!(found, vec!["bad", "schlecht", "worse"]);
        assert_eq!(filter.get_all("worse and bad", &["german"]), Vec::<String>::new());
    }

    #[test]
    fn test_source_restriction() {
        let filter = loaded(BadWordOptions::default());

        assert!(filter.contains("das ist schlecht", &["german"]));
        assert!(!filter.contains("das ist schlecht", &["english"]));
        assert!(!filter.contains("das ist schlecht", &["doesNotExist"]));
        assert_eq!(filter.replace_all("bad schlecht", &["german"]), "bad ********");
    }

    #[test]
    fn test_leet_and_spacing() {
        let filter = loaded(BadWordOptions {
            normalize: NormalizeOptions {
                mode: ReplaceMode::LeetBasic,
                collapse_spaces: true,
                max_token_length: 1,
                strip_chars: String::new(),
            },
            ..Default::default()
        });

        assert!(filter.contains("so b4d", &[]));
        assert_eq!(filter.get_all("so b 4 d", &[]), vec!["b 4 d"]);
        assert_eq!(filter.replace_all("so b 4 d ok", &[]), "so ***** ok");
    }

    #[test]
    fn test_simple_check() {
        let mut filter = BadWordFilter::new(BadWordOptions {
            simple_check: true,
            ..Default::default()
        });
        filter.add_source("zh", Direction::LeftToRight, &["笨蛋"]).unwrap();

        assert!(filter.contains("你是笨蛋吗", &[]));
        assert_eq!(filter.replace_all("你是笨蛋吗", &[]), "你是**吗");
    }

    #[test]
    fn test_empty_text() {
        let filter = loaded(BadWordOptions::default());
        let unloaded = BadWordFilter::default();

        for f in [&filter, &unloaded] {
            assert!(!f.contains("", &[]));
            assert!(f.get_all("", &[]).is_empty());
            assert_eq!(f.replace_all("", &[]), "");
        }
    }

    #[test]
    fn test_unloaded_filter_is_neutral() {
        let filter = BadWordFilter::default();

        assert!(!filter.is_loaded());
        assert!(!filter.contains("bad", &[]));
        assert_eq!(filter.replace_all("bad", &[]), "bad");
    }

    #[test]
    fn test_source_lifecycle() {
        let mut filter = loaded(BadWordOptions::default());

        assert_eq!(filter.source_count(), 2);
        assert!(filter.contains_source("german"));

        // re-adding does not replace
        filter.add_source("german", Direction::LeftToRight, &["gut"]).unwrap();
        assert!(!filter.contains("gut", &["german"]));

        assert!(filter.remove_source("german").unwrap());
        filter.add_source("german", Direction::LeftToRight, &["gut"]).unwrap();
        assert!(filter.contains("gut", &["german"]));

        filter.clear_sources();
        assert!(!filter.is_loaded());
        assert!(filter.source_names().is_empty());
    }

    #[test]
    fn test_failed_source_does_not_block_others() {
        let mut filter = BadWordFilter::default();
        let report = filter.load([
            SourceSpec::new("broken", lines(&["(oops"])),
            SourceSpec::new("english", lines(&["bad"])),
        ]);

        assert!(report.is_success());
        assert_eq!(report.failed.len(), 1);
        assert!(!filter.contains_source("broken"));
        assert!(filter.contains("bad", &[]));
    }

    #[test]
    fn test_empty_source_name() {
        let mut filter = BadWordFilter::default();
        let err = filter.add_source("", Direction::LeftToRight, &["bad"]);
        assert!(matches!(err, Err(FilterError::InvalidArgument(_))));
    }

    #[test]
    fn test_diagnostic_attribution() {
        let filter = loaded(BadWordOptions {
            diagnostic: true,
            ..Default::default()
        });

        let found = filter.attribute("Worse", &[]);
        assert_eq!(
            found,
            vec![SourceAttribution {
                source: "english".to_string(),
                line: "worse".to_string(),
                matched: "Worse".to_string(),
            }]
        );
        assert_eq!(filter.replace_all("Worse", &[]), "*****");
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("english.txt"), "bad\nworse\n").unwrap();
        std::fs::write(dir.path().join("german.txt"), "# deutsch\nschlecht\n").unwrap();
        std::fs::write(dir.path().join("readme.md"), "not a list").unwrap();

        let mut filter = BadWordFilter::default();
        let report = filter
            .load_dir(dir.path(), false, &["txt".to_string()])
            .unwrap();

        assert_eq!(report.loaded, vec!["english", "german"]);
        assert_eq!(filter.replace_all("schlecht und bad", &["german"]), "******** und bad");

        let again = filter
            .load_files([("english".to_string(), dir.path().join("english.txt"))])
            .unwrap();
        assert_eq!(again.skipped, vec!["english"]);
        assert!(again.into_result().is_err());
    }

    #[test]
    fn test_diagnostic_does_not_change_results() {
        let text = "you bad ass";
        let mut results = Vec::new();

        for diagnostic in [false, true] {
            let mut filter = BadWordFilter::new(BadWordOptions {
                diagnostic,
                ..Default::default()
            });
            filter
                .add_source("english", Direction::LeftToRight, &["bad", "bad ass", "ass"])
                .unwrap();
            results.push((filter.get_all(text, &[]), filter.replace_all(text, &[]).into_owned()));
        }

        assert_eq!(results[0], (lines(&["ass", "bad"]), "you *** ***".to_string()));
        assert_eq!(results[0], results[1]);
    }
}
