//! Pattern compiler
//!
//! Turns the raw lines of one source into a [`CompiledMatcher`]. Comment
//! lines are dropped, inline comments cut off, and the remaining lines are
//! joined into a single case-insensitive alternation wrapped in a template
//! that keeps matches from starting or ending inside a larger word.

use crate::error::{FilterError, Result};
use regex::{Regex, RegexBuilder};
use std::ops::Range;

/// Default compiled-size limit for one source (64MB)
pub const DEFAULT_SIZE_LIMIT: usize = 64 * 1024 * 1024;

/// Matching direction of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    LeftToRight,
    /// Matches of the source are visited from the end of the text backwards
    RightToLeft,
}

impl Direction {
    pub fn from_left_to_right(is_left_to_right: bool) -> Self {
        if is_left_to_right {
            Self::LeftToRight
        } else {
            Self::RightToLeft
        }
    }
}

/// How source lines are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternSyntax {
    /// Lines are regex fragments and are joined as-is
    #[default]
    Regex,
    /// Lines are literal words and are escaped before joining
    Literal,
}

/// Text placed around the joined alternation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternTemplate {
    pub prefix: &'static str,
    pub suffix: &'static str,
}

impl PatternTemplate {
    /// Whole words with an optional plural "s"
    pub const WORD: Self = Self {
        prefix: r"\b{start-half}(?:",
        suffix: r")s?\b{end-half}",
    };

    /// Domain names with optional scheme, subdomains, port and path
    pub const DOMAIN: Self = Self {
        prefix: r"\b{start-half}(?:(?:https?|ftp)://)?(?:[\w\-@]+\.)*(?:",
        suffix: r")(?::\d{1,5})?(?:/[\w\-./?%&=+#]*)?\b{end-half}",
    };

    pub fn wrap(&self, body: &str) -> String {
        format!("{}{}{}", self.prefix, body, self.suffix)
    }
}

/// Strip full-line and inline `#` comments, trim, and drop blank lines
pub fn strip_comments<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !line.starts_with('#'))
        .map(|line| match line.find('#') {
            Some(idx) => line[..idx].trim(),
            None => line,
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// One source line compiled on its own (diagnostic mode)
#[derive(Debug, Clone)]
pub struct LinePattern {
    pub line: String,
    pub regex: Regex,
}

/// A match attributed to the source line that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub line: String,
    pub span: Range<usize>,
}

/// Compiled form of one source
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    combined: Regex,
    lines: Option<Vec<LinePattern>>,
    patterns: Vec<String>,
    direction: Direction,
}

impl CompiledMatcher {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Comment-free lines the matcher was built from
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_diagnostic(&self) -> bool {
        self.lines.is_some()
    }

    pub fn as_str(&self) -> &str {
        self.combined.as_str()
    }

    #[inline]
    pub fn is_match(&self, text: &str) -> bool {
        self.combined.is_match(text)
    }

    /// Byte spans of all non-empty matches in visitation order. Always taken
    /// from the combined pattern; per-line patterns only feed `attribute`.
    pub fn find_spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans: Vec<Range<usize>> = self
            .combined
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| m.range())
            .collect();

        if self.direction == Direction::RightToLeft {
            spans.reverse();
        }
        spans
    }

    /// Matches of every single line. Empty unless compiled in diagnostic mode.
    pub fn attribute(&self, text: &str) -> Vec<Attribution> {
        let Some(ref lines) = self.lines else {
            return Vec::new();
        };

        let mut found = Vec::new();
        for pattern in lines {
            for m in pattern.regex.find_iter(text).filter(|m| !m.is_empty()) {
                log::debug!("Line '{}' matched '{}'", pattern.line, m.as_str());
                found.push(Attribution {
                    line: pattern.line.clone(),
                    span: m.range(),
                });
            }
        }
        found
    }
}

/// Builds [`CompiledMatcher`]s for one pattern template
#[derive(Debug, Clone)]
pub struct PatternCompiler {
    template: PatternTemplate,
    syntax: PatternSyntax,
    diagnostic: bool,
    size_limit: usize,
}

impl PatternCompiler {
    pub fn new(template: PatternTemplate) -> Self {
        Self {
            template,
            syntax: PatternSyntax::default(),
            diagnostic: false,
            size_limit: DEFAULT_SIZE_LIMIT,
        }
    }

    pub fn syntax(mut self, syntax: PatternSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn diagnostic(mut self, diagnostic: bool) -> Self {
        self.diagnostic = diagnostic;
        self
    }

    pub fn size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Compile the lines of `source_name`
    pub fn compile<S: AsRef<str>>(
        &self,
        source_name: &str,
        lines: &[S],
        direction: Direction,
    ) -> Result<CompiledMatcher> {
        let patterns = strip_comments(lines);
        if patterns.is_empty() {
            return Err(FilterError::compile(source_name, "source contains no patterns"));
        }

        let fragments: Vec<String> = patterns.iter().map(|p| self.fragment(p)).collect();

        let combined = self.build(source_name, &self.template.wrap(&fragments.join("|")))?;

        let lines = if self.diagnostic {
            let mut compiled = Vec::with_capacity(fragments.len());
            for (line, fragment) in patterns.iter().zip(&fragments) {
                compiled.push(LinePattern {
                    line: line.clone(),
                    regex: self.build(source_name, &self.template.wrap(fragment))?,
                });
            }
            Some(compiled)
        } else {
            None
        };

        log::debug!(
            "Compiled source '{}' ({} patterns, {:?}{})",
            source_name,
            patterns.len(),
            direction,
            if self.diagnostic { ", diagnostic" } else { "" }
        );

        Ok(CompiledMatcher {
            combined,
            lines,
            patterns,
            direction,
        })
    }

    fn fragment(&self, line: &str) -> String {
        match self.syntax {
            PatternSyntax::Regex => line.to_string(),
            PatternSyntax::Literal => regex::escape(line),
        }
    }

    fn build(&self, source_name: &str, pattern: &str) -> Result<Regex> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(self.size_limit)
            .build()
            .map_err(|e| FilterError::compile(source_name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> PatternCompiler {
        PatternCompiler::new(PatternTemplate::WORD)
    }

    #[test]
    fn test_strip_comments() {
        let lines = ["foo", "#comment", "bar#trailing", "  baz  # note", "", "   "];
        assert_eq!(strip_comments(&lines), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn test_comment_lines_never_match() {
        let matcher = words()
            .compile("test", &["foo", "#comment", "bar#trailing"], Direction::LeftToRight)
            .unwrap();

        assert!(matcher.is_match("a bar here"));
        assert!(matcher.is_match("FOO"));
        assert!(!matcher.is_match("#comment"));
        assert!(!matcher.is_match("trailing"));
        assert!(!matcher.is_match("bartrailing"));
    }

    #[test]
    fn test_word_boundaries() {
        let matcher = words().compile("test", &["ass"], Direction::LeftToRight).unwrap();

        assert!(matcher.is_match("you ass!"));
        assert!(!matcher.is_match("asses"));
        assert!(!matcher.is_match("class"));
        assert!(!matcher.is_match("assassin"));
        assert!(!matcher.is_match("ass1"));
    }

    #[test]
    fn test_plural_tolerance() {
        let matcher = words().compile("test", &["cat"], Direction::LeftToRight).unwrap();

        assert_eq!(matcher.find_spans("two cats"), vec![4..8]);
        assert!(!matcher.is_match("catss"));
    }

    #[test]
    fn test_case_insensitive_unicode() {
        let matcher = words().compile("de", &["ärger"], Direction::LeftToRight).unwrap();

        assert!(matcher.is_match("ÄRGER"));
        assert!(matcher.is_match("So ein Ärger."));
    }

    #[test]
    fn test_regex_syntax_keeps_metacharacters() {
        let matcher = words().compile("test", &["f[u*]ck"], Direction::LeftToRight).unwrap();

        assert!(matcher.is_match("f*ck"));
        assert!(matcher.is_match("fuck"));
    }

    #[test]
    fn test_literal_syntax_escapes() {
        let compiler = words().syntax(PatternSyntax::Literal);
        let matcher = compiler.compile("test", &["a.b"], Direction::LeftToRight).unwrap();

        assert!(matcher.is_match("a.b"));
        assert!(!matcher.is_match("axb"));
    }

    #[test]
    fn test_invalid_line_fails() {
        let err = words().compile("broken", &["ok", "(unclosed"], Direction::LeftToRight);
        assert!(matches!(err, Err(FilterError::Compile { ref source_name, .. }) if source_name == "broken"));
    }

    #[test]
    fn test_empty_source_fails() {
        let err = words().compile("empty", &["# only comments"], Direction::LeftToRight);
        assert!(err.is_err());
    }

    #[test]
    fn test_right_to_left_visits_backwards() {
        let matcher = words().compile("he", &["ab"], Direction::RightToLeft).unwrap();

        assert_eq!(matcher.find_spans("ab x ab"), vec![5..7, 0..2]);
    }

    #[test]
    fn test_diagnostic_attribution() {
        let compiler = words().diagnostic(true);
        let matcher = compiler
            .compile("test", &["foo", "ba[rz]"], Direction::LeftToRight)
            .unwrap();

        assert!(matcher.is_diagnostic());
        let found = matcher.attribute("baz and foo");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], Attribution { line: "foo".to_string(), span: 8..11 });
        assert_eq!(found[1], Attribution { line: "ba[rz]".to_string(), span: 0..3 });
        assert_eq!(matcher.find_spans("baz and foo"), vec![0..3, 8..11]);
    }

    #[test]
    fn test_diagnostic_keeps_combined_spans() {
        let lines = ["bad", "bad ass", "ass"];
        let plain = words().compile("en", &lines, Direction::LeftToRight).unwrap();
        let diagnostic = words()
            .diagnostic(true)
            .compile("en", &lines, Direction::LeftToRight)
            .unwrap();

        let text = "you bad ass";
        assert_eq!(plain.find_spans(text), vec![4..7, 8..11]);
        assert_eq!(diagnostic.find_spans(text), plain.find_spans(text));
        assert_eq!(diagnostic.attribute(text).len(), 3);
    }

    #[test]
    fn test_domain_template() {
        let compiler = PatternCompiler::new(PatternTemplate::DOMAIN);
        let matcher = compiler
            .compile("spam", &[r"badsite\.com"], Direction::LeftToRight)
            .unwrap();

        assert_eq!(matcher.find_spans("go to https://www.badsite.com/x?y=1 now"), vec![6..35]);
        assert!(matcher.is_match("badsite.com:8080"));
        assert!(!matcher.is_match("goodsite.org"));
        assert!(!matcher.is_match("notbadsite.com"));
        assert!(matcher.is_match("mail.notbadsite.badsite.com"));
    }
}
