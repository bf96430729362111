//! Query engine
//!
//! Shared machinery behind every filter: the [`Filter`] and [`SourceFilter`]
//! traits, source selection, span collection over normalized text and the
//! single-pass rebuild used by `replace_all`.
//!
//! All spans handed out by this module are byte ranges of the caller's
//! original text, never of the normalized copy.

use crate::compiler::{Direction, PatternCompiler};
use crate::error::{FilterError, Result};
use crate::loader;
use crate::normalize::{NormalizeOptions, Normalized};
use crate::registry::{SourceEntry, SourceRegistry};
use rand::seq::SliceRandom;
use std::borrow::Cow;
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Match / replace queries common to all filters.
///
/// `sources` restricts the query to the named sources; an empty slice means
/// every registered source. Filters without sources ignore it.
pub trait Filter {
    /// Short name used in logs and reports
    fn kind(&self) -> &'static str;

    /// Whether `text` contains at least one match
    fn contains(&self, text: &str, sources: &[&str]) -> bool;

    /// Every distinct matched substring of `text`, sorted ascending
    fn get_all(&self, text: &str, sources: &[&str]) -> Vec<String>;

    /// `text` with every match replaced. Borrowed if nothing matched.
    fn replace_all<'a>(&self, text: &'a str, sources: &[&str]) -> Cow<'a, str>;
}

/// A filter whose patterns come from named sources
pub trait SourceFilter: Filter {
    fn engine(&self) -> &SourceEngine;

    fn engine_mut(&mut self) -> &mut SourceEngine;

    fn compiler(&self) -> &PatternCompiler;

    /// Compile `lines` and register them as `name`.
    ///
    /// Adding a name that is already registered is a no-op. A source whose
    /// lines do not compile is not registered and the error is returned.
    fn add_source<S: AsRef<str>>(&mut self, name: &str, direction: Direction, lines: &[S]) -> Result<()> {
        if name.trim().is_empty() {
            return Err(FilterError::invalid_argument("source name must not be empty"));
        }

        if self.engine().registry().contains(name) {
            log::debug!("{}: source '{}' already loaded", self.kind(), name);
            return Ok(());
        }

        let matcher = self.compiler().compile(name, lines, direction).map_err(|e| {
            log::error!("{}: {}", self.kind(), e);
            e
        })?;

        self.engine_mut().registry_mut().add(name, SourceEntry::new(matcher))?;
        Ok(())
    }

    fn remove_source(&mut self, name: &str) -> Result<bool> {
        self.engine_mut().registry_mut().remove(name)
    }

    fn contains_source(&self, name: &str) -> bool {
        self.engine().registry().contains(name)
    }

    fn clear_sources(&mut self) {
        self.engine_mut().registry_mut().clear();
    }

    fn source_names(&self) -> Vec<String> {
        self.engine().registry().names()
    }

    fn source_count(&self) -> usize {
        self.engine().registry().len()
    }

    /// True while at least one source is registered
    fn is_loaded(&self) -> bool {
        !self.engine().registry().is_empty()
    }

    /// Register several sources. Failing sources are logged and reported,
    /// the others stay usable.
    fn load<I>(&mut self, specs: I) -> LoadReport
    where
        I: IntoIterator<Item = SourceSpec>,
    {
        let mut report = LoadReport::default();

        for spec in specs {
            if self.contains_source(&spec.name) {
                report.skipped.push(spec.name);
                continue;
            }

            match self.add_source(&spec.name, spec.direction, &spec.lines) {
                Ok(()) => report.loaded.push(spec.name),
                Err(e) => report.failed.push((spec.name, e)),
            }
        }

        log::info!(
            "{}: loaded {} sources ({} skipped, {} failed)",
            self.kind(),
            report.loaded.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    /// Load one source per file. Read errors abort the call.
    fn load_files<I, P>(&mut self, files: I) -> Result<LoadReport>
    where
        I: IntoIterator<Item = (String, P)>,
        P: AsRef<Path>,
    {
        let mut specs = Vec::new();
        for (name, path) in files {
            specs.push(SourceSpec::new(name, loader::read_lines(path.as_ref())?));
        }
        Ok(self.load(specs))
    }

    /// Load every matching file of a directory, named after its file stem
    fn load_dir(&mut self, dir: &Path, recursive: bool, extensions: &[String]) -> Result<LoadReport> {
        let files: Vec<(String, PathBuf)> = loader::collect_files(dir, recursive, extensions)?;
        self.load_files(files)
    }
}

/// Raw lines for one named source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub direction: Direction,
    pub lines: Vec<String>,
}

impl SourceSpec {
    pub fn new(name: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            name: name.into(),
            direction: Direction::LeftToRight,
            lines,
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// Outcome of a load call
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    /// Names that were already registered
    pub skipped: Vec<String>,
    pub failed: Vec<(String, FilterError)>,
}

impl LoadReport {
    /// A load succeeds if any source was registered
    pub fn is_success(&self) -> bool {
        !self.loaded.is_empty()
    }

    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FilterError::NoSourceLoaded)
        }
    }
}

/// A diagnostic match: which line of which source matched what
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAttribution {
    pub source: String,
    pub line: String,
    pub matched: String,
}

/// Characters used to cover matched text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    chars: Vec<char>,
}

impl Mask {
    /// Falls back to `*` when `chars` is empty
    pub fn new(chars: impl IntoIterator<Item = char>) -> Self {
        let mut chars: Vec<char> = chars.into_iter().collect();
        if chars.is_empty() {
            chars.push('*');
        }
        Self { chars }
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// `len` mask characters, picked at random if there is more than one
    pub fn apply(&self, len: usize) -> String {
        if let [only] = self.chars[..] {
            return std::iter::repeat(only).take(len).collect();
        }

        let mut rng = rand::thread_rng();
        (0..len)
            .map(|_| *self.chars.choose(&mut rng).unwrap_or(&'*'))
            .collect()
    }

    /// One mask character per character of `matched`
    pub fn cover(&self, matched: &str) -> String {
        self.apply(matched.chars().count())
    }
}

impl Default for Mask {
    fn default() -> Self {
        Self::new(['*'])
    }
}

/// Registry plus the normalization applied before matching
#[derive(Debug, Default)]
pub struct SourceEngine {
    registry: SourceRegistry,
    normalize: NormalizeOptions,
    simple_check: bool,
}

impl SourceEngine {
    pub fn new(normalize: NormalizeOptions, simple_check: bool) -> Self {
        Self {
            registry: SourceRegistry::new(),
            normalize,
            simple_check,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SourceRegistry {
        &mut self.registry
    }

    pub fn normalize_options(&self) -> &NormalizeOptions {
        &self.normalize
    }

    pub fn set_normalize_options(&mut self, normalize: NormalizeOptions) {
        self.normalize = normalize;
    }

    pub fn simple_check(&self) -> bool {
        self.simple_check
    }

    pub fn set_simple_check(&mut self, simple_check: bool) {
        self.simple_check = simple_check;
    }

    /// Entries to search. Unknown names are logged and skipped.
    pub fn select<'r>(&'r self, sources: &[&str]) -> Vec<(&'r str, &'r SourceEntry)> {
        if sources.is_empty() {
            return self.registry.iter().collect();
        }

        let mut selected = Vec::with_capacity(sources.len());
        for &name in sources {
            match self.registry.get_named(name) {
                Some(named) => selected.push(named),
                None => log::warn!("Source '{}' is not loaded, skipping", name),
            }
        }
        selected
    }

    pub fn contains(&self, text: &str, sources: &[&str]) -> bool {
        let normalized = Normalized::new(text, &self.normalize);
        let selected = self.select(sources);

        if self.simple_check {
            let lowered = normalized.to_lowercase();
            return selected
                .iter()
                .any(|(_, entry)| entry.words().iter().any(|w| lowered.as_str().contains(w.as_str())));
        }

        selected
            .iter()
            .any(|(_, entry)| entry.matcher().is_match(normalized.as_str()))
    }

    /// Matched spans of the original text, in source order then match order
    pub fn find_spans(&self, text: &str, sources: &[&str]) -> Vec<Range<usize>> {
        let normalized = Normalized::new(text, &self.normalize);
        let mut spans = Vec::new();

        if self.simple_check {
            let lowered = normalized.to_lowercase();
            for (_, entry) in self.select(sources) {
                for word in entry.words() {
                    for (idx, found) in lowered.as_str().match_indices(word.as_str()) {
                        spans.extend(lowered.original_span(idx..idx + found.len()));
                    }
                }
            }
            return spans;
        }

        for (name, entry) in self.select(sources) {
            for span in entry.matcher().find_spans(normalized.as_str()) {
                if let Some(original) = normalized.original_span(span) {
                    log::trace!("Source '{}' matched '{}'", name, &text[original.clone()]);
                    spans.push(original);
                }
            }
        }
        spans
    }

    pub fn get_all(&self, text: &str, sources: &[&str]) -> Vec<String> {
        sorted_unique(text, &self.find_spans(text, sources))
    }

    /// Per-line matches of sources compiled in diagnostic mode
    pub fn attribute(&self, text: &str, sources: &[&str]) -> Vec<SourceAttribution> {
        let normalized = Normalized::new(text, &self.normalize);
        let mut found = Vec::new();

        for (name, entry) in self.select(sources) {
            for attribution in entry.matcher().attribute(normalized.as_str()) {
                if let Some(span) = normalized.original_span(attribution.span) {
                    found.push(SourceAttribution {
                        source: name.to_string(),
                        line: attribution.line,
                        matched: text[span].to_string(),
                    });
                }
            }
        }
        found
    }
}

/// Guard shared by all queries: empty text or an unloaded filter short-circuit
/// to the neutral result.
pub(crate) fn should_query(kind: &str, operation: &str, text: &str, loaded: bool) -> bool {
    if text.is_empty() {
        log::warn!("{}::{}: text is empty", kind, operation);
        return false;
    }
    if !loaded {
        log::warn!("{}::{}: no sources loaded", kind, operation);
        return false;
    }
    true
}

/// Distinct substrings of `text` covered by `spans`, sorted ascending
pub(crate) fn sorted_unique(text: &str, spans: &[Range<usize>]) -> Vec<String> {
    spans
        .iter()
        .map(|span| &text[span.clone()])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Rebuild `text` left to right, copying unmatched text verbatim and
/// replacing each span. Spans overlapping an earlier (or longer, at the same
/// start) span are dropped.
pub(crate) fn rebuild<'a, F>(text: &'a str, mut spans: Vec<Range<usize>>, mut replace: F) -> Cow<'a, str>
where
    F: FnMut(&str) -> String,
{
    if spans.is_empty() {
        return Cow::Borrowed(text);
    }

    spans.sort_by_key(|s| (s.start, Reverse(s.end)));

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        if span.start < cursor {
            continue;
        }
        out.push_str(&text[cursor..span.start]);
        out.push_str(&replace(&text[span.clone()]));
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);

    Cow::Owned(out)
}
