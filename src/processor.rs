//! Core processing engine
//!
//! Builds the configured filters from the command line, then runs every
//! input line through them in parallel and writes the result in input order.

use crate::bad_word::{BadWordFilter, BadWordOptions};
use crate::capitalization::CapitalizationFilter;
use crate::cli::{Action, Args};
use crate::compiler::{Direction, PatternSyntax, DEFAULT_SIZE_LIMIT};
use crate::domain::{DomainFilter, DomainOptions};
use crate::encoding::LineReader;
use crate::loader;
use crate::normalize::NormalizeOptions;
use crate::output::{Destination, OutputWriter};
use crate::progress::{
    create_progress_bar, create_spinner, print_bullet, print_header, print_info, print_success, print_warning,
    ProcessingStats,
};
use crate::punctuation::PunctuationFilter;
use crate::query::{Filter, Mask, SourceAttribution, SourceFilter, SourceSpec};

use bytesize::ByteSize;
use colored::*;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Processor configuration
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub action: Action,
    /// Bad-word list files or directories
    pub words: Vec<PathBuf>,
    /// Domain list files or directories
    pub domains: Vec<PathBuf>,
    /// Query restriction, empty means every source
    pub sources: Vec<String>,
    pub rtl_sources: Vec<String>,
    pub normalize: NormalizeOptions,
    pub mask: Mask,
    pub simple_check: bool,
    pub syntax: PatternSyntax,
    pub diagnostic: bool,
    pub domain_prefix: String,
    pub domain_postfix: String,
    pub max_caps: Option<usize>,
    pub max_punct: Option<usize>,
    pub recursive: bool,
    pub extensions: Vec<String>,
    pub buffer_size: usize,
    pub quiet: bool,
    pub verbose: bool,
    pub show_stats: bool,
}

impl ProcessorConfig {
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        Ok(Self {
            action: args.action,
            words: args.words.clone(),
            domains: args.domains.clone(),
            sources: args.get_sources(),
            rtl_sources: args.get_rtl_sources(),
            normalize: args.normalize_options(),
            mask: Mask::new(args.mask.chars()),
            simple_check: args.simple_check,
            syntax: if args.literal { PatternSyntax::Literal } else { PatternSyntax::Regex },
            diagnostic: args.diagnostic,
            domain_prefix: args.domain_prefix.clone(),
            domain_postfix: args.domain_postfix.clone(),
            max_caps: args.max_caps,
            max_punct: args.max_punct,
            recursive: args.recursive,
            extensions: args.get_extensions(),
            buffer_size: args.parse_buffer_size()?,
            quiet: args.quiet,
            verbose: args.verbose,
            show_stats: args.stats,
        })
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            action: Action::Replace,
            words: Vec::new(),
            domains: Vec::new(),
            sources: Vec::new(),
            rtl_sources: Vec::new(),
            normalize: NormalizeOptions::default(),
            mask: Mask::default(),
            simple_check: false,
            syntax: PatternSyntax::Regex,
            diagnostic: false,
            domain_prefix: String::new(),
            domain_postfix: String::new(),
            max_caps: None,
            max_punct: None,
            recursive: false,
            extensions: vec!["txt".to_string()],
            buffer_size: crate::output::DEFAULT_BUFFER_SIZE,
            quiet: true,
            verbose: false,
            show_stats: false,
        }
    }
}

/// A source filter together with the sources it is queried with
struct Sourced<F> {
    filter: F,
    sources: Vec<String>,
}

impl<F: SourceFilter> Sourced<F> {
    /// `None` when a restriction is given and names none of this filter's
    /// sources; the filter then takes no part in the run.
    fn restrict(filter: F, requested: &[String]) -> Option<Self> {
        if requested.is_empty() {
            return Some(Self { filter, sources: Vec::new() });
        }

        let sources: Vec<String> = requested
            .iter()
            .filter(|name| filter.contains_source(name))
            .cloned()
            .collect();

        if sources.is_empty() {
            log::info!("{}: none of the requested sources are loaded, disabled", filter.kind());
            return None;
        }
        Some(Self { filter, sources })
    }

    fn source_refs(&self) -> Vec<&str> {
        self.sources.iter().map(String::as_str).collect()
    }
}

/// Every filter enabled for a run, applied in a fixed order: bad words,
/// domains, capitalization, punctuation.
pub struct FilterSet {
    bad_words: Option<Sourced<BadWordFilter>>,
    domains: Option<Sourced<DomainFilter>>,
    capitalization: Option<CapitalizationFilter>,
    punctuation: Option<PunctuationFilter>,
}

/// Matches found in one line
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineReport {
    /// Kinds of the filters that matched
    pub flagged_by: Vec<&'static str>,
    /// Distinct matches over all filters, sorted
    pub matches: Vec<String>,
}

impl LineReport {
    pub fn is_flagged(&self) -> bool {
        !self.flagged_by.is_empty()
    }
}

impl FilterSet {
    pub fn build(config: &ProcessorConfig) -> anyhow::Result<Self> {
        let bad_words = if config.words.is_empty() {
            None
        } else {
            let mut filter = BadWordFilter::new(BadWordOptions {
                normalize: config.normalize.clone(),
                mask: config.mask.clone(),
                simple_check: config.simple_check,
                diagnostic: config.diagnostic,
                syntax: config.syntax,
                size_limit: DEFAULT_SIZE_LIMIT,
            });
            load_lists(&mut filter, &config.words, config)?;
            Some(filter)
        };

        let domains = if config.domains.is_empty() {
            None
        } else {
            let mut filter = DomainFilter::new(DomainOptions {
                normalize: config.normalize.clone(),
                mask: config.mask.clone(),
                prefix: config.domain_prefix.clone(),
                postfix: config.domain_postfix.clone(),
                diagnostic: config.diagnostic,
                syntax: config.syntax,
                size_limit: DEFAULT_SIZE_LIMIT,
            });
            load_lists(&mut filter, &config.domains, config)?;
            Some(filter)
        };

        let loaded: Vec<Vec<String>> = [
            bad_words.as_ref().map(|f| f.source_names()),
            domains.as_ref().map(|f| f.source_names()),
        ]
        .into_iter()
        .flatten()
        .collect();
        for name in unknown_sources(&config.sources, &loaded) {
            log::warn!("Source '{}' is not loaded, skipping", name);
        }

        let bad_words = bad_words.and_then(|f| Sourced::restrict(f, &config.sources));
        let domains = domains.and_then(|f| Sourced::restrict(f, &config.sources));

        let capitalization = config.max_caps.map(CapitalizationFilter::new).transpose()?;
        let punctuation = config.max_punct.map(PunctuationFilter::new).transpose()?;

        Ok(Self {
            bad_words,
            domains,
            capitalization,
            punctuation,
        })
    }

    /// Kinds of the enabled filters, in application order
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        self.each(|filter, _| kinds.push(filter.kind()));
        kinds
    }

    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }

    /// Call `f` for every enabled filter with its query sources
    fn each<'s, F>(&'s self, mut f: F)
    where
        F: FnMut(&'s dyn Filter, &[&str]),
    {
        if let Some(sourced) = &self.bad_words {
            f(&sourced.filter, &sourced.source_refs());
        }
        if let Some(sourced) = &self.domains {
            f(&sourced.filter, &sourced.source_refs());
        }
        if let Some(filter) = &self.capitalization {
            f(filter, &[]);
        }
        if let Some(filter) = &self.punctuation {
            f(filter, &[]);
        }
    }

    pub fn check(&self, line: &str) -> LineReport {
        let mut report = LineReport::default();
        if line.is_empty() {
            return report;
        }

        let mut matches = BTreeSet::new();
        self.each(|filter, sources| {
            let found = filter.get_all(line, sources);
            if !found.is_empty() {
                report.flagged_by.push(filter.kind());
                matches.extend(found);
            }
        });

        report.matches = matches.into_iter().collect();
        report
    }

    /// `line` after every enabled filter has rewritten it
    pub fn replace<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(line);
        if line.is_empty() {
            return current;
        }

        self.each(|filter, sources| {
            let replaced = match filter.replace_all(&current, sources) {
                Cow::Owned(text) => Some(text),
                Cow::Borrowed(_) => None,
            };
            if let Some(text) = replaced {
                current = Cow::Owned(text);
            }
        });
        current
    }

    /// Which list line matched, for sources compiled in diagnostic mode
    pub fn attribute(&self, line: &str) -> Vec<SourceAttribution> {
        let mut found = Vec::new();
        if line.is_empty() {
            return found;
        }

        if let Some(sourced) = &self.bad_words {
            found.extend(sourced.filter.attribute(line, &sourced.source_refs()));
        }
        if let Some(sourced) = &self.domains {
            found.extend(sourced.filter.attribute(line, &sourced.source_refs()));
        }
        found
    }
}

/// Requested source names that no loaded filter holds
fn unknown_sources<'r>(requested: &'r [String], loaded: &[Vec<String>]) -> Vec<&'r str> {
    requested
        .iter()
        .filter(|name| !loaded.iter().any(|names| names.contains(*name)))
        .map(String::as_str)
        .collect()
}

/// Load word-list files and directories into `filter`, one source per file
fn load_lists<F: SourceFilter>(filter: &mut F, paths: &[PathBuf], config: &ProcessorConfig) -> anyhow::Result<()> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(loader::collect_files(path, config.recursive, &config.extensions)?);
        } else {
            let name = loader::source_name(path)
                .ok_or_else(|| anyhow::anyhow!("Cannot derive a source name from {:?}", path))?;
            files.push((name, path.clone()));
        }
    }

    if files.is_empty() {
        anyhow::bail!("{}: no list files found in {:?}", filter.kind(), paths);
    }

    let mut specs = Vec::with_capacity(files.len());
    for (name, path) in files {
        let lines = loader::read_lines(&path).map_err(|e| anyhow::anyhow!("Failed to read {:?}: {}", path, e))?;
        let direction = Direction::from_left_to_right(!config.rtl_sources.contains(&name));
        specs.push(SourceSpec::new(name, lines).with_direction(direction));
    }

    let report = filter.load(specs);

    if !config.quiet {
        for name in &report.loaded {
            print_bullet(&format!("{} source '{}'", filter.kind(), name));
        }
        for name in &report.skipped {
            print_warning(&format!("Duplicate source '{}' skipped", name));
        }
        for (name, err) in &report.failed {
            print_warning(&format!("Source '{}' not loaded: {}", name, err));
        }
    }

    report
        .into_result()
        .map_err(|e| anyhow::anyhow!("{}: {}", filter.kind(), e))?;
    Ok(())
}

/// Result of running one line through the filters
struct LineOutcome {
    /// Line to write, if any
    output: Option<String>,
    report: LineReport,
}

/// Main processor
pub struct Processor {
    config: ProcessorConfig,
    filters: FilterSet,
    stats: Arc<ProcessingStats>,
}

impl Processor {
    /// Load every configured list and build the filters
    pub fn new(config: ProcessorConfig) -> anyhow::Result<Self> {
        if !config.quiet {
            print_header("Loading filters...");
        }

        let spinner = create_spinner("Compiling word lists...", config.quiet);
        let filters = FilterSet::build(&config);
        spinner.finish_and_clear();
        let filters = filters?;

        if filters.is_empty() {
            anyhow::bail!("No filter is active for the requested sources: {:?}", config.sources);
        }

        if !config.quiet {
            print_success(&format!("Active filters: {}", filters.kinds().join(", ")));
        }

        Ok(Self {
            config,
            filters,
            stats: Arc::new(ProcessingStats::new()),
        })
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Filter `input` (stdin if `None`) and write the result to `output`
    /// (stdout if `None`)
    pub fn process(&self, input: Option<&Path>, output: Option<&Path>) -> anyhow::Result<()> {
        let lines = self.read_input(input)?;

        if !self.config.quiet {
            let total: usize = lines.iter().map(String::len).sum();
            print_header("Filtering...");
            print_info(&format!("{} lines ({})", lines.len(), ByteSize(total as u64)));
        }

        let outcomes = self.run(&lines);

        let destination = Destination::from_path(output);
        let mut writer = OutputWriter::new(destination.clone(), self.config.buffer_size)?;
        self.write(&mut writer, outcomes)?;
        writer.flush()?;

        if !self.config.quiet {
            if let Destination::File(path) = &destination {
                print_success(&format!("Output written to: {:?}", path));
            }
            print_info(&format!(
                "{} lines flagged, {} lines written",
                self.stats.get_flagged_lines(),
                writer.lines_written()
            ));
        }

        if self.config.show_stats && !self.config.quiet {
            self.stats.print_summary();
        }

        Ok(())
    }

    fn read_input(&self, input: Option<&Path>) -> anyhow::Result<Vec<String>> {
        match input {
            Some(path) => {
                let reader = LineReader::open(path).map_err(|e| anyhow::anyhow!("Failed to open {:?}: {}", path, e))?;
                log::debug!("Input encoding: {}", reader.encoding().name());
                Ok(reader.collect())
            }
            None => std::io::stdin()
                .lock()
                .lines()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e)),
        }
    }

    /// Filter all lines in parallel, keeping input order
    fn run(&self, lines: &[String]) -> Vec<LineOutcome> {
        let pb = create_progress_bar(lines.len() as u64, "Filtering...", self.config.quiet);

        let outcomes: Vec<LineOutcome> = lines
            .par_iter()
            .enumerate()
            .progress_with(pb.clone())
            .map(|(idx, line)| self.process_line(idx + 1, line))
            .collect();

        pb.finish_with_message("Complete".green().to_string());
        outcomes
    }

    fn process_line(&self, line_number: usize, line: &str) -> LineOutcome {
        self.stats.add_line(line.len() as u64 + 1);

        let report = self.filters.check(line);
        if report.is_flagged() {
            self.stats.add_flagged(report.matches.len() as u64);
            log::debug!("line {}: {:?} by {}", line_number, report.matches, report.flagged_by.join(", "));

            if self.config.diagnostic {
                for hit in self.filters.attribute(line) {
                    log::info!(
                        "line {}: '{}' matched by source '{}' pattern '{}'",
                        line_number,
                        hit.matched,
                        hit.source,
                        hit.line
                    );
                }
            }
        }

        let output = match self.config.action {
            Action::Check => report.is_flagged().then(|| format!("{}:{}", line_number, line)),
            Action::List => None,
            Action::Replace => match self.filters.replace(line) {
                Cow::Owned(text) => {
                    self.stats.add_replaced();
                    Some(text)
                }
                Cow::Borrowed(text) => Some(text.to_string()),
            },
        };

        LineOutcome { output, report }
    }

    fn write(&self, writer: &mut OutputWriter, outcomes: Vec<LineOutcome>) -> anyhow::Result<()> {
        if self.config.action == Action::List {
            let distinct: BTreeSet<String> = outcomes.into_iter().flat_map(|o| o.report.matches).collect();
            for matched in distinct {
                writer.write_line(&matched)?;
            }
            return Ok(());
        }

        for line in outcomes.into_iter().filter_map(|o| o.output) {
            writer.write_line(&line)?;
        }
        Ok(())
    }

    /// Get processing statistics
    pub fn stats(&self) -> Arc<ProcessingStats> {
        Arc::clone(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn lists(dir: &TempDir) -> PathBuf {
        let lists = dir.path().join("lists");
        fs::create_dir(&lists).unwrap();
        fs::write(lists.join("english.txt"), "# english\nbad\nworse\n").unwrap();
        fs::write(lists.join("german.txt"), "schlecht\n").unwrap();
        lists
    }

    fn config(dir: &TempDir, action: Action) -> ProcessorConfig {
        let domains = dir.path().join("domains.txt");
        fs::write(&domains, "example\\.com\n").unwrap();

        ProcessorConfig {
            action,
            words: vec![lists(dir)],
            domains: vec![domains],
            max_caps: Some(3),
            max_punct: Some(3),
            ..ProcessorConfig::default()
        }
    }

    fn run(config: ProcessorConfig, input: &str, dir: &TempDir) -> String {
        let input_path = dir.path().join("input.txt");
        let output_path = dir.path().join("output.txt");
        fs::write(&input_path, input).unwrap();

        let processor = Processor::new(config).unwrap();
        processor.process(Some(&input_path), Some(&output_path)).unwrap();
        fs::read_to_string(&output_path).unwrap()
    }

    #[test]
    fn test_replace_chains_filters() {
        let dir = TempDir::new().unwrap();
        let out = run(
            config(&dir, Action::Replace),
            "a bad day\nvisit example.com!!!!\nso LOUUUD\n\nclean\n",
            &dir,
        );

        assert_eq!(out, "a *** day\nvisit ***********!!!\nso Louuud\n\nclean\n");
    }

    #[test]
    fn test_check_prints_flagged_lines() {
        let dir = TempDir::new().unwrap();
        let out = run(config(&dir, Action::Check), "fine\nschlecht\nok\nworse\n", &dir);

        assert_eq!(out, "2:schlecht\n4:worse\n");
    }

    #[test]
    fn test_list_distinct_matches() {
        let dir = TempDir::new().unwrap();
        let out = run(config(&dir, Action::List), "bad bad\nworse and bad\nexample.com\n", &dir);

        assert_eq!(out, "bad\nexample.com\nworse\n");
    }

    #[test]
    fn test_source_restriction() {
        let dir = TempDir::new().unwrap();
        let config = ProcessorConfig {
            sources: vec!["german".to_string()],
            max_caps: None,
            max_punct: None,
            ..config(&dir, Action::Replace)
        };

        let processor = Processor::new(config).unwrap();
        assert_eq!(processor.filters().kinds(), vec!["BadWordFilter"]);
        assert_eq!(processor.filters().replace("bad schlecht"), "bad ********");
    }

    #[test]
    fn test_unknown_sources() {
        let loaded = vec![vec!["english".to_string(), "german".to_string()], vec!["domains".to_string()]];
        let requested = vec!["german".to_string(), "klingon".to_string(), "domains".to_string()];

        assert_eq!(unknown_sources(&requested, &loaded), vec!["klingon"]);
        assert!(unknown_sources(&[], &loaded).is_empty());
    }

    #[test]
    fn test_unknown_source_is_skipped() {
        let dir = TempDir::new().unwrap();
        let config = ProcessorConfig {
            sources: vec!["german".to_string(), "klingon".to_string()],
            ..config(&dir, Action::Replace)
        };

        let processor = Processor::new(config).unwrap();
        assert_eq!(processor.filters().replace("bad schlecht"), "bad ********");
    }

    #[test]
    fn test_rtl_source_loads() {
        let dir = TempDir::new().unwrap();
        let config = ProcessorConfig {
            rtl_sources: vec!["german".to_string()],
            ..config(&dir, Action::Replace)
        };

        let processor = Processor::new(config).unwrap();
        assert_eq!(processor.filters().replace("schlecht und schlecht"), "******** und ********");
    }

    #[test]
    fn test_check_report() {
        let dir = TempDir::new().unwrap();
        let processor = Processor::new(config(&dir, Action::Check)).unwrap();

        let report = processor.filters().check("BAAAD example.com");
        assert_eq!(report.flagged_by, vec!["DomainFilter", "CapitalizationFilter"]);
        assert_eq!(report.matches, vec!["BAAAD", "example.com"]);
        assert!(!processor.filters().check("").is_flagged());
    }

    #[test]
    fn test_no_list_files() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty");
        fs::create_dir(&empty).unwrap();

        let config = ProcessorConfig {
            words: vec![empty],
            ..ProcessorConfig::default()
        };
        assert!(Processor::new(config).is_err());
    }

    #[test]
    fn test_stats() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, Action::Replace);
        let input_path = dir.path().join("input.txt");
        fs::write(&input_path, "bad\nfine\n").unwrap();

        let processor = Processor::new(config).unwrap();
        processor
            .process(Some(&input_path), Some(&dir.path().join("out.txt")))
            .unwrap();

        let stats = processor.stats();
        assert_eq!(stats.get_total_lines(), 2);
        assert_eq!(stats.get_flagged_lines(), 1);
        assert_eq!(stats.get_replaced_lines(), 1);
    }
}
