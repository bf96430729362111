//! Command-line interface definition for text-filter
//!
//! Provides argument parsing and validation for the text filtering tool.

use crate::normalize::{NormalizeOptions, ReplaceMode};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Source-based text filter
///
/// Flags or masks bad words and domains loaded from word lists, and tames
/// shouting capitalization and punctuation runs.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "text-filter",
    author = "m0h1nd4",
    version,
    about = "Source-based bad-word, domain, capitalization and punctuation filter",
    long_about = r#"
Filter text line by line against word lists loaded from files or directories.
Every word-list file is one source, named after its file stem
(english.txt -> "english"). Lines starting with '#' are comments.

EXAMPLES:
    # Mask bad words from all lists in ./lists
    text-filter -i chat.log -w ./lists

    # Only use the german list, decode leet speak and "s p a c e d" words
    text-filter -i chat.log -w ./lists -s german --mode leet-basic --collapse-spaces

    # Print the lines that contain a bad word or a listed domain
    text-filter -i chat.log -w ./lists -d ./domains.txt --action check

    # List every distinct match, one per line
    text-filter -i chat.log -w ./lists --action list

    # Tame SHOUTING and !!!!!! (more than 3 in a row)
    text-filter -i chat.log --max-caps 3 --max-punct 3
"#
)]
pub struct Args {
    /// Input file (default: stdin)
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Bad-word lists: files or directories (repeatable)
    #[arg(short, long, value_name = "PATH")]
    pub words: Vec<PathBuf>,

    /// Domain lists: files or directories (repeatable)
    #[arg(short, long, value_name = "PATH")]
    pub domains: Vec<PathBuf>,

    /// Restrict matching to these sources (comma separated)
    #[arg(short, long, value_name = "NAMES")]
    pub sources: Option<String>,

    /// Sources to match right-to-left (comma separated)
    #[arg(long, value_name = "NAMES")]
    pub rtl: Option<String>,

    /// What to do with the input
    #[arg(short, long, value_enum, default_value_t = Action::Replace)]
    pub action: Action,

    /// Normalization applied before matching
    #[arg(long, value_enum, default_value_t = ModeArg::None)]
    pub mode: ModeArg,

    /// Join spaced-out letters ("b a d") before matching
    #[arg(long, default_value_t = false)]
    pub collapse_spaces: bool,

    /// Tokens up to this length are joined by --collapse-spaces
    #[arg(long, value_name = "NUM", default_value_t = 1)]
    pub max_token_length: usize,

    /// Characters removed before matching
    #[arg(long, value_name = "CHARS", default_value = "")]
    pub strip_chars: String,

    /// Mask characters (picked at random if more than one)
    #[arg(long, value_name = "CHARS", default_value = "*")]
    pub mask: String,

    /// Plain substring matching for bad words (scripts without word boundaries)
    #[arg(long, default_value_t = false)]
    pub simple_check: bool,

    /// Treat list lines as literal words instead of regex fragments
    #[arg(long, default_value_t = false)]
    pub literal: bool,

    /// Compile one pattern per list line and log which line matched
    #[arg(long, default_value_t = false)]
    pub diagnostic: bool,

    /// Text written before a masked domain
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub domain_prefix: String,

    /// Text written after a masked domain
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub domain_postfix: String,

    /// Flag words with more than NUM consecutive capitals
    #[arg(long, value_name = "NUM")]
    pub max_caps: Option<usize>,

    /// Flag punctuation runs longer than NUM
    #[arg(long, value_name = "NUM")]
    pub max_punct: Option<usize>,

    /// Search list directories recursively
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Word-list file extensions (default: txt)
    #[arg(long, value_name = "EXT", default_value = "txt")]
    pub extensions: String,

    /// Number of threads (default: auto-detect)
    #[arg(short = 't', long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Output buffer size (default: 1MB)
    #[arg(long, value_name = "SIZE", default_value = "1MB")]
    pub buffer_size: String,

    /// Show detailed statistics
    #[arg(long, default_value_t = false)]
    pub stats: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Verbose mode - detailed logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// What the processor produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Print the lines that contain a match, with their line number
    Check,
    /// Print every distinct match, sorted
    List,
    /// Print the input with every match replaced
    Replace,
}

/// Normalization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    None,
    /// Strip everything but letters, digits and basic punctuation
    StripNonAlnum,
    LeetBasic,
    LeetAdvanced,
}

impl From<ModeArg> for ReplaceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::None => ReplaceMode::None,
            ModeArg::StripNonAlnum => ReplaceMode::StripNonAlphanumeric,
            ModeArg::LeetBasic => ReplaceMode::LeetBasic,
            ModeArg::LeetAdvanced => ReplaceMode::LeetAdvanced,
        }
    }
}

impl Args {
    /// Check that there is something to filter with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.words.is_empty() && self.domains.is_empty() && self.max_caps.is_none() && self.max_punct.is_none() {
            anyhow::bail!("At least one filter must be specified: --words, --domains, --max-caps or --max-punct");
        }

        for path in self.words.iter().chain(&self.domains) {
            if !path.exists() {
                anyhow::bail!("List path does not exist: {:?}", path);
            }
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                anyhow::bail!("Input file does not exist: {:?}", input);
            }
        }

        if self.mask.is_empty() {
            anyhow::bail!("--mask needs at least one character");
        }

        self.parse_buffer_size()?;
        Ok(())
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            mode: self.mode.into(),
            collapse_spaces: self.collapse_spaces,
            max_token_length: self.max_token_length,
            strip_chars: self.strip_chars.clone(),
        }
    }

    /// Source restriction for queries (empty means all)
    pub fn get_sources(&self) -> Vec<String> {
        self.sources.as_deref().map(parse_list).unwrap_or_default()
    }

    pub fn get_rtl_sources(&self) -> Vec<String> {
        self.rtl.as_deref().map(parse_list).unwrap_or_default()
    }

    /// Parse buffer size string to bytes
    pub fn parse_buffer_size(&self) -> anyhow::Result<usize> {
        parse_size(&self.buffer_size)
    }

    /// Parse word-list file extensions
    pub fn get_extensions(&self) -> Vec<String> {
        parse_list(&self.extensions)
            .into_iter()
            .map(|s| s.to_lowercase())
            .collect()
    }
}

/// Split a comma separated list, dropping empty entries
fn parse_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse human-readable size string to bytes
fn parse_size(size_str: &str) -> anyhow::Result<usize> {
    let size_str = size_str.trim().to_uppercase();

    let (num_str, multiplier) = if let Some(num) = size_str.strip_suffix("GB") {
        (num, 1024 * 1024 * 1024)
    } else if let Some(num) = size_str.strip_suffix("MB") {
        (num, 1024 * 1024)
    } else if let Some(num) = size_str.strip_suffix("KB") {
        (num, 1024)
    } else if let Some(num) = size_str.strip_suffix('B') {
        (num, 1)
    } else {
        (size_str.as_str(), 1)
    };

    let num: usize = num_str
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size format: '{}'", size_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Invalid size format: '{}'", size_str))
}
