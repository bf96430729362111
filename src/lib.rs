//! # Text Filter
//!
//! Source-based text filtering: bad words, domains, shouting capitalization
//! and runaway punctuation.
//!
//! ## Features
//!
//! - **Named sources**: every word list is registered under a name and can be
//!   queried alone, together with others, or removed again
//! - **Normalization**: spaced-out letters, noise characters and leet-speak
//!   are decoded before matching, while results refer to the original text
//! - **Whole-word matching**: list entries never match inside larger words
//! - **Domains**: list entries match with scheme, sub domains, port and path
//! - **Encoding detection**: word lists in UTF-16 or legacy code pages load
//!   transparently
//! - **Parallel batch processing**: the `text-filter` binary filters large
//!   inputs line by line on all cores
//!
//! ## Usage
//!
//! ```bash
//! # Mask bad words from every list in ./lists
//! text-filter -i chat.log -w ./lists
//!
//! # Print the lines containing a listed domain
//! text-filter -i chat.log -d ./domains.txt --action check
//! ```
//!
//! ## Example
//!
//! ```rust
//! use text_filter::{BadWordFilter, Direction, Filter, SourceFilter};
//!
//! let mut filter = BadWordFilter::default();
//! filter.add_source("english", Direction::LeftToRight, &["bad", "worse"]).unwrap();
//!
//! assert!(filter.contains("a bad day", &[]));
//! assert_eq!(filter.replace_all("a bad day", &["english"]), "a *** day");
//! ```

pub mod bad_word;
pub mod capitalization;
pub mod cli;
pub mod compiler;
pub mod domain;
pub mod encoding;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod processor;
pub mod progress;
pub mod punctuation;
pub mod query;
pub mod registry;

pub use bad_word::{BadWordFilter, BadWordOptions};
pub use capitalization::CapitalizationFilter;
pub use cli::Args;
pub use compiler::{CompiledMatcher, Direction, PatternCompiler, PatternSyntax, PatternTemplate};
pub use domain::{DomainFilter, DomainOptions};
pub use error::{FilterError, Result};
pub use normalize::{normalize, NormalizeOptions, ReplaceMode};
pub use processor::{FilterSet, Processor, ProcessorConfig};
pub use punctuation::PunctuationFilter;
pub use query::{Filter, LoadReport, Mask, SourceAttribution, SourceFilter, SourceSpec};
pub use registry::SourceRegistry;
