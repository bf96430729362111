//! Text Filter - source-based bad-word, domain, capitalization and
//! punctuation filtering
//!
//! Main entry point for the command-line application.

use clap::Parser;
use std::process;

use text_filter::cli::Args;
use text_filter::processor::{Processor, ProcessorConfig};
use text_filter::progress::{print_banner, print_error, print_header, print_info};

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging
    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    } else if args.quiet {
        std::env::set_var("RUST_LOG", "error");
    } else if args.diagnostic {
        std::env::set_var("RUST_LOG", "info");
    } else if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    // Configure thread pool
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    // Run the application
    if let Err(e) = run(args) {
        print_error(&format!("{}", e));

        for cause in e.chain().skip(1) {
            print_error(&format!("  Caused by: {}", cause));
        }

        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if !args.quiet {
        print_banner();
    }

    args.validate()?;

    let config = ProcessorConfig::from_args(&args)?;

    if !args.quiet && args.verbose {
        print_config(&args, &config);
    }

    let processor = Processor::new(config)?;
    processor.process(args.input.as_deref(), args.output.as_deref())?;

    Ok(())
}

/// Print configuration summary
fn print_config(args: &Args, config: &ProcessorConfig) {
    print_header("Configuration");

    match args.input {
        Some(ref input) => print_info(&format!("Input:        {:?}", input)),
        None => print_info("Input:        <stdin>"),
    }
    match args.output {
        Some(ref output) => print_info(&format!("Output:       {:?}", output)),
        None => print_info("Output:       <stdout>"),
    }

    print_info(&format!("Action:       {:?}", config.action));
    if !config.words.is_empty() {
        print_info(&format!("Word lists:   {:?}", config.words));
    }
    if !config.domains.is_empty() {
        print_info(&format!("Domain lists: {:?}", config.domains));
    }
    if !config.sources.is_empty() {
        print_info(&format!("Sources:      {}", config.sources.join(", ")));
    }
    if !config.rtl_sources.is_empty() {
        print_info(&format!("Right-to-left: {}", config.rtl_sources.join(", ")));
    }
    print_info(&format!("Mode:         {:?}", config.normalize.mode));
    print_info(&format!("Collapse:     {}", config.normalize.collapse_spaces));
    print_info(&format!("Syntax:       {:?}", config.syntax));
    if let Some(n) = config.max_caps {
        print_info(&format!("Max caps:     {}", n));
    }
    if let Some(n) = config.max_punct {
        print_info(&format!("Max punct:    {}", n));
    }
    print_info(&format!("Extensions:   {:?}", config.extensions));
    print_info(&format!("Buffer size:  {}", bytesize::ByteSize(config.buffer_size as u64)));
    print_info(&format!("Threads:      {}", args.threads.unwrap_or_else(num_cpus::get)));
}
