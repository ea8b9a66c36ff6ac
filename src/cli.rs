// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Shape:
//   citation-guardian [global options] [COMMAND]
//
//   verify          (default) run the verification passes
//   fix-redirects   rewrite redirected URLs from the last reachability run
//   apply-fixes     apply an old -> new URL mapping file
//   report          list broken sources from the last reachability run
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "citation-guardian",
    version,
    about = "Verify and repair the source citations behind capability records",
    long_about = "citation-guardian checks that every cited source is still reachable and still \
                  substantiates the capability it backs, and helps repair citations whose pages moved."
)]
pub struct Cli {
    /// Directory holding one folder per subject
    ///
    /// Each subject folder contains capabilities/current.json; results are
    /// written next to it under verification/.
    #[arg(long, global = true, env = "CITATION_GUARDIAN_DATA_DIR", default_value = "agents")]
    pub data_dir: PathBuf,

    /// Only operate on this subject (folder name under --data-dir)
    #[arg(long, global = true)]
    pub subject: Option<String>,

    /// Output results in JSON format instead of a summary
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log warnings and errors
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Minimum time between two requests to the same domain, in milliseconds
    #[arg(long, global = true, default_value_t = 1000)]
    pub rate_limit_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, global = true, default_value_t = 15)]
    pub timeout_secs: u64,

    /// Maximum number of requests in flight for one subject
    #[arg(long, global = true, default_value_t = 16)]
    pub concurrency: usize,

    // Optional: running with no subcommand means `verify`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the verification passes (reachability and relevance by default)
    ///
    /// Example: citation-guardian verify --subject gemini-cli
    Verify(VerifyArgs),

    /// Rewrite redirected source URLs to their canonical targets
    ///
    /// Reads the saved reachability results; run `verify` first.
    FixRedirects {
        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply a URL replacement mapping file
    ///
    /// Example: citation-guardian apply-fixes fixes.json --dry-run
    ApplyFixes {
        /// JSON object mapping old URLs to new URLs (or {url, sourceGranularity})
        fixes_file: PathBuf,

        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the broken sources found by the last reachability run
    Report,
}

#[derive(Args, Debug, Default, Clone)]
pub struct VerifyArgs {
    /// Run only this pass (1 = reachability, 2 = relevance, 3 = semantic)
    #[arg(long = "pass", value_parser = clap::value_parser!(u8).range(1..=3))]
    pub only_pass: Option<u8>,

    /// Also run the semantic pass (pass 3)
    #[arg(long)]
    pub semantic: bool,
}

impl VerifyArgs {
    pub fn run_reachability(&self) -> bool {
        matches!(self.only_pass, None | Some(1))
    }

    pub fn run_relevance(&self) -> bool {
        matches!(self.only_pass, None | Some(2))
    }

    pub fn run_semantic(&self) -> bool {
        self.semantic || self.only_pass == Some(3)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does `global = true` do?
//    - The option can be given before OR after the subcommand
//    - `citation-guardian --subject x report` == `citation-guardian report --subject x`
//
// 2. Why Option<Commands>?
//    - A plain `Commands` field makes the subcommand required
//    - Option lets us fall back to `verify` when none is given
//
// 3. What is `env = "..."`?
//    - If the flag is not passed, clap reads the environment variable
//    - Needs the "env" feature of clap (see Cargo.toml)
//
// 4. What is value_parser!(u8).range(1..=3)?
//    - Parses the value as a u8 and rejects anything outside 1..=3
//    - The user gets a clear error message for free
// -----------------------------------------------------------------------------
