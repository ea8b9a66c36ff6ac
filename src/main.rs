// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and set up logging
// 2. Dispatch to the appropriate subcommand handler
// 3. Print a summary (or JSON)
// 4. Exit with the proper code (0 = ran to completion, 2 = fatal error)
//
// Broken or irrelevant citations do NOT change the exit code: they are
// findings, reported in the summary and saved in the result files.
// =============================================================================

// Module declarations - tells Rust about our other source files
mod checker; // src/checker/ - the verification passes
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - settings resolved from the CLI
mod domain; // src/domain/ - capability record model
mod error; // src/error.rs - typed errors
mod fetch; // src/fetch/ - rate-limited HTTP
mod maintenance; // src/maintenance/ - redirect repair, fixes, broken report
mod report; // src/report.rs - human-readable output
mod store; // src/store/ - capability records and result files

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use checker::{ReachabilityRecord, RelevanceRecord, SemanticVerifier};
use cli::{Cli, Commands, VerifyArgs};
use config::Settings;
use fetch::{HttpFetcher, RateLimiter, SystemClock};
use store::{CapabilityStore, PassName, ResultStore};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // Fatal errors (bad fix file, unreadable record) exit with code 2
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so --json output on stdout stays parseable.
// RUST_LOG overrides the default filter.
fn init_logging(quiet: bool) {
    let default = if quiet { "citation_guardian=warn" } else { "citation_guardian=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let settings = Settings::from_cli(&cli);
    let capabilities = CapabilityStore::new(&settings.data_dir);
    let results = ResultStore::new(&settings.data_dir);
    let subjects = settings.subjects(&capabilities)?;

    match cli.command.unwrap_or(Commands::Verify(VerifyArgs::default())) {
        Commands::Verify(args) => handle_verify(&settings, &capabilities, &results, &subjects, &args).await,
        Commands::FixRedirects { dry_run } => handle_fix_redirects(&settings, &capabilities, &results, &subjects, dry_run),
        Commands::ApplyFixes { fixes_file, dry_run } => {
            handle_apply_fixes(&settings, &capabilities, &subjects, &fixes_file, dry_run)
        }
        Commands::Report => handle_report(&settings, &results, &subjects),
    }
}

// Handles the 'verify' subcommand
//
// Runs the selected passes subject by subject. Each subject's results are
// saved as soon as its pass completes; an interrupted run leaves the files
// of unfinished subjects untouched.
async fn handle_verify(
    settings: &Settings,
    capabilities: &CapabilityStore,
    results: &ResultStore,
    subjects: &[String],
    args: &VerifyArgs,
) -> Result<i32> {
    let limiter = Arc::new(RateLimiter::new(settings.rate_limit, Arc::new(SystemClock)));
    let fetcher = HttpFetcher::new(&settings.fetch, limiter)?;

    // Load every record up front; subjects without a usable one are skipped
    // so one bad record never stops the others from being verified
    let mut documents = Vec::new();
    for subject in subjects {
        match capabilities.load(subject) {
            Ok(Some(document)) => documents.push((subject.clone(), document)),
            Ok(None) => warn!(subject = subject.as_str(), "No capability record, skipping"),
            Err(e) => warn!(subject = subject.as_str(), error = %e, "Unreadable capability record, skipping"),
        }
    }

    let mut output = BTreeMap::new();

    if args.run_reachability() {
        print_heading(settings, "Pass 1: URL Reachability");
        let mut pass: BTreeMap<String, Vec<ReachabilityRecord>> = BTreeMap::new();
        for (subject, document) in &documents {
            info!(subject = subject.as_str(), "Checking reachability");
            let records = checker::check_reachability(&fetcher, document, settings.concurrency).await;
            let saved = results.save(subject, PassName::Reachability, records)?;
            pass.insert(subject.clone(), saved.results);
        }
        if !settings.json {
            report::print_pass_summary(PassName::Reachability, &pass);
            println!();
        }
        output.insert(PassName::Reachability.as_str(), serde_json::to_value(&pass)?);
    }

    if args.run_relevance() {
        print_heading(settings, "Pass 2: Content Relevance");
        let mut pass: BTreeMap<String, Vec<RelevanceRecord>> = BTreeMap::new();
        for (subject, document) in &documents {
            info!(subject = subject.as_str(), "Checking relevance");
            let records = checker::check_relevance(&fetcher, document, settings.concurrency).await;
            let saved = results.save(subject, PassName::Relevance, records)?;
            pass.insert(subject.clone(), saved.results);
        }
        if !settings.json {
            report::print_pass_summary(PassName::Relevance, &pass);
            println!();
        }
        output.insert(PassName::Relevance.as_str(), serde_json::to_value(&pass)?);
    }

    if args.run_semantic() {
        print_heading(settings, "Pass 3: Semantic Verification");
        // No verifier ships with this tool; see checker::SemanticVerifier
        let verifier: Option<&dyn SemanticVerifier> = None;
        let mut pass: BTreeMap<String, Vec<RelevanceRecord>> = BTreeMap::new();
        for (subject, document) in &documents {
            let records = checker::check_semantics(verifier, &fetcher, subject, document, settings.concurrency).await;
            if let Some(records) = records {
                let saved = results.save(subject, PassName::Semantic, records)?;
                pass.insert(subject.clone(), saved.results);
            }
        }
        if !settings.json {
            if verifier.is_none() {
                println!("  (Not configured - plug in a SemanticVerifier to send page content");
                println!("   and capability claims to a model for semantic verification.)");
            } else {
                report::print_pass_summary(PassName::Semantic, &pass);
            }
            println!();
        }
        output.insert(PassName::Semantic.as_str(), serde_json::to_value(&pass)?);
    }

    if settings.json {
        print_json(&output)?;
    } else {
        println!("Verification complete.");
        println!("Results saved to {}/*/verification/", settings.data_dir.display());
        println!();
        println!("To auto-fix redirects:  citation-guardian fix-redirects");
        println!("To apply manual fixes:  citation-guardian apply-fixes fixes.json");
        println!("To view broken sources: citation-guardian report");
    }

    // Verification findings never fail the run
    Ok(0)
}

// Handles the 'fix-redirects' subcommand
fn handle_fix_redirects(
    settings: &Settings,
    capabilities: &CapabilityStore,
    results: &ResultStore,
    subjects: &[String],
    dry_run: bool,
) -> Result<i32> {
    print_heading(settings, "Fixing redirected URLs -> canonical targets");
    print_dry_run_banner(settings, dry_run);

    let today = maintenance::today();
    let Some(changes) = maintenance::fix_redirects(capabilities, results, subjects, today, dry_run)? else {
        if settings.json {
            print_json(&serde_json::json!({}))?;
        } else {
            println!("No reachability results found. Run verification first.");
        }
        return Ok(0);
    };

    if settings.json {
        print_json(&changes)?;
    } else {
        report::print_fix_report(&changes, dry_run);
        print_rerun_hint(&changes, dry_run);
    }
    Ok(0)
}

// Handles the 'apply-fixes' subcommand
//
// A missing or malformed fixes file is the one fatal error of this tool
fn handle_apply_fixes(
    settings: &Settings,
    capabilities: &CapabilityStore,
    subjects: &[String],
    fixes_file: &Path,
    dry_run: bool,
) -> Result<i32> {
    let fixes = maintenance::load_fixes(fixes_file)?;

    let name = fixes_file.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    print_heading(settings, &format!("Applying URL fixes from {}", name));
    print_dry_run_banner(settings, dry_run);

    let changes = maintenance::apply_fixes(capabilities, subjects, &fixes, maintenance::today(), dry_run)?;

    if settings.json {
        print_json(&changes)?;
    } else {
        report::print_fix_report(&changes, dry_run);
        print_rerun_hint(&changes, dry_run);
    }
    Ok(0)
}

// Handles the 'report' subcommand
fn handle_report(settings: &Settings, results: &ResultStore, subjects: &[String]) -> Result<i32> {
    print_heading(settings, "Broken sources report");

    match maintenance::report_broken(results, subjects)? {
        Some(report) if settings.json => print_json(&report)?,
        Some(report) => report::print_broken_report(&report),
        None if settings.json => print_json(&serde_json::json!({}))?,
        None => println!("No reachability results found. Run verification first."),
    }
    Ok(0)
}

fn print_heading(settings: &Settings, title: &str) {
    if !settings.json {
        println!("{}", title);
        println!("{}", "-".repeat(40));
    }
}

fn print_dry_run_banner(settings: &Settings, dry_run: bool) {
    if dry_run && !settings.json {
        println!("(DRY RUN - no files will be modified)");
        println!();
    }
}

fn print_rerun_hint(changes: &maintenance::ChangeSet, dry_run: bool) {
    if !dry_run && changes.values().any(|c| !c.is_empty()) {
        println!("Run verification again to confirm fixes:");
        println!("  citation-guardian verify");
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
