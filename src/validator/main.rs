//! Standalone validator for the premium allowlist file.
//!
//! The bot silently treats a corrupt allowlist as empty. This tool is the
//! loud path: it reports parse errors and suspicious entries and exits with a
//! non-zero status when the file needs fixing.

use std::process::ExitCode;

use clap::Parser;

use bio_check_bot::access::{ACCESS_FILE_NAME, AccessStore, audit_ids};

/// Premium allowlist validator.
#[derive(Parser, Debug)]
#[command(name = "validate_access")]
#[command(about = "Validates the premium allowlist used by the bio check bot")]
#[command(version)]
struct Args {
    /// Path to the allowlist JSON file.
    #[arg(short, long, default_value = ACCESS_FILE_NAME)]
    file: String,

    /// Owner's Telegram user id, to flag it if listed redundantly.
    #[arg(short, long)]
    owner: Option<i64>,

    /// Print every id.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    validate_access(&args.file, args.owner, args.verbose)
}

fn validate_access(path: &str, owner: Option<i64>, verbose: bool) -> ExitCode {
    println!("Validating: {path}\n");

    let ids = match AccessStore::new(path).load_raw() {
        Ok(ids) => ids,
        Err(e) => {
            eprintln!("✗ {e}");
            eprintln!("  The bot treats this file as an empty allowlist.");
            return ExitCode::FAILURE;
        }
    };

    if verbose {
        for id in &ids {
            println!("  • {id}");
        }
        println!();
    }

    let issues = audit_ids(&ids, owner);
    let mut errors = 0;
    for issue in &issues {
        if issue.is_error() {
            errors += 1;
            println!("  ✗ Error: {issue}");
        } else {
            println!("  ⚠ Warning: {issue}");
        }
    }
    let warnings = issues.len() - errors;

    if !issues.is_empty() {
        println!();
    }

    if errors == 0 {
        println!("✓ Allowlist is valid ({} id(s)).", ids.len());
        if warnings > 0 {
            println!("  ({warnings} warning(s))");
        }
        ExitCode::SUCCESS
    } else {
        println!("✗ Validation failed: {errors} error(s), {warnings} warning(s)");
        ExitCode::FAILURE
    }
}
