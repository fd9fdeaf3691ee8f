use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use layout_canon_core::canonicalize::{DEFAULT_BASE_ID, DEFAULT_ROOT_MARKER, MAX_BASE_ID};
use layout_canon_core::check::Severity;
use layout_canon_core::hash::semantic_hash_with;
use layout_canon_core::{
    canonicalize_with, check, CanonicalizeOptions, Error, Result, StorageLayout, StorageSlot,
};

/// layout-canon — deterministic solc storage layouts
///
/// Canonicalize, check, hash and compare storage-layout snapshots.
#[derive(Parser)]
#[command(name = "layout-canon", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct CanonArgs {
    /// First canonical id
    #[arg(
        long,
        default_value_t = DEFAULT_BASE_ID,
        value_parser = clap::value_parser!(u64).range(..=MAX_BASE_ID)
    )]
    base_id: u64,
    /// Path component marking the repository root in absolute contract paths
    #[arg(long, default_value = DEFAULT_ROOT_MARKER)]
    root_marker: String,
}

impl CanonArgs {
    fn options(&self) -> CanonicalizeOptions {
        CanonicalizeOptions::default()
            .with_base_id(self.base_id)
            .with_root_marker(self.root_marker.clone())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a layout to canonical form
    Canonicalize {
        /// Path to storage-layout JSON
        file: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Exit 1 if the file is not already canonical; write nothing
        #[arg(long)]
        check: bool,
        #[command(flatten)]
        canon: CanonArgs,
    },

    /// Check referential closure of a layout
    Check {
        /// Path to storage-layout JSON
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the semantic hash (SHA-256) of a layout
    Hash {
        /// Path to storage-layout JSON
        file: PathBuf,
        #[command(flatten)]
        canon: CanonArgs,
    },

    /// Compare the canonical forms of two layouts
    Diff {
        /// First layout
        file_a: PathBuf,
        /// Second layout
        file_b: PathBuf,
        #[command(flatten)]
        canon: CanonArgs,
    },

    /// Show version information
    Version,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Canonicalize {
            file,
            output,
            check,
            canon,
        } => cmd_canonicalize(&file, output.as_deref(), check, &canon.options()),
        Commands::Check { file, json } => cmd_check(&file, json),
        Commands::Hash { file, canon } => cmd_hash(&file, &canon.options()),
        Commands::Diff {
            file_a,
            file_b,
            canon,
        } => cmd_diff(&file_a, &file_b, &canon.options()),
        Commands::Version => {
            println!("layout-canon {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    };

    let exit_code = outcome.unwrap_or_else(|e| {
        eprintln!("{} {}", "error:".red().bold(), e);
        2
    });
    process::exit(exit_code);
}

/// Install a stderr subscriber when `RUST_LOG` is set,
/// e.g. `RUST_LOG=layout_canon_core=debug`.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn read_layout(path: &Path) -> Result<StorageLayout> {
    read_layout_text(path).map(|(_, layout)| layout)
}

/// The file's raw text alongside the parsed layout
fn read_layout_text(path: &Path) -> Result<(String, StorageLayout)> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let layout = StorageLayout::from_json(&text)?;
    tracing::debug!(path = %path.display(), slots = layout.storage.len(), "read layout");
    Ok((text, layout))
}

// ── Commands ──────────────────────────────────────────────

fn cmd_canonicalize(
    file: &Path,
    output: Option<&Path>,
    check_only: bool,
    options: &CanonicalizeOptions,
) -> Result<i32> {
    let (text, layout) = read_layout_text(file)?;
    let json = canonicalize_with(&layout, options).to_json_pretty()?;

    // Compared byte for byte, not structurally
    if check_only {
        if text == json {
            println!("{} {} is canonical", "✓".green(), file.display());
            return Ok(0);
        }
        eprintln!(
            "{} {} is not canonical; run `layout-canon canonicalize -o`",
            "✗".red(),
            file.display()
        );
        return Ok(1);
    }

    match output {
        Some(path) => {
            fs::write(path, json).map_err(|e| Error::io(path, e))?;
            eprintln!("{} wrote {}", "✓".green(), path.display());
        }
        None => print!("{}", json),
    }
    Ok(0)
}

fn cmd_check(file: &Path, json: bool) -> Result<i32> {
    let layout = read_layout(file)?;
    let result = check(&layout);

    if json {
        let report = serde_json::json!({
            "file": file.display().to_string(),
            "valid": result.is_valid(),
            "errors": result.errors().len(),
            "warnings": result.warnings().len(),
            "diagnostics": result.diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for diagnostic in &result.diagnostics {
            let line = diagnostic.to_string();
            if diagnostic.severity == Severity::Error {
                eprintln!("{}", line.red());
            } else {
                eprintln!("{}", line.yellow());
            }
        }
        if result.is_valid() {
            println!("{} {} is valid", "✓".green(), file.display());
        } else {
            eprintln!(
                "{} {} has {} error(s)",
                "✗".red(),
                file.display(),
                result.errors().len()
            );
        }
    }

    Ok(if result.is_valid() { 0 } else { 1 })
}

fn cmd_hash(file: &Path, options: &CanonicalizeOptions) -> Result<i32> {
    let layout = read_layout(file)?;
    println!("{}", semantic_hash_with(&layout, options)?);
    Ok(0)
}

fn cmd_diff(file_a: &Path, file_b: &Path, options: &CanonicalizeOptions) -> Result<i32> {
    let a = canonicalize_with(&read_layout(file_a)?, options);
    let b = canonicalize_with(&read_layout(file_b)?, options);

    if a == b {
        println!("{} layouts are identical", "✓".green());
        return Ok(0);
    }

    for line in layout_diff(&a, &b) {
        println!("{}", line);
    }
    Ok(1)
}

/// Human-readable differences between two canonical layouts
fn layout_diff(a: &StorageLayout, b: &StorageLayout) -> Vec<String> {
    let mut lines = Vec::new();

    let slots = a.storage.len().max(b.storage.len());
    for i in 0..slots {
        match (a.storage.get(i), b.storage.get(i)) {
            (Some(x), Some(y)) if x == y => {}
            (x, y) => {
                lines.push(format!("storage[{}]:", i));
                if let Some(x) = x {
                    lines.push(format!("- {}", describe_slot(x)).red().to_string());
                }
                if let Some(y) = y {
                    lines.push(format!("+ {}", describe_slot(y)).green().to_string());
                }
            }
        }
    }

    for name in a.types.keys().filter(|k| !b.types.contains_key(*k)) {
        lines.push(format!("- type {}", name).red().to_string());
    }
    for name in b.types.keys().filter(|k| !a.types.contains_key(*k)) {
        lines.push(format!("+ type {}", name).green().to_string());
    }
    for (name, info) in &a.types {
        if let Some(other) = b.types.get(name) {
            if info != other {
                lines.push(format!("~ type {}", name).yellow().to_string());
            }
        }
    }

    lines
}

fn describe_slot(slot: &StorageSlot) -> String {
    format!(
        "{} {} slot={} offset={} ({})",
        slot.label, slot.type_id, slot.slot, slot.offset, slot.contract
    )
}
