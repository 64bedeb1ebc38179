//! chapterize - split numbered DOCX documents into chapter folders
//!
//! A CLI tool that recovers heading numbers from Word documents and writes
//! each chapter and section to its own ordered folder or file.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod cli;

use anyhow::{Context, Result};
use chapterize::config::{ChapterizeConfig, DEFAULT_CONFIG_FILE};
use chapterize::pipeline::{self, Conversion};
use chapterize::{writer, Diagnostic, SectionNode};
use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Main entry point for the chapterize CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            inputs,
            output,
            config,
            verbose,
        } => {
            init_logging(verbose);
            handle_split_command(&inputs, &output, config.as_deref())?;
        }

        Commands::Outline {
            input,
            config,
            json,
            verbose,
        } => {
            init_logging(verbose);
            handle_outline_command(&input, config.as_deref(), json)?;
        }

        Commands::InitConfig { path, force } => {
            handle_init_config_command(path, force)?;
        }
    }

    Ok(())
}

/// `RUST_LOG` applies as usual; `--verbose` raises the level to info
fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.init();
}

fn load_config(path: Option<&Path>) -> Result<ChapterizeConfig> {
    ChapterizeConfig::load_or_default(path).with_context(|| match path {
        Some(p) => format!("Failed to load configuration from {}", p.display()),
        None => format!("Failed to load {}", DEFAULT_CONFIG_FILE),
    })
}

/// Handle the split command
fn handle_split_command(inputs: &[PathBuf], output: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;

    let documents = pipeline::discover_inputs(inputs);
    if documents.is_empty() {
        anyhow::bail!("No .docx files found in the given inputs");
    }

    println!("Splitting {} document(s) into {}", documents.len(), output.display());

    let mut failures = 0usize;
    for (path, result) in pipeline::convert_all(&documents, &config) {
        let conversion = match result {
            Ok(conversion) => conversion,
            Err(e) => {
                eprintln!("✗ {}: {}", path.display(), e);
                failures += 1;
                continue;
            }
        };

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let written = writer::write_hierarchy(&conversion.root, stem, output, &config.output)
            .with_context(|| format!("Failed to write sections of {}", path.display()))?;

        println!(
            "✓ {}: {} sections, {} files",
            path.display(),
            conversion.sections().count(),
            written.len()
        );
        print_diagnostics(&conversion.diagnostics);
    }

    if failures > 0 {
        anyhow::bail!("{} of {} documents could not be converted", failures, documents.len());
    }

    Ok(())
}

/// JSON shape of the outline command
#[derive(Serialize)]
struct OutlineReport<'a> {
    sections: &'a [SectionNode<chapterize::Block>],
    diagnostics: &'a [Diagnostic],
}

/// Handle the outline command
fn handle_outline_command(input: &Path, config: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let conversion = pipeline::convert_docx(input, &config)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    if json {
        let report = OutlineReport {
            sections: &conversion.root.children,
            diagnostics: &conversion.diagnostics,
        };
        let text = serde_json::to_string_pretty(&report).context("Failed to serialize outline")?;
        println!("{}", text);
    } else {
        print_outline(&conversion);
        print_diagnostics(&conversion.diagnostics);
    }

    Ok(())
}

/// Print the section tree, one indented line per section
fn print_outline(conversion: &Conversion) {
    for section in conversion.sections() {
        let indent = "  ".repeat(section.depth.saturating_sub(1));
        let label = if section.number.is_empty() {
            section.title.clone()
        } else {
            format!("{} {}", section.number, section.title)
        };
        println!("{}{}  {}", indent, section.order_code, label.trim());
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        println!("  warning: {}", diagnostic);
    }
}

/// Handle the init-config command
fn handle_init_config_command(path: Option<PathBuf>, force: bool) -> Result<()> {
    let target = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if target.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it",
            target.display()
        );
    }

    ChapterizeConfig::default()
        .save(&target)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    println!("✓ Wrote default configuration to {}", target.display());
    Ok(())
}
