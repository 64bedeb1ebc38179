//! Command-line interface definitions for chapterize

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI structure for the chapterize application
#[derive(Parser)]
#[command(name = "chapterize")]
#[command(version)]
#[command(about = "Split numbered DOCX documents into chapter folders", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for chapterize
#[derive(Subcommand)]
pub enum Commands {
    /// Convert documents and write one folder per chapter
    Split {
        /// DOCX files, or directories searched recursively for them
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Configuration file (defaults to ./chapterize.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the recovered section tree without writing files
    Outline {
        /// DOCX file to analyze
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Configuration file (defaults to ./chapterize.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Emit JSON instead of an indented tree
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write the default configuration file
    InitConfig {
        /// Where to write it (defaults to ./chapterize.toml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
