//! CLI argument definitions using clap
//!
//! Commands:
//! - filestore attach --model <model> --id <id> --file <path>
//! - filestore purge --model <model> --id <id>
//! - filestore models

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Filestore - attach files to entities and clean them up again
#[derive(Parser, Debug)]
#[command(name = "filestore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a local file for an entity, as if it had just been saved
    Attach {
        /// Owning model name
        #[arg(long)]
        model: String,
        /// Owner identifier
        #[arg(long)]
        id: String,
        /// File to upload
        #[arg(long)]
        file: PathBuf,
        /// Declared MIME type
        #[arg(long)]
        mime_type: Option<String>,
    },

    /// Remove every stored file of an entity, as if it had just been deleted
    Purge {
        /// Owning model name
        #[arg(long)]
        model: String,
        /// Owner identifier
        #[arg(long)]
        id: String,
        /// Treat the delete as non-cascading
        #[arg(long)]
        no_cascade: bool,
    },

    /// List models with upload behaviour and their associations
    Models,
}
