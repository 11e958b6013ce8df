use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cfs")]
#[command(about = "Chunked file storage over a document store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// One line typed at the interactive prompt.
#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Upload one or more files
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(short, long, default_value = "uploads")]
        prefix: String,
        /// MIME type for every file; guessed from the extension otherwise
        #[arg(short, long)]
        mime: Option<String>,
    },
    /// Download a file by id
    Download {
        file_id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a file and its chunks
    Delete {
        file_id: String,
    },
    /// Show a file's descriptor
    Info {
        file_id: String,
    },
    /// List files under a prefix
    List {
        #[arg(short, long, default_value = "uploads")]
        prefix: String,
    },
    /// Print a data: URL for a file
    Url {
        file_id: String,
    },
    /// Remove chunks left behind by aborted uploads
    Gc {
        #[arg(short, long, default_value = "uploads")]
        prefix: String,
        #[arg(long)]
        grace_secs: Option<u64>,
    },
    /// Interactive prompt
    Shell,
}

pub mod commands;
