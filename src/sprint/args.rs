use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sprint")]
#[command(about = "Rich-text meeting notes with inline images", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding notes and config (defaults to $SPRINT_HOME, then the
    /// platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "n")]
    Create {
        /// Title of the note
        title: String,

        /// Body as markup, e.g. "<b>Agenda</b><br>intro"
        #[arg(short, long)]
        markup: Option<String>,

        /// Image files to embed at the end of the body
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,
    },

    /// List notes, newest first
    #[command(alias = "ls")]
    List,

    /// View a note
    #[command(alias = "v")]
    View {
        /// Id of the note (any unique prefix)
        id: String,

        /// Print the stored markup instead of rendered text
        #[arg(long)]
        markup: bool,
    },

    /// Apply a style to part of a note and save it
    #[command(alias = "f")]
    Format {
        /// Id of the note (any unique prefix)
        id: String,

        action: FormatAction,

        /// First character of the range
        #[arg(long)]
        start: usize,

        /// One past the last character of the range
        #[arg(long)]
        end: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatAction {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Bullet,
    Title,
    Heading,
    Subheading,
    Body,
}
