use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "nowcard",
    author,
    version,
    about = "Render cached \"now playing\" cards for media tracks",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Track identifier or watch URL (e.g. `dQw4w9WgXcQ` or `https://youtu.be/dQw4w9WgXcQ`).
    #[arg(value_name = "TRACK")]
    pub track: Option<String>,

    /// Configuration file; defaults to `config.toml` in the config directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding rendered cards; defaults to `cards/` in the cache directory.
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Image URL reported when the cover cannot be downloaded.
    #[arg(long, value_name = "URL")]
    pub default_image_url: Option<String>,

    /// Icon strip drawn below the progress bar.
    #[arg(long, value_name = "PATH")]
    pub icon: Option<PathBuf>,

    /// Font used for the title line.
    #[arg(long, value_name = "PATH")]
    pub title_font: Option<PathBuf>,

    /// Font used for artist, duration, and small labels.
    #[arg(long, value_name = "PATH")]
    pub body_font: Option<PathBuf>,

    /// Skip the metadata lookup and render with placeholder text.
    #[arg(long)]
    pub offline: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print resolved directories for config, data, cache, and assets.
    Paths,
}

pub fn parse() -> Cli {
    Cli::parse()
}
