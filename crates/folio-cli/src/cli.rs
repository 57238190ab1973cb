use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use folio_types::{PageAlign, PageAnimation};

#[derive(Parser)]
#[command(
    name = "folio",
    about = "Inspect and edit folio reader settings",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Application settings file (TOML)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Directory holding the document settings store
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the application settings
    Settings,
    /// Open a document, creating its settings on first use
    Open(OpenArgs),
    /// List stored document settings
    List(ListArgs),
    /// Record a page change on a document
    Page(PageArgs),
    /// Record a zoom change on a document
    Zoom(ZoomArgs),
    /// Edit a document's page layout
    Layout(LayoutArgs),
    /// Delete every stored document record
    Reset,
}

#[derive(Args)]
pub struct OpenArgs {
    pub key: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// List every record instead of only the most recent one
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Args)]
pub struct PageArgs {
    pub key: String,
    pub doc: u32,
    pub view: u32,
}

#[derive(Args)]
pub struct ZoomArgs {
    pub key: String,
    pub value: f32,
}

#[derive(Args)]
pub struct LayoutArgs {
    pub key: String,
    #[arg(long, conflicts_with = "no_split")]
    pub split: bool,
    #[arg(long)]
    pub no_split: bool,
    #[arg(long, conflicts_with = "no_single")]
    pub single: bool,
    #[arg(long)]
    pub no_single: bool,
    #[arg(long)]
    pub align: Option<AlignArg>,
    #[arg(long)]
    pub animation: Option<AnimationArg>,
}

impl LayoutArgs {
    pub fn split_pages(&self) -> Option<bool> {
        flag(self.split, self.no_split)
    }

    pub fn single_page(&self) -> Option<bool> {
        flag(self.single, self.no_single)
    }
}

fn flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum AlignArg {
    Width,
    Height,
    Auto,
}

impl From<AlignArg> for PageAlign {
    fn from(arg: AlignArg) -> Self {
        match arg {
            AlignArg::Width => PageAlign::Width,
            AlignArg::Height => PageAlign::Height,
            AlignArg::Auto => PageAlign::Auto,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum AnimationArg {
    None,
    Curler,
    Slider,
    Fader,
    Squeezer,
}

impl From<AnimationArg> for PageAnimation {
    fn from(arg: AnimationArg) -> Self {
        match arg {
            AnimationArg::None => PageAnimation::None,
            AnimationArg::Curler => PageAnimation::Curler,
            AnimationArg::Slider => PageAnimation::Slider,
            AnimationArg::Fader => PageAnimation::Fader,
            AnimationArg::Squeezer => PageAnimation::Squeezer,
        }
    }
}
