use clap::Parser;
use std::path::PathBuf;

pub const HELP_KEYS: &str = "\
Fixed keys:
  Esc             : Quit
  F1              : Toggle help overlay
  F2              : Toggle info line
  F5              : Reload current image
  Delete          : Clear image
  Arrow keys      : Pan (when zoomed, viewport focused)
  Wheel           : Zoom (viewport hovered)
  Right drag      : Pan (when zoomed)

Configurable chords (config file [keybinds]):
  next_image, previous_image, zoom_in, zoom_out, toggle_visibility
  e.g. \"ctrl+shift+z\"; an empty string disables the chord
";

#[derive(Parser, Debug)]
#[command(name = "multiview", about = "A multi-image viewer with zoom and pan", after_help = HELP_KEYS)]
pub struct Cli {
    /// Image files or directories, appended to the configured images
    pub paths: Vec<PathBuf>,

    /// Configuration file (default: multiview.toml if present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Load image references from a text file (one path or URL per line)
    #[arg(short = 'L', long, value_name = "FILE")]
    pub file_list: Option<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Scale small images up to fill the viewport
    #[arg(long)]
    pub allow_upscaling: bool,

    /// Number of background decode threads
    #[arg(long, default_value = "2")]
    pub workers: usize,
}
