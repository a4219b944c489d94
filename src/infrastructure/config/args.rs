use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

use super::app_config::LogLevel;
use crate::domain::entities::ImageSource;

/// Command-line arguments. Global flags override the configuration file.
#[derive(Debug, Parser)]
#[command(
    name = "lumen",
    version,
    about = "Load, cache and transform images from URLs, files and content handles",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Memory cache capacity in bytes.
    #[arg(long, value_name = "BYTES", global = true)]
    pub memory_cache_size: Option<u64>,

    /// Disk cache budget in bytes.
    #[arg(long, value_name = "BYTES", global = true)]
    pub disk_cache_size: Option<u64>,

    /// Disk cache directory.
    #[arg(long, value_name = "DIR", global = true)]
    pub disk_cache_dir: Option<PathBuf>,

    /// HTTP request timeout in seconds.
    #[arg(long, value_name = "SECS", global = true)]
    pub http_timeout: Option<u64>,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load an image through the caches and print what happened.
    Load(LoadArgs),
    /// Show cache locations and usage.
    Info,
    /// Clear cached images.
    Clear(ClearArgs),
}

/// Arguments of `lumen load`.
#[derive(Debug, Args)]
pub struct LoadArgs {
    /// URL, file path, `res:<id>` or `<scheme>://` content handle.
    #[arg(value_name = "SOURCE")]
    pub source: ImageSource,

    /// Round the corners with this radius in pixels.
    #[arg(long, value_name = "RADIUS")]
    pub rounded: Option<f32>,

    /// Fit within these bounds, e.g. `640x480`.
    #[arg(long, value_name = "WxH")]
    pub resize: Option<Dimensions>,

    /// Write the final image here (format from extension).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments of `lumen clear`.
#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Only clear the memory cache.
    #[arg(long, conflicts_with = "disk")]
    pub memory: bool,

    /// Only clear the disk cache.
    #[arg(long)]
    pub disk: bool,
}

/// Width and height parsed from `WxH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl FromStr for Dimensions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WxH, got `{s}`"))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid dimension `{v}`: {e}"))
        };
        Ok(Self {
            width: parse(width)?,
            height: parse(height)?,
        })
    }
}
