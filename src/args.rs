// Commandline argument parser using clap for RoomLocator

use crate::geo::Coordinate;

use clap::{Args, Parser, Subcommand};
use log::debug;
use std::path::{Path, PathBuf};

/// Where the bundled sample catalog lives, relative to the repository root.
pub const DEFAULT_CATALOG: &str = "data/campus.ron";

/// Find campus rooms and walk to them.
#[derive(Debug, Parser, Clone)]
#[clap(version)]
pub struct LocatorArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    /// What to do with the catalog
    pub command: LocatorTask,
}

// Options shared by both binaries
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Room catalog to load, a RON list of rooms. A relative path is read
    /// from the current directory, or else from the RoomLocator source tree
    #[arg(short = 'c', long = "catalog", default_value = DEFAULT_CATALOG)]
    pub catalog: PathBuf,

    /// Guide configuration file; built-in defaults are used without one
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Where you are, as "lat,lng". Without it the configured fallback is used
    #[arg(short = 'o', long = "origin", allow_hyphen_values = true)]
    pub origin: Option<Coordinate>,
}

impl CommonArgs {
    /// The catalog file to open. A relative path missing from the current
    /// directory is looked up in the source tree too, where the sample
    /// catalog lives, so the binaries work from anywhere.
    pub fn catalog_path(&self) -> PathBuf {
        resolve_catalog(&self.catalog, Path::new(env!("CARGO_MANIFEST_DIR")))
    }
}

fn resolve_catalog(path: &Path, source_root: &Path) -> PathBuf {
    if path.is_relative() && !path.exists() {
        let bundled = source_root.join(path);
        if bundled.exists() {
            debug!("{} not found here, using {}", path.display(), bundled.display());
            return bundled;
        }
    }
    path.to_path_buf()
}

/// The `roomlocator` subcommands.
#[derive(Debug, Subcommand, Clone)]
pub enum LocatorTask {
    /// List rooms, optionally filtered
    List(ListCommand),

    /// List rooms within walking range, closest first
    Nearby(NearbyCommand),

    /// Show distance, time, and heading to a room
    Preview(RoomCommand),

    /// Walk to a room one step at a time
    Guide(GuideCommand),

    /// Print the guide configuration in effect
    Config,
}

#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Text to look for in the name, building, or description
    #[arg(short = 'q', long = "query", default_value = "")]
    pub query: String,

    /// Only rooms of this category, e.g. "laboratory"
    #[arg(short = 't', long = "type")]
    pub category: Option<String>,

    /// Only rooms on this floor
    #[arg(short = 'f', long = "floor", allow_hyphen_values = true)]
    pub floor: Option<i32>,
}

#[derive(Debug, Args, Clone)]
pub struct NearbyCommand {
    /// Search radius, in kilometers
    #[arg(short = 'r', long = "radius", default_value_t = 1.0)]
    pub radius_km: f64,
}

#[derive(Debug, Args, Clone)]
pub struct RoomCommand {
    /// Id of the room, as listed by `list`
    pub room: String,
}

#[derive(Debug, Args, Clone)]
pub struct GuideCommand {
    /// Id of the room, as listed by `list`
    pub room: String,

    /// Start with spoken instructions switched off
    #[arg(short = 'm', long = "mute")]
    pub mute: bool,
}

/// Pick a room and follow the walking guidance in the terminal.
#[derive(Debug, Parser, Clone)]
#[clap(version)]
pub struct NavigatorArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Pretend the user's position drifts around the origin, like a real GPS
    #[arg(short = 's', long = "simulate")]
    pub simulate: bool,
}
