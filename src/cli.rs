use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Preset;

/// Headless force-directed graph layout.
#[derive(Parser, Debug)]
#[command(name = "forcelayout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lay out a graph and write node positions as JSON
    Layout {
        /// Graph document (.json, .yaml)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base configuration preset
        #[arg(short, long, default_value_t = Preset::Default)]
        preset: Preset,

        /// Partial configuration overrides (.json, .yaml) merged onto the preset
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run exactly this many ticks instead of running to convergence
        #[arg(short, long)]
        ticks: Option<usize>,

        /// Upper bound on frames when running to convergence
        #[arg(long, default_value_t = 10_000)]
        max_frames: usize,

        /// Simulate in three dimensions
        #[arg(long)]
        three_d: bool,

        /// Seed for initial placement
        #[arg(long, default_value_t = crate::random::DEFAULT_SEED)]
        seed: u64,
    },
    /// Print a preset's configuration as JSON, or list the presets
    Presets {
        /// Preset to print
        name: Option<Preset>,
    },
    /// Check a configuration for out-of-range values
    Validate {
        /// Base configuration preset
        #[arg(short, long, default_value_t = Preset::Default)]
        preset: Preset,

        /// Partial configuration overrides (.json, .yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
