use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use forcelayout::cli::{Cli, Commands};
use forcelayout::config::{ForceConfiguration, PartialForceConfiguration, Preset, merge, validate};
use forcelayout::graph::{GraphDocument, LayoutOutput};
use forcelayout::io::write_json;
use forcelayout::node::Dimensions;
use forcelayout::random::seeded;
use forcelayout::simulation::Simulation;

fn load_configuration(preset: Preset, overrides: Option<&Path>) -> anyhow::Result<ForceConfiguration> {
    let base = preset.configuration();
    let Some(path) = overrides else {
        return Ok(base);
    };
    let partial = PartialForceConfiguration::from_path(path)
        .with_context(|| format!("failed to read configuration overrides from {}", path.display()))?;
    Ok(merge(&partial, &base))
}

#[allow(clippy::too_many_arguments)]
fn layout(
    input: &Path,
    output: Option<&Path>,
    preset: Preset,
    overrides: Option<&Path>,
    ticks: Option<usize>,
    max_frames: usize,
    three_d: bool,
    seed: u64,
) -> anyhow::Result<()> {
    let graph = GraphDocument::from_path(input)
        .with_context(|| format!("failed to read graph from {}", input.display()))?;
    let configuration = load_configuration(preset, overrides)?;
    for violation in validate(&configuration) {
        warn!("{violation}");
    }

    let dimensions = if three_d {
        Dimensions::Three
    } else {
        Dimensions::Two
    };
    let mut simulation = Simulation::new(dimensions)
        .with_random(seeded(seed))
        .with_configuration(configuration)
        .with_nodes(graph.simulation_nodes())
        .with_links(graph.simulation_links());
    info!(
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        %preset,
        "laying out graph"
    );

    match ticks {
        Some(n) => {
            simulation.tick(n);
        }
        None => {
            let frames = simulation.run_to_convergence(max_frames);
            debug!(frames, alpha = simulation.alpha(), "run finished");
        }
    }

    let metrics = simulation.metrics();
    info!(
        ticks = metrics.ticks,
        mean_tick = ?metrics.mean_tick(),
        "layout complete"
    );

    let result = LayoutOutput::from(&simulation);
    match output {
        Some(path) => write_json(&result, path)
            .with_context(|| format!("failed to write layout to {}", path.display()))?,
        None => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Layout {
            input,
            output,
            preset,
            config,
            ticks,
            max_frames,
            three_d,
            seed,
        } => layout(
            &input,
            output.as_deref(),
            preset,
            config.as_deref(),
            ticks,
            max_frames,
            three_d,
            seed,
        )?,
        Commands::Presets { name: Some(preset) } => {
            println!("{}", serde_json::to_string_pretty(&preset.configuration())?);
        }
        Commands::Presets { name: None } => {
            for preset in Preset::ALL {
                println!("{preset}");
            }
        }
        Commands::Validate { preset, config } => {
            let configuration = load_configuration(preset, config.as_deref())?;
            let violations = validate(&configuration);
            if violations.is_empty() {
                println!("configuration is valid");
            }
            for violation in violations {
                println!("{violation}");
            }
        }
    }

    Ok(())
}
