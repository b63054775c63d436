use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vst2_host::{HostConfig, SnapshotOptions, StandardHost, Vst2Plugin};

/// Load a VST 2.4 module and print what it reports about itself.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the plugin binary.
    plugin: PathBuf,
    #[arg(long, default_value_t = 44100.0)]
    sr: f32,
    #[arg(long, default_value_t = 512)]
    block: usize,
    /// Skip the parameter listing.
    #[arg(long)]
    no_params: bool,
    /// Skip the program listing.
    #[arg(long)]
    no_programs: bool,
    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let args = Args::parse();
    let config = HostConfig::default()
        .with_sample_rate(args.sr)
        .with_block_size(args.block)
        .with_product("vst2-inspect");

    let mut plugin = Vst2Plugin::load_with_host(&args.plugin, StandardHost::new(config.clone()))
        .with_context(|| format!("Failed to load VST2 module {:?}", args.plugin))?;
    plugin.activate(&config);
    info!(plugin = %args.plugin.display(), "plugin activated");

    let properties = plugin.properties(SnapshotOptions {
        programs: !args.no_programs,
        parameters: !args.no_params,
    });
    if args.json {
        let json = serde_json::to_string_pretty(&properties)
            .context("Failed to serialize plugin properties")?;
        println!("{json}");
    } else {
        print!("{properties}");
    }

    plugin.close();
    Ok(())
}
