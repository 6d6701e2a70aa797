//! Command line entry point.

mod app;
mod difficulty;
mod enrich;
mod models;
mod provider;
mod system;
#[cfg(test)]
mod testing;
mod view;

use crate::app::{App, Interactions};
use crate::models::Settings;
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Enriches a saved osu! beatmap listing with difficulty data.
#[derive(Debug, Parser)]
#[command(name = "osu-lens", version, about)]
struct Cli {
    /// Saved beatmap listing page (HTML).
    page: PathBuf,

    #[arg(long, default_value = "osu-lens.toml")]
    config: PathBuf,

    /// Further listing page appended after the first one; may be repeated.
    #[arg(long = "append", value_name = "PAGE")]
    appended: Vec<PathBuf>,

    /// Retry blocks whose data could not be fetched.
    #[arg(long)]
    retry: bool,

    /// Beatmap id picked from a difficulty popup; may be repeated.
    #[arg(long = "switch", value_name = "BEATMAP_ID")]
    switches: Vec<String>,

    /// Click every "compute PP" control.
    #[arg(long)]
    compute_pp: bool,

    /// Open the difficulty breakdown of every standard-mode block.
    #[arg(long)]
    deep_info: bool,
}

fn read_page(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    log::info!("MAIN: Booting osu-lens...");

    let mut settings = Settings::load(&cli.config).context("failed to load settings")?;
    settings.apply_env();

    let html = read_page(&cli.page)?;
    let interactions = Interactions {
        appended_pages: cli
            .appended
            .iter()
            .map(|path| read_page(path))
            .collect::<anyhow::Result<_>>()?,
        retry: cli.retry,
        switches: cli.switches,
        compute_pp: cli.compute_pp,
        deep_info: cli.deep_info,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let local = tokio::task::LocalSet::new();

    let app = App::new(&settings, &html)?;
    let report = local.block_on(&runtime, app.run(&interactions));
    print!("{report}");
    Ok(())
}
