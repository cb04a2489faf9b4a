use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use client_core::{
    DirectoryEndpoints, HttpDirectoryClient, LocationScreen, RegionStatus, SubRegionStatus,
};
use shared::domain::{Region, ScreenId};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

mod config;
mod terminal;

use terminal::{describe, render_options, resolve_pick, StdoutNavigator};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EndpointPreset {
    /// `/estados` and `/estados/{code}/municipios`
    Ibge,
    /// `/regions` and `/regions/{code}/subregions`
    Generic,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long, value_enum)]
    endpoints: Option<EndpointPreset>,
    /// Per-request timeout; 0 disables it.
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(long)]
    handoff_screen: Option<String>,
    #[arg(long, default_value = "info")]
    log_level: String,
}

type StdinLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = config::load_settings(&args.config)?;
    if let Some(base_url) = args.base_url {
        settings.directory_base_url = base_url;
    }
    if let Some(preset) = args.endpoints {
        let endpoints = match preset {
            EndpointPreset::Ibge => DirectoryEndpoints::ibge(),
            EndpointPreset::Generic => DirectoryEndpoints::generic(),
        };
        settings.regions_path = endpoints.regions_path;
        settings.sub_regions_path = endpoints.sub_regions_path;
    }
    if let Some(secs) = args.timeout_secs {
        settings.request_timeout_secs = Some(secs);
    }
    if let Some(screen) = args.handoff_screen {
        settings.handoff_screen = screen;
    }
    settings.validate()?;
    tracing::info!(base_url = %settings.directory_base_url, "using region directory");

    let directory = HttpDirectoryClient::new(
        &settings.directory_base_url,
        settings.endpoints(),
        settings.request_timeout(),
    )
    .context("failed to set up directory client")?;

    let mut screen = LocationScreen::mount(Arc::new(directory));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    screen.next_event().await;
    let regions = match screen.state().regions() {
        RegionStatus::Ready(regions) if !regions.is_empty() => regions.clone(),
        RegionStatus::Ready(_) => bail!("region directory returned no regions"),
        RegionStatus::Failed(err) => bail!("cannot load regions: {err}"),
        RegionStatus::Loading => bail!("region request ended without a response"),
    };

    if pick_location(&mut screen, &regions, &mut lines).await? {
        screen.confirm(&ScreenId::from(settings.handoff_screen), &StdoutNavigator);
    }
    Ok(())
}

/// Runs the two prompts. Returns `false` when stdin closes before a full pick.
async fn pick_location(
    screen: &mut LocationScreen,
    regions: &[Region],
    lines: &mut StdinLines,
) -> Result<bool> {
    loop {
        println!("{}", render_options(regions));
        println!("Region (number or code):");
        let Some(input) = lines.next_line().await? else {
            return Ok(false);
        };
        let Some(region) = resolve_pick(&input, regions) else {
            println!("No region matches {:?}", input.trim());
            continue;
        };
        screen.select_region(region.clone())?;
        println!("{}", describe(screen.state()));

        while screen.state().sub_regions() == &SubRegionStatus::Loading {
            if screen.next_event().await.is_none() {
                break;
            }
        }

        let sub_regions = match screen.state().sub_regions() {
            SubRegionStatus::Ready(list) if list.is_empty() => {
                println!("{region} has no sub-regions; pick another region");
                continue;
            }
            SubRegionStatus::Ready(list) => list.clone(),
            SubRegionStatus::Failed(err) => {
                println!("Could not load sub-regions of {region}: {err}. Pick a region to retry.");
                continue;
            }
            SubRegionStatus::Loading | SubRegionStatus::NoRegionSelected => continue,
        };

        loop {
            println!("{}", render_options(&sub_regions));
            println!("Sub-region of {region} (number or name, empty to change region):");
            let Some(input) = lines.next_line().await? else {
                return Ok(false);
            };
            if input.trim().is_empty() {
                break;
            }
            match resolve_pick(&input, &sub_regions) {
                Some(sub_region) => {
                    screen.select_sub_region(sub_region.clone())?;
                    println!("{}", describe(screen.state()));
                    return Ok(true);
                }
                None => println!("No sub-region of {region} matches {:?}", input.trim()),
            }
        }
    }
}
