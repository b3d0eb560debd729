use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use compositor::{CardRenderer, CardStyle, FontSet};
use lookup::{
    CardCache, LookupConfig, MetadataFetcher, ReqwestFetcher, SearchClient, ThumbnailDownloader,
    TrackId, UnavailableLookup, VideoLookup,
};
use tracing_subscriber::EnvFilter;

use crate::bootstrap::{bootstrap_filesystem, resolve_settings, Settings};
use crate::cli::{Cli, Command};
use crate::paths::AppPaths;
use crate::pipeline::CardPipeline;

pub async fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    let paths = AppPaths::discover()?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        data = %paths.data_dir().display(),
        cache = %paths.cache_dir().display(),
        "resolved nowcard paths"
    );

    if let Some(Command::Paths) = cli.command {
        print_paths(&paths);
        return Ok(());
    }

    let args = cli.run;
    let raw = args
        .track
        .as_deref()
        .ok_or_else(|| anyhow!("a track identifier or watch URL is required"))?;
    let id = TrackId::from_input(raw).with_context(|| format!("invalid track reference '{raw}'"))?;

    bootstrap_filesystem(&paths)?;
    let settings = resolve_settings(&paths, &args)?;
    let pipeline = build_pipeline(&settings)?;

    tracing::info!(track = %id, cache = %settings.cache_root.display(), "generating card");
    let output = pipeline
        .generate(&id)
        .await
        .with_context(|| format!("failed to generate card for {id}"))?;
    println!("{output}");
    Ok(())
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_paths(paths: &AppPaths) {
    println!("Configuration directories:");
    println!("  config:  {}", paths.config_dir().display());
    println!("  data:    {}", paths.data_dir().display());
    println!("  cache:   {}", paths.cache_dir().display());
    println!("  file:    {}", paths.config_file().display());
    println!("  cards:   {}", paths.cards_cache_dir().display());
    println!("  assets:  {}", paths.assets_dir().display());
}

fn build_pipeline(settings: &Settings) -> Result<CardPipeline> {
    let lookup_section = &settings.config.lookup;
    let lookup_config = LookupConfig::new(
        lookup_section.api_base.as_deref(),
        lookup_section.request_timeout,
        lookup_section.user_agent.as_str(),
    )
    .context("invalid metadata lookup configuration")?;

    let metadata = MetadataFetcher::new(
        build_lookup(&lookup_config, settings.offline)?,
        lookup_section.watch_base.as_str(),
        lookup_section.default_image_url.as_str(),
    );
    let fetcher =
        ReqwestFetcher::new(&lookup_config).context("failed to construct HTTP client")?;
    let downloader = ThumbnailDownloader::new(Arc::new(fetcher));

    Ok(CardPipeline::new(
        CardCache::new(settings.cache_root.clone()),
        metadata,
        downloader,
        Arc::new(build_renderer(settings)?),
    ))
}

fn build_lookup(config: &LookupConfig, offline: bool) -> Result<Arc<dyn VideoLookup>> {
    if offline {
        tracing::info!("metadata lookup disabled (--offline)");
        return Ok(Arc::new(UnavailableLookup));
    }
    if config.api_base.is_none() {
        tracing::info!("no lookup.api_base configured; cards will use placeholder metadata");
        return Ok(Arc::new(UnavailableLookup));
    }
    let client = SearchClient::new(config).context("failed to construct metadata client")?;
    Ok(Arc::new(client))
}

fn build_renderer(settings: &Settings) -> Result<CardRenderer> {
    let assets = &settings.config.assets;
    let fonts = FontSet::discover(assets.title_font.as_deref(), assets.body_font.as_deref());

    let mut style = CardStyle::new(settings.config.style.signature.as_str());
    if let Some(rgba) = settings.config.style.accent_glow {
        style = style.with_accent_glow(rgba);
    }

    CardRenderer::new(style, fonts, assets.icon.clone()).context("invalid card layout")
}
