use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use cardconfig::{AssetSection, CardConfig};
use tracing::{debug, info};

use crate::cli::RunArgs;
use crate::paths::{AppPaths, DEFAULT_BODY_FONT, DEFAULT_ICON, DEFAULT_TITLE_FONT};

/// Everything the pipeline needs once the config file, CLI flags, and
/// directory layout have been merged.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: CardConfig,
    pub cache_root: PathBuf,
    pub offline: bool,
}

pub fn bootstrap_filesystem(paths: &AppPaths) -> Result<()> {
    let directories = vec![
        paths.config_dir().to_path_buf(),
        paths.data_dir().to_path_buf(),
        paths.cache_dir().to_path_buf(),
    ];

    for dir in directories {
        ensure_directory(&dir)?;
    }
    Ok(())
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if path.is_dir() {
            debug!(path = %path.display(), "reusing existing directory");
            Ok(())
        } else {
            bail!("filesystem entry at {} is not a directory", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create nowcard directory at {}", path.display()))?;
        info!(path = %path.display(), "created nowcard directory");
        Ok(())
    }
}

pub fn resolve_settings(paths: &AppPaths, args: &RunArgs) -> Result<Settings> {
    let mut config = load_config(paths, args.config.as_deref())?;
    apply_overrides(&mut config, args);
    config
        .validate()
        .context("invalid configuration after applying command-line overrides")?;
    fill_default_assets(&mut config.assets, &paths.assets_dir());

    let cache_root = args
        .cache_dir
        .clone()
        .unwrap_or_else(|| paths.cards_cache_dir());

    Ok(Settings {
        config,
        cache_root,
        offline: args.offline,
    })
}

/// An explicit path must exist; the default location is optional.
pub fn load_config(paths: &AppPaths, explicit: Option<&Path>) -> Result<CardConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = paths.config_file();
            if !path.is_file() {
                debug!(path = %path.display(), "no config file; using defaults");
                return Ok(CardConfig::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = CardConfig::from_toml_str(&raw)
        .with_context(|| format!("failed to load config file {}", path.display()))?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

pub fn apply_overrides(config: &mut CardConfig, args: &RunArgs) {
    if let Some(url) = &args.default_image_url {
        config.lookup.default_image_url = url.clone();
    }
    if let Some(icon) = &args.icon {
        config.assets.icon = Some(icon.clone());
    }
    if let Some(font) = &args.title_font {
        config.assets.title_font = Some(font.clone());
    }
    if let Some(font) = &args.body_font {
        config.assets.body_font = Some(font.clone());
    }
}

/// Fills unset asset paths with the bundled file names under `assets_dir`
/// when those files exist.
pub fn fill_default_assets(assets: &mut AssetSection, assets_dir: &Path) {
    for (slot, name) in [
        (&mut assets.title_font, DEFAULT_TITLE_FONT),
        (&mut assets.body_font, DEFAULT_BODY_FONT),
        (&mut assets.icon, DEFAULT_ICON),
    ] {
        if slot.is_some() {
            continue;
        }
        let candidate = assets_dir.join(name);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "using bundled asset");
            *slot = Some(candidate);
        }
    }
}
