//! Shared setup for commands that analyze a snapshot.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{output, SnapshotArgs};
use crate::adapter::{DirectorySnapshotSource, HttpSnapshotSource, SnapshotSource};
use crate::config::Config;
use crate::domain::TokenCatalog;
use crate::engine::{Engine, Snapshot};
use crate::error::Result;

const DEFAULT_CONFIG: &str = "config.toml";

/// Everything a command needs to run one analysis.
pub(crate) struct Session {
    pub config: Config,
    pub engine: Engine,
    pub snapshot: Snapshot,
}

/// Load configuration, apply `-v` and start logging.
///
/// An explicit path must exist; otherwise `config.toml` is optional. A
/// relative catalog path is taken relative to the configuration file.
pub(crate) fn load_config(path: Option<&Path>, verbose: u8) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(DEFAULT_CONFIG)?,
    };
    config.catalog = catalog_path(path.unwrap_or(Path::new(DEFAULT_CONFIG)), &config.catalog);

    match verbose {
        0 => {}
        1 => config.logging.level = "info".into(),
        _ => config.logging.level = "debug".into(),
    }
    config.init_logging();
    debug!(catalog = %config.catalog.display(), "Configuration loaded");
    Ok(config)
}

fn catalog_path(config_path: &Path, catalog: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) if catalog.is_relative() && !dir.as_os_str().is_empty() => dir.join(catalog),
        _ => catalog.to_path_buf(),
    }
}

/// Fetch one snapshot from the directory or the network.
pub(crate) async fn fetch(config: &Config, snapshot_dir: Option<&Path>) -> Result<Snapshot> {
    let source: Box<dyn SnapshotSource> = match snapshot_dir {
        Some(dir) => Box::new(DirectorySnapshotSource::new(dir)),
        None => Box::new(HttpSnapshotSource::from_config(&config.sources)),
    };

    let pb = output::spinner("Fetching rates...");
    match source.fetch().await {
        Ok(snapshot) => {
            output::spinner_success(
                &pb,
                &format!("Loaded {} feeds via {}", snapshot.payloads().len(), source.name()),
            );
            Ok(snapshot)
        }
        Err(err) => {
            output::spinner_fail(&pb, "Failed to fetch rates");
            Err(err)
        }
    }
}

/// Load configuration and catalog, then fetch a snapshot.
pub(crate) async fn prepare(args: &SnapshotArgs, verbose: u8) -> Result<Session> {
    let config = load_config(args.config.as_deref(), verbose)?;
    let catalog = TokenCatalog::load(&config.catalog)?;
    let snapshot = fetch(&config, args.snapshot_dir.as_deref()).await?;
    let engine = Engine::new(catalog, config.sources.defaults());

    Ok(Session {
        config,
        engine,
        snapshot,
    })
}
