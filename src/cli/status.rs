// src/cli/status.rs — Engine status display

use crate::infra::config::{Config, StoreBackend};
use crate::infra::paths;
use crate::repo::tokenscript_org;
use crate::storage::open_store;

/// Display resolved paths, the store backend and configured sources.
pub async fn show_status(config: &Config, config_path: Option<&str>) -> anyhow::Result<()> {
    println!("tsengine v{}", env!("CARGO_PKG_VERSION"));
    println!();

    // Config
    match config_path {
        Some(path) => println!("  Config:     {path} (--config)"),
        None => {
            let default_path = paths::config_file_path();
            if default_path.exists() {
                println!("  Config:     {} (loaded)", default_path.display());
            } else {
                println!("  Config:     (using defaults)");
            }
        }
    }

    // Store
    let location = match config.store.backend {
        StoreBackend::Memory => "(in memory)".to_string(),
        _ => config.store.resolved_path().display().to_string(),
    };
    println!(
        "  Store:      {:?} at {location}, namespace '{}'",
        config.store.backend, config.store.namespace
    );
    let store_config = config.store.clone();
    let entries = tokio::task::spawn_blocking(move || {
        open_store(&store_config).and_then(|store| store.ids())
    })
    .await?;
    match entries {
        Ok(ids) => println!("  Entries:    {}", ids.len()),
        Err(e) => println!("  Entries:    unavailable ({e})"),
    }

    // Sources
    println!("  Sources:    {}", config.repo.sources.join(" -> "));
    match tokenscript_org::schema_base(&config.repo.server, &config.repo.schema) {
        Ok(base) => println!("  Repo:       {base}"),
        Err(e) => println!("  Repo:       unusable ({e})"),
    }
    println!("  RPC:        {}", config.rpc.url);
    println!(
        "  Metadata:   {} (token {}{})",
        config.metadata.base_url,
        config.metadata.token_id,
        if config.metadata.api_key.is_some() {
            ", api key set"
        } else {
            ""
        }
    );

    Ok(())
}
