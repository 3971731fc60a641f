//! Wiring: the network transport, the optional offline worker in front of it,
//! and the cached OMDb client on top.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cache::TtlCache;
use crate::clock;
use crate::config::Config;
use crate::net::{HttpTransport, Transport};
use crate::omdb::OmdbClient;
use crate::worker::{ClientCommand, Lifecycle, OfflineWorker, ResponseStore, WorkerHandle};

/// A running worker and its channel back to the app.
pub struct WorkerLink {
  pub handle: WorkerHandle,
  pub commands: mpsc::UnboundedReceiver<ClientCommand>,
  pub lifecycle: Lifecycle,
}

pub struct Services {
  /// What every request goes through: the worker when running, else the network
  pub transport: Arc<dyn Transport>,
  pub client: OmdbClient,
  pub worker: Option<WorkerLink>,
}

impl Services {
  pub async fn build(config: &Config, use_worker: bool) -> Result<Self> {
    let clock = clock::system();
    let network: Arc<dyn Transport> = Arc::new(
      HttpTransport::new(config.request_timeout())
        .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?,
    );

    let mut worker = None;
    let transport = if use_worker && config.worker.enabled {
      match Self::start_worker(config, Arc::clone(&network), clock.clone()).await {
        Ok((offline, link)) => {
          worker = Some(link);
          Arc::new(offline) as Arc<dyn Transport>
        }
        Err(e) => {
          warn!("offline worker disabled: {}", e);
          network
        }
      }
    } else {
      info!("offline worker disabled");
      network
    };

    let cache = Arc::new(TtlCache::new(config.cache_ttl(), clock));
    info!("page cache ttl {}s", cache.ttl().num_seconds());
    let client = OmdbClient::new(
      Arc::clone(&transport),
      config.omdb_url()?,
      config.api_key()?,
      cache,
    );

    Ok(Self {
      transport,
      client,
      worker,
    })
  }

  async fn start_worker(
    config: &Config,
    network: Arc<dyn Transport>,
    clock: clock::SharedClock,
  ) -> Result<(OfflineWorker, WorkerLink)> {
    let options = config.worker_options()?;
    let path = config.worker_database()?;
    let store = ResponseStore::open(&path)
      .map_err(|e| eyre!("Failed to open response store {}: {}", path.display(), e))?;

    let (offline, handle, commands) =
      OfflineWorker::start(options, network, Arc::new(store), clock).await;
    let lifecycle = offline.lifecycle();
    let names = offline.cache_names();
    info!(
      "offline worker {:?}, caches {} and {}",
      lifecycle, names.static_cache, names.api_cache
    );
    Ok((
      offline,
      WorkerLink {
        handle,
        commands,
        lifecycle,
      },
    ))
  }
}
