//! Offline caching worker.
//!
//! `OfflineWorker` is a `Transport` that wraps the network transport and
//! answers every outgoing GET from its response caches or the network,
//! depending on what kind of resource is being fetched. A control loop task
//! handles lifecycle messages, push data and periodic pruning of expired API
//! responses.

mod classify;
mod messages;
mod storage;
mod strategy;

pub use messages::{
  ClientCommand, Notification, PushPayload, ACTION_DISMISS, ACTION_OPEN, BACKGROUND_SYNC_TAG,
};
pub use storage::ResponseStore;

use classify::{Classifier, Strategy};
use messages::WorkerMessage;

use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::clock::SharedClock;
use crate::net::{Destination, Method, NetError, Request, Response, Transport};

pub const DEFAULT_CACHE_VERSION: &str = "v1.0.0";

/// Names of the two caches owned by one worker version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
  pub static_cache: String,
  pub api_cache: String,
}

impl CacheNames {
  pub fn new(version: &str) -> Self {
    Self {
      static_cache: format!("moviedeck-{}", version),
      api_cache: format!("moviedeck-api-{}", version),
    }
  }

  fn contains(&self, name: &str) -> bool {
    name == self.static_cache || name == self.api_cache
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
  Installing,
  /// Installed but not controlling requests
  Waiting,
  Active,
}

/// Settings the worker is started with.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
  pub cache_version: String,
  /// Fetched into the static cache on install
  pub precache: Vec<Url>,
  /// Cached page served to document requests when offline
  pub offline_page: Option<Url>,
  /// Movie API base URL; its origin marks API requests
  pub api_base: Url,
  /// Freshness of stored API responses
  pub api_ttl: chrono::Duration,
  pub sync_interval: Duration,
}

pub(crate) struct WorkerCore {
  network: Arc<dyn Transport>,
  store: Arc<ResponseStore>,
  names: CacheNames,
  classifier: Classifier,
  clock: SharedClock,
  api_ttl: chrono::Duration,
  offline_page: Option<Url>,
  lifecycle: RwLock<Lifecycle>,
}

impl WorkerCore {
  /// Cache lookup. Storage faults count as a miss.
  fn lookup(&self, request: &Request) -> Option<Response> {
    match self.store.match_any(request) {
      Ok(hit) => hit,
      Err(e) => {
        error!("cache lookup for {} failed: {}", request.url, e);
        None
      }
    }
  }

  fn put(&self, cache: &str, request: &Request, response: &Response) {
    if let Err(e) = self.store.put(cache, request, response) {
      error!("storing {} in {} failed: {}", request.url, cache, e);
    }
  }

  fn offline_document(&self) -> Option<Response> {
    let url = self.offline_page.as_ref()?;
    self.lookup(&Request::get(url.clone()).with_destination(Destination::Document))
  }

  fn lifecycle(&self) -> Lifecycle {
    *self.lifecycle.read().unwrap_or_else(|e| e.into_inner())
  }

  fn set_lifecycle(&self, state: Lifecycle) {
    *self.lifecycle.write().unwrap_or_else(|e| e.into_inner()) = state;
  }
}

/// The intercepting transport. Cheap to clone.
#[derive(Clone)]
pub struct OfflineWorker {
  core: Arc<WorkerCore>,
}

impl OfflineWorker {
  /// Install the worker, then spawn its control loop.
  ///
  /// Returns the transport, a handle for posting messages, and the channel
  /// on which the worker talks back to the client.
  pub async fn start(
    options: WorkerOptions,
    network: Arc<dyn Transport>,
    store: Arc<ResponseStore>,
    clock: SharedClock,
  ) -> (Self, WorkerHandle, mpsc::UnboundedReceiver<ClientCommand>) {
    let worker = Self {
      core: Arc::new(WorkerCore {
        network,
        store,
        names: CacheNames::new(&options.cache_version),
        classifier: Classifier::new(&options.api_base),
        clock,
        api_ttl: options.api_ttl,
        offline_page: options.offline_page.clone(),
        lifecycle: RwLock::new(Lifecycle::Installing),
      }),
    };
    info!("worker loaded: {}", worker.core.names.static_cache);

    worker.install(&options.precache).await;

    let (tx, rx) = mpsc::unbounded_channel();
    let (client_tx, client_rx) = mpsc::unbounded_channel();
    tokio::spawn(control_loop(
      worker.clone(),
      rx,
      client_tx,
      options.sync_interval,
    ));

    (worker, WorkerHandle { tx }, client_rx)
  }

  pub fn lifecycle(&self) -> Lifecycle {
    self.core.lifecycle()
  }

  pub fn cache_names(&self) -> &CacheNames {
    &self.core.names
  }

  /// Pre-cache the static resources. Everything must load for the install to
  /// complete; a failed install leaves the worker waiting.
  async fn install(&self, precache: &[Url]) {
    info!("worker installing");
    let static_cache = &self.core.names.static_cache;
    if let Err(e) = self.core.store.open_cache(static_cache) {
      error!("opening {} failed: {}", static_cache, e);
      self.core.set_lifecycle(Lifecycle::Waiting);
      return;
    }

    let mut fetched = Vec::with_capacity(precache.len());
    for url in precache {
      let request = Request::get(url.clone());
      match self.core.network.fetch(request.clone()).await {
        Ok(response) if response.is_ok() => fetched.push((request, response)),
        Ok(response) => {
          error!("precaching {} failed with status {}", url, response.status);
          self.core.set_lifecycle(Lifecycle::Waiting);
          return;
        }
        Err(e) => {
          error!("precaching {} failed: {}", url, e);
          self.core.set_lifecycle(Lifecycle::Waiting);
          return;
        }
      }
    }

    for (request, response) in &fetched {
      self.core.put(static_cache, request, response);
    }
    info!("worker installed, {} resources cached", fetched.len());
    self.skip_waiting();
  }

  fn skip_waiting(&self) {
    if self.core.lifecycle() != Lifecycle::Active {
      self.activate();
    }
  }

  /// Drop caches from other versions and start controlling requests.
  fn activate(&self) {
    info!("worker activating");
    match self.core.store.cache_names() {
      Ok(names) => {
        for name in names.iter().filter(|n| !self.core.names.contains(n)) {
          info!("deleting old cache {}", name);
          if let Err(e) = self.core.store.delete_cache(name) {
            error!("deleting {} failed: {}", name, e);
          }
        }
      }
      Err(e) => error!("listing caches failed: {}", e),
    }
    self.core.set_lifecycle(Lifecycle::Active);
    info!("worker active");
  }

  /// Delete stored API responses older than the TTL. Returns how many went.
  pub fn prune(&self) -> usize {
    let api_cache = &self.core.names.api_cache;
    let entries = match self.core.store.entries(api_cache) {
      Ok(entries) => entries,
      Err(e) => {
        error!("background sync failed: {}", e);
        return 0;
      }
    };

    let mut removed = 0;
    for entry in entries {
      if !self.core.is_stale(&entry.response) {
        continue;
      }
      match self.core.store.delete(api_cache, &entry.key) {
        Ok(true) => {
          debug!("pruned expired {}", entry.url);
          removed += 1;
        }
        Ok(false) => {}
        Err(e) => error!("pruning {} failed: {}", entry.url, e),
      }
    }
    info!("background sync done, {} expired responses removed", removed);
    removed
  }

  fn handle_message(&self, message: WorkerMessage, client: &mpsc::UnboundedSender<ClientCommand>) {
    match message {
      WorkerMessage::SkipWaiting => self.skip_waiting(),
      WorkerMessage::GetVersion(reply) => {
        let _ = reply.send(self.core.names.static_cache.clone());
      }
      WorkerMessage::Sync(tag) => {
        debug!("background sync: {}", tag);
        if tag == BACKGROUND_SYNC_TAG {
          self.prune();
        }
      }
      WorkerMessage::Push(data) => {
        if data.trim().is_empty() {
          return;
        }
        match PushPayload::parse(&data) {
          Ok(payload) => {
            let notification = Notification::from_push(payload, self.core.clock.now());
            let _ = client.send(ClientCommand::ShowNotification(notification));
          }
          Err(e) => warn!("ignoring malformed push data: {}", e),
        }
      }
    }
  }
}

impl Transport for OfflineWorker {
  fn fetch(&self, request: Request) -> BoxFuture<'static, Result<Response, NetError>> {
    if request.method != Method::Get || self.core.lifecycle() != Lifecycle::Active {
      return self.core.network.fetch(request);
    }

    let core = Arc::clone(&self.core);
    async move {
      let response = match core.classifier.classify(&request.url).strategy() {
        Strategy::CacheFirst => strategy::cache_first(&core, request).await,
        Strategy::NetworkFirst => strategy::network_first(&core, request).await,
      };
      Ok(response)
    }
    .boxed()
  }
}

async fn control_loop(
  worker: OfflineWorker,
  mut rx: mpsc::UnboundedReceiver<WorkerMessage>,
  client: mpsc::UnboundedSender<ClientCommand>,
  sync_interval: Duration,
) {
  let mut ticker = tokio::time::interval(sync_interval.max(Duration::from_secs(1)));
  // The first tick completes immediately
  ticker.tick().await;

  loop {
    tokio::select! {
      message = rx.recv() => match message {
        Some(message) => worker.handle_message(message, &client),
        None => break,
      },
      _ = ticker.tick() => {
        worker.prune();
      }
    }
  }
  debug!("worker control loop stopped");
}

/// Posts messages to the worker's control loop.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
  tx: mpsc::UnboundedSender<WorkerMessage>,
}

impl WorkerHandle {
  fn post(&self, message: WorkerMessage) {
    if self.tx.send(message).is_err() {
      warn!("worker control loop is gone");
    }
  }

  pub fn skip_waiting(&self) {
    self.post(WorkerMessage::SkipWaiting);
  }

  pub fn sync(&self, tag: &str) {
    self.post(WorkerMessage::Sync(tag.to_string()));
  }

  pub fn push(&self, data: impl Into<String>) {
    self.post(WorkerMessage::Push(data.into()));
  }

  /// Ask for the worker's version, i.e. its static cache name.
  pub async fn version(&self) -> Option<String> {
    let (reply, rx) = oneshot::channel();
    self.post(WorkerMessage::GetVersion(reply));
    rx.await.ok()
  }
}
