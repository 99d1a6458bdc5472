//! `VerityRuntime` — owns every engine and the background schedulers that
//! keep the graph converged and its event queue flowing, the same
//! singleton-behind-`OnceLock` shape `CortexRuntime` uses.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use verity_core::config::VerityConfig;
use verity_core::constants::{PENDING_ROW_RETRY_SECS, THESIS_CHANGE_ASSUME_THRESHOLD};
use verity_core::errors::{VerityError, VerityResult};
use verity_core::memory::MemoryState;
use verity_core::traits::{Embedder, EntityStore, EventDispatcher, ExposureQueue, ShockPropagator, ThesisArbiter};

use verity_events::SessionSweeper;
use verity_index::named_indexes::ConditionIndexes;
use verity_index::HashingEmbedder;
use verity_pipeline::{ExposureChecker, HttpArbiter, InProcessExposureQueue, SimilarityFallbackArbiter, WritePipeline};
use verity_propagation::{FullGraphPropagator, LocalShockPropagator};
use verity_resolution::Resolver;
use verity_storage::StorageEngine;
use verity_zones::ZoneBuilder;

use crate::dispatch::LoggingEventDispatcher;

static RUNTIME: OnceLock<Arc<VerityRuntime>> = OnceLock::new();

/// Options for building a runtime. Mirrors the db-path/config-toml split
/// used to bring up a NAPI-facing runtime, minus anything NAPI-specific.
#[derive(Default)]
pub struct RuntimeOptions {
    pub db_path: Option<PathBuf>,
    pub config_toml: Option<String>,
}

pub struct VerityRuntime {
    pub store: Arc<dyn EntityStore>,
    pub indexes: Arc<ConditionIndexes>,
    pub arbiter: Arc<dyn ThesisArbiter>,
    pub queue: Arc<InProcessExposureQueue>,
    pub shock: Arc<dyn ShockPropagator>,
    pub dispatcher: Arc<dyn EventDispatcher>,
    pub pipeline: WritePipeline,
    pub checker: ExposureChecker,
    pub propagator: FullGraphPropagator,
    pub zones: ZoneBuilder,
    pub sweeper: SessionSweeper,
    pub resolver: Resolver,
    pub config: VerityConfig,
}

impl VerityRuntime {
    pub(crate) fn new(opts: RuntimeOptions) -> VerityResult<Self> {
        let config = match &opts.config_toml {
            Some(toml_str) => VerityConfig::from_toml(toml_str).map_err(|e| VerityError::Config(e.to_string()))?,
            None => VerityConfig::default(),
        }
        .apply_env();

        let store: Arc<dyn EntityStore> = match &opts.db_path {
            Some(path) => Arc::new(StorageEngine::open(path, config.storage.read_pool_size, config.storage.busy_timeout_ms)?),
            None => Arc::new(StorageEngine::open_in_memory()?),
        };

        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(config.index.dimensions));
        let indexes = Arc::new(ConditionIndexes::new(embedder));

        let arbiter: Arc<dyn ThesisArbiter> = match &config.arbiter.llm_judge_url {
            Some(url) => Arc::new(HttpArbiter::new(
                url.clone(),
                config.arbiter.llm_judge_api_key.clone(),
                config.arbiter.llm_judge_model.clone().unwrap_or_else(|| "default".to_string()),
                config.arbiter.timeout_secs,
            )?),
            None => Arc::new(SimilarityFallbackArbiter::new(THESIS_CHANGE_ASSUME_THRESHOLD)),
        };

        let queue = Arc::new(InProcessExposureQueue::new());
        let shock: Arc<dyn ShockPropagator> = Arc::new(LocalShockPropagator::new(store.clone(), config.shock.clone()));
        let dispatcher: Arc<dyn EventDispatcher> = Arc::new(LoggingEventDispatcher::new());

        let pipeline = WritePipeline::new(store.clone(), indexes.clone(), arbiter.clone(), queue.clone());
        let checker = ExposureChecker::new(store.clone(), indexes.clone(), shock.clone(), config.index.min_similarity);
        let propagator = FullGraphPropagator::new(store.clone(), config.propagation.clone());
        let zones = ZoneBuilder::new(store.clone(), indexes.clone(), config.zone.clone());
        let sweeper = SessionSweeper::new(store.clone(), dispatcher.clone(), config.event.clone());
        let resolver = Resolver::new(store.clone(), shock.clone());

        Ok(Self {
            store,
            indexes,
            arbiter,
            queue,
            shock,
            dispatcher,
            pipeline,
            checker,
            propagator,
            zones,
            sweeper,
            resolver,
            config,
        })
    }

    /// Drain whatever the write pipeline has enqueued and run C4 over each
    /// job. The queue is in-process, so this is the consumer half of
    /// [`WritePipeline::embed_and_enqueue`]; called inline by tests and on a
    /// timer by [`Self::spawn_background_tasks`].
    pub fn drain_exposure_queue(&self) -> VerityResult<usize> {
        let jobs = self.queue.drain(256)?;
        let n = jobs.len();
        for job in &jobs {
            if let Err(e) = self.checker.check(job) {
                error!(memory_id = %job.memory_id, error = %e, "exposure check failed");
            }
        }
        Ok(n)
    }

    /// Retry rows stuck `pending` past [`PENDING_ROW_RETRY_SECS`] — a crash
    /// between the row insert and the embed/enqueue step leaves exactly this
    /// kind of row behind.
    pub async fn retry_pending_exposure(&self) -> VerityResult<usize> {
        let cutoff = Utc::now() - chrono::Duration::seconds(PENDING_ROW_RETRY_SECS);
        let pending = self.store.find_pending_exposure(cutoff, 100)?;
        let n = pending.len();
        for memory in pending {
            if let Err(e) = self.pipeline.embed_and_enqueue(&memory, None, None).await {
                error!(memory_id = %memory.id, error = %e, "retry of pending exposure row failed");
            }
        }
        Ok(n)
    }

    /// Predictions whose deadline has passed with no explicit resolution are
    /// marked `expired` rather than left to look indefinitely pending.
    pub fn expire_overdue_predictions(&self) -> VerityResult<usize> {
        let due = self.store.find_due_for_resolution(Utc::now())?;
        let n = due.len();
        for mut memory in due {
            memory.state = MemoryState::Expired;
            memory.updated_at = Utc::now();
            self.store.update_memory(&memory)?;
        }
        Ok(n)
    }

    /// Starts the nightly full-graph pass, the exposure-queue drain, the
    /// event sweep, the pending-row retry, and the prediction-expiry sweep as
    /// independent `tokio` intervals. Each failure is logged and the loop
    /// continues — a single bad tick must not take the scheduler down.
    pub fn spawn_background_tasks(self: &Arc<Self>) {
        let runtime = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(runtime.config.propagation.interval_secs));
            loop {
                ticker.tick().await;
                let runtime = runtime.clone();
                let report = tokio::task::spawn_blocking(move || runtime.propagator.run()).await;
                match report {
                    Ok(Ok(report)) => info!(?report, "full-graph propagation pass complete"),
                    Ok(Err(e)) => error!(error = %e, "full-graph propagation pass failed"),
                    Err(e) => error!(error = %e, "full-graph propagation task panicked"),
                }
            }
        });

        let runtime = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            loop {
                ticker.tick().await;
                if let Err(e) = runtime.drain_exposure_queue() {
                    error!(error = %e, "exposure queue drain failed");
                }
            }
        });

        let runtime = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(runtime.config.event.sweep_interval_secs));
            loop {
                ticker.tick().await;
                match runtime.sweeper.sweep() {
                    Ok(report) => {
                        if report.stuck_claims_released > 0 {
                            warn!(released = report.stuck_claims_released, "released stuck event claims");
                        }
                    }
                    Err(e) => error!(error = %e, "session sweep failed"),
                }
            }
        });

        let runtime = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(PENDING_ROW_RETRY_SECS as u64));
            loop {
                ticker.tick().await;
                if let Err(e) = runtime.retry_pending_exposure().await {
                    error!(error = %e, "pending exposure retry failed");
                }
            }
        });

        let runtime = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(300));
            loop {
                ticker.tick().await;
                if let Err(e) = runtime.expire_overdue_predictions() {
                    error!(error = %e, "prediction expiry sweep failed");
                }
            }
        });
    }
}

/// Initialize the global runtime singleton. Errs if already initialized.
pub fn initialize(opts: RuntimeOptions) -> VerityResult<Arc<VerityRuntime>> {
    let runtime = Arc::new(VerityRuntime::new(opts)?);
    RUNTIME
        .set(runtime.clone())
        .map_err(|_| VerityError::internal("runtime_already_initialized", "VerityRuntime already initialized"))?;
    Ok(runtime)
}

/// Fetch the global runtime. Errs if [`initialize`] hasn't run yet.
pub fn get() -> VerityResult<Arc<VerityRuntime>> {
    RUNTIME
        .get()
        .cloned()
        .ok_or_else(|| VerityError::internal("runtime_not_initialized", "VerityRuntime not initialized"))
}

pub fn is_initialized() -> bool {
    RUNTIME.get().is_some()
}
