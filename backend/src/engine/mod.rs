// Aggregation engine: validation, throttling, persistence, averaging and
// hand-off to the broadcast hub.
// Invariants: the engine is the only writer of the store; read-path failures
// degrade to fallback colors instead of surfacing to viewers.

mod snapshot;

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use viridis_core::average::{global_average, latest_window, nearby_count, proximity_average};
use viridis_core::geo::Location;
use viridis_core::idle::IdleTracker;
use viridis_core::model::{SubmitRequest, Submission, SYNTHETIC_ID_PREFIX};
use viridis_core::palette::Palette;
use viridis_core::throttle::{Throttle, ThrottleDecision};
use viridis_core::validate::{validate_submission, ValidationError};

use crate::constants::{COOLDOWN_SECS, DEFAULT_RADIUS_KM, IDLE_AFTER_SECS, WINDOW_LEN, WINDOW_MS};
use crate::hub::BroadcastHub;
use crate::store::{StoreError, SubmissionStore};
use crate::utils::next_sequence;

pub use snapshot::{Proximity, StateSnapshot};

// Only reachable with an empty palette, which loading rejects.
const FALLBACK_COLOR: &str = "#A132BE";

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Too many submissions. Please wait {remaining_secs} seconds before submitting again")]
    Throttled { remaining_secs: u64 },
    #[error("Failed to store submission")]
    Store(#[from] StoreError),
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub window_ms: u64,
    pub window_len: usize,
    pub default_radius_km: f64,
    pub cooldown_ms: u64,
    pub idle_after_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_ms: WINDOW_MS,
            window_len: WINDOW_LEN,
            default_radius_km: DEFAULT_RADIUS_KM,
            cooldown_ms: COOLDOWN_SECS * 1_000,
            idle_after_ms: IDLE_AFTER_SECS * 1_000,
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    palette: Arc<Palette>,
    store: Arc<dyn SubmissionStore>,
    hub: BroadcastHub,
    throttle: Mutex<Throttle>,
    idle: Mutex<IdleTracker>,
    synthetic_sequence: AtomicU64,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        palette: Arc<Palette>,
        store: Arc<dyn SubmissionStore>,
        hub: BroadcastHub,
        now_ms: u64,
    ) -> Self {
        Self {
            throttle: Mutex::new(Throttle::new(config.cooldown_ms)),
            idle: Mutex::new(IdleTracker::new(config.idle_after_ms, now_ms)),
            synthetic_sequence: AtomicU64::new(0),
            config,
            palette,
            store,
            hub,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub fn store(&self) -> &Arc<dyn SubmissionStore> {
        &self.store
    }

    /// Viewer submission: validate, gate on the throttle, then commit.
    /// Ids in the synthetic namespace are reserved for idle injection.
    pub async fn submit(&self, request: &SubmitRequest, now_ms: u64) -> Result<StateSnapshot, SubmitError> {
        let submission = match validate_submission(request, &self.palette, now_ms) {
            Ok(submission) if submission.is_synthetic() => {
                let err = ValidationError::ReservedId(submission.id);
                debug!(%err, "submission rejected");
                return Err(err.into());
            }
            Ok(submission) => submission,
            Err(err) => {
                debug!(%err, "submission rejected");
                return Err(err.into());
            }
        };

        // Checked and recorded under one lock so concurrent requests from the
        // same submitter cannot both pass.
        let decision = self.throttle.lock().await.check_and_record(&submission.id, now_ms);
        if let ThrottleDecision::Denied { remaining_secs } = decision {
            info!(submitter = %submission.id, remaining_secs, "submission throttled");
            return Err(SubmitError::Throttled { remaining_secs });
        }

        self.commit(submission, now_ms).await
    }

    /// Persists an accepted submission, recomputes the averages and fans the
    /// new state out. Store failures abort before anything is broadcast.
    pub async fn commit(&self, submission: Submission, now_ms: u64) -> Result<StateSnapshot, SubmitError> {
        if let Err(err) = self.persist(&submission, now_ms).await {
            warn!(?err, submitter = %submission.id, "failed to persist submission");
            return Err(err.into());
        }
        if !submission.is_synthetic() {
            self.idle.lock().await.touch(now_ms);
        }
        info!(submitter = %submission.id, color = %submission.color, "submission committed");

        let snapshot = self
            .snapshot(Some(submission.location()), self.config.default_radius_km, now_ms)
            .await;
        match self.hub.broadcast(&snapshot).await {
            Ok(report) => debug!(
                delivered = report.delivered,
                skipped = report.skipped,
                failed = report.failed,
                "state broadcast"
            ),
            Err(err) => warn!(%err, "state broadcast failed"),
        }
        Ok(snapshot)
    }

    async fn persist(&self, submission: &Submission, now_ms: u64) -> Result<(), StoreError> {
        self.store.set_current_color(&submission.color).await?;
        self.store.record_submission(submission).await?;
        let purged = self
            .store
            .purge_older_than(now_ms.saturating_sub(self.config.window_ms))
            .await?;
        if purged > 0 {
            debug!(purged, "expired submissions purged");
        }
        Ok(())
    }

    pub async fn current_color(&self) -> String {
        match self.store.current_color().await {
            Ok(Some(hex)) if !hex.is_empty() => hex,
            Ok(_) => self.random_color(),
            Err(err) => {
                warn!(%err, "current color read failed; using random palette color");
                self.random_color()
            }
        }
    }

    pub async fn global_average(&self, now_ms: u64) -> String {
        match self.window(now_ms).await {
            Ok(window) => self.average_of(&window),
            Err(err) => {
                warn!(%err, "average read failed; using random palette color");
                self.random_color()
            }
        }
    }

    pub async fn proximity(&self, origin: Location, radius_km: f64, now_ms: u64) -> Proximity {
        match self.window(now_ms).await {
            Ok(window) => {
                let global = self.average_of(&window);
                self.proximity_of(&window, &origin, radius_km, &global)
            }
            Err(err) => {
                warn!(%err, "proximity read failed; using random palette color");
                Proximity {
                    average: self.random_color(),
                    nearby_count: 0,
                }
            }
        }
    }

    /// Current color and global average, plus proximity fields when `origin`
    /// is given. Reads the window once for both averages.
    pub async fn snapshot(&self, origin: Option<Location>, radius_km: f64, now_ms: u64) -> StateSnapshot {
        let color = self.current_color().await;
        let window = match self.window(now_ms).await {
            Ok(window) => Some(window),
            Err(err) => {
                warn!(%err, "window read failed; using fallback averages");
                None
            }
        };
        let average = match window.as_deref() {
            Some(window) => self.average_of(window),
            None => self.random_color(),
        };
        let proximity = origin.map(|origin| match window.as_deref() {
            Some(window) => self.proximity_of(window, &origin, radius_km, &average),
            None => Proximity {
                average: average.clone(),
                nearby_count: 0,
            },
        });
        StateSnapshot::new(color, average, proximity)
    }

    /// Idle watcher tick. Injects one synthetic submission when nothing has
    /// been committed for the idle period.
    pub async fn inject_if_idle(&self, now_ms: u64) -> Result<Option<Submission>, SubmitError> {
        if !self.idle.lock().await.take_if_idle(now_ms) {
            return Ok(None);
        }
        let request = self.synthetic_request();
        let submission = validate_submission(&request, &self.palette, now_ms)?;
        self.commit(submission.clone(), now_ms).await?;
        info!(submitter = %submission.id, color = %submission.color, "idle submission injected");
        Ok(Some(submission))
    }

    pub async fn sweep_throttle(&self, now_ms: u64) -> usize {
        let evicted = self.throttle.lock().await.sweep(now_ms);
        if evicted > 0 {
            debug!(evicted, "stale throttle records evicted");
        }
        evicted
    }

    pub async fn last_activity_ms(&self) -> u64 {
        self.idle.lock().await.last_activity_ms()
    }

    /// Forgets throttle records and viewers, and restarts the idle clock.
    pub async fn reset(&self, now_ms: u64) {
        self.throttle.lock().await.clear();
        self.hub.clear().await;
        *self.idle.lock().await = IdleTracker::new(self.config.idle_after_ms, now_ms);
    }

    async fn window(&self, now_ms: u64) -> Result<Vec<Submission>, StoreError> {
        let recent = self
            .store
            .recent_submissions(self.config.window_ms, now_ms)
            .await?;
        Ok(latest_window(&recent, self.config.window_len).to_vec())
    }

    fn average_of(&self, window: &[Submission]) -> String {
        match global_average(window, &self.palette) {
            Some(entry) => entry.hex.clone(),
            None => self.random_color(),
        }
    }

    fn proximity_of(&self, window: &[Submission], origin: &Location, radius_km: f64, global: &str) -> Proximity {
        let average = match proximity_average(window, origin, radius_km, &self.palette) {
            Some(entry) => entry.hex.clone(),
            None => global.to_string(),
        };
        Proximity {
            average,
            nearby_count: nearby_count(window, origin, radius_km),
        }
    }

    fn random_color(&self) -> String {
        let mut rng = rand::rng();
        self.palette
            .random(&mut rng)
            .map(|entry| entry.hex.clone())
            .unwrap_or_else(|| FALLBACK_COLOR.to_string())
    }

    fn synthetic_request(&self) -> SubmitRequest {
        let mut rng = rand::rng();
        let color = self.palette.random(&mut rng).map(|entry| entry.hex.clone());
        let sequence = next_sequence(&self.synthetic_sequence);
        SubmitRequest {
            id: Some(format!("{SYNTHETIC_ID_PREFIX}{sequence}")),
            color,
            lat: Some(rng.random_range(-90.0..=90.0)),
            long: Some(rng.random_range(-180.0..=180.0)),
        }
    }
}
