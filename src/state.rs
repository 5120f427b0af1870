use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::event_log::EventLog;
use crate::pipeline::FrameProcessor;
use crate::tracking::SessionStore;
use crate::vision::{FeatureDetector, MovementEstimator};

#[derive(Clone)]
pub struct AppState {
    processor: Arc<FrameProcessor>,
    sessions: Arc<SessionStore>,
    event_log: Arc<dyn EventLog>,
    config: Arc<Config>,
    shutdown_tx: broadcast::Sender<()>,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        detector: Arc<dyn FeatureDetector>,
        event_log: Arc<dyn EventLog>,
        config: &Config,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        let estimator = MovementEstimator::with_pairing(config.tracking.pairing);
        Self {
            processor: Arc::new(FrameProcessor::new(detector, estimator)),
            sessions: Arc::new(SessionStore::from_config(&config.tracking)),
            event_log,
            config: Arc::new(config.clone()),
            shutdown_tx,
            started_at: Instant::now(),
        }
    }

    pub fn processor(&self) -> &Arc<FrameProcessor> {
        &self.processor
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn event_log(&self) -> &Arc<dyn EventLog> {
        &self.event_log
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shutdown_rx(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
