use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;
use tokio::sync::broadcast;

use proctor_shield::config::{Config, DetectorConfig, TrackingConfig};
use proctor_shield::event_log::{EventLog, FileEventLog, MemoryEventLog};
use proctor_shield::routes::build_router;
use proctor_shield::state::AppState;
use proctor_shield::vision::{Scene, ScriptedDetector};

pub const INDEX_HTML: &str = "<!doctype html><title>Proctor Shield</title>";
pub const APP_JS: &str = "console.log('proctor');";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    pub detector: Arc<ScriptedDetector>,
    pub event_log_path: PathBuf,
    _temp_dir: TempDir,
}

fn test_config(temp_dir: &TempDir, tracking: TrackingConfig) -> Config {
    let static_dir = temp_dir.path().join("static");
    std::fs::create_dir_all(&static_dir).expect("static dir");
    std::fs::write(static_dir.join("index.html"), INDEX_HTML).expect("index.html");
    std::fs::write(static_dir.join("app.js"), APP_JS).expect("app.js");

    // Built directly instead of through env vars to keep parallel tests independent.
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 5000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        cors_origin: "*".to_string(),
        static_dir: static_dir.to_string_lossy().to_string(),
        event_log_path: temp_dir
            .path()
            .join("face_counter.log")
            .to_string_lossy()
            .to_string(),
        max_frame_bytes: 2 * 1024 * 1024,
        detector: DetectorConfig {
            face_cascade_path: String::new(),
            eye_cascade_path: String::new(),
        },
        tracking,
    }
}

fn assemble(
    temp_dir: TempDir,
    config: Config,
    scenes: Vec<Scene>,
    event_log: Arc<dyn EventLog>,
) -> TestApp {
    let detector = Arc::new(ScriptedDetector::new(scenes));
    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::new(detector.clone(), event_log, &config, shutdown_tx);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        event_log_path: PathBuf::from(&config.event_log_path),
        config,
        detector,
        _temp_dir: temp_dir,
    }
}

pub fn spawn_with(scenes: Vec<Scene>, tracking: TrackingConfig) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(&temp_dir, tracking);
    let event_log =
        Arc::new(FileEventLog::open(&config.event_log_path).expect("open event log"));
    assemble(temp_dir, config, scenes, event_log)
}

pub fn spawn_test_app(scenes: Vec<Scene>) -> TestApp {
    spawn_with(scenes, TrackingConfig::default())
}

/// Same app backed by an in-memory event log the test can switch into failure.
pub fn spawn_with_memory_log(scenes: Vec<Scene>) -> (TestApp, Arc<MemoryEventLog>) {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(&temp_dir, TrackingConfig::default());
    let memory = Arc::new(MemoryEventLog::new());
    let app = assemble(temp_dir, config, scenes, memory.clone());
    (app, memory)
}
