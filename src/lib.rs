//! Webcam proctoring aid: per-frame face/eye detection with eye-movement
//! and gaze heuristics, served over HTTP.

pub mod config;
pub mod constants;
pub mod event_log;
pub mod extractors;
pub mod logging;
pub mod middleware;
pub mod pipeline;
pub mod response;
pub mod routes;
pub mod state;
pub mod tracking;
pub mod validation;
pub mod vision;
