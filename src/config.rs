use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::vision::movement::EyePairing;

const DEFAULT_FACE_CASCADE: &str =
    "/usr/share/opencv4/haarcascades/haarcascade_frontalface_default.xml";
const DEFAULT_EYE_CASCADE: &str = "/usr/share/opencv4/haarcascades/haarcascade_eye.xml";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub cors_origin: String,
    pub static_dir: String,
    pub event_log_path: String,
    pub max_frame_bytes: usize,
    pub detector: DetectorConfig,
    pub tracking: TrackingConfig,
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub face_cascade_path: String,
    pub eye_cascade_path: String,
}

#[derive(Debug, Clone)]
pub struct TrackingConfig {
    pub session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub max_sessions: usize,
    pub pairing: EyePairing,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 1800,
            sweep_interval_secs: 60,
            max_sessions: 1024,
            pairing: EyePairing::Positional,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 5000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            cors_origin: env_or("CORS_ORIGIN", "*"),
            static_dir: env_or("STATIC_DIR", "."),
            event_log_path: env_or("EVENT_LOG_PATH", "face_counter.log"),
            max_frame_bytes: env_or_parse("MAX_FRAME_BYTES", 8 * 1024 * 1024_usize),
            detector: DetectorConfig {
                face_cascade_path: env_or("FACE_CASCADE_PATH", DEFAULT_FACE_CASCADE),
                eye_cascade_path: env_or("EYE_CASCADE_PATH", DEFAULT_EYE_CASCADE),
            },
            tracking: TrackingConfig {
                session_ttl_secs: env_or_parse("SESSION_TTL_SECS", 1800_u64),
                sweep_interval_secs: env_or_parse("SESSION_SWEEP_SECS", 60_u64).max(1),
                max_sessions: env_or_parse("MAX_SESSIONS", 1024_usize).max(1),
                pairing: pairing_from_env(),
            },
        }
    }
}

fn pairing_from_env() -> EyePairing {
    let max_distance = env_or_parse("EYE_PAIRING_MAX_DISTANCE", 60.0_f64);
    match env_or("EYE_PAIRING", "positional")
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "positional" => EyePairing::Positional,
        "nearest" => EyePairing::Nearest { max_distance },
        other => {
            tracing::warn!(value = %other, "Unknown EYE_PAIRING, using positional");
            EyePairing::Positional
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
