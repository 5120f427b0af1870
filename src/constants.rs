/// Cascade pyramid scale step shared by face and eye detection.
pub const DETECT_SCALE_FACTOR: f64 = 1.1;

/// Minimum overlapping hits before a cascade candidate is kept.
pub const DETECT_MIN_NEIGHBORS: i32 = 5;

/// Smallest face the detector reports (pixels, square).
pub const FACE_MIN_SIZE_PX: u32 = 30;

/// Smallest eye the detector reports (pixels, square).
pub const EYE_MIN_SIZE_PX: u32 = 10;

/// Center displacement above which an eye counts as moved (pixels, strict).
pub const MOVEMENT_THRESHOLD_PX: f64 = 10.0;

/// |offset / face width| beyond which the gaze leaves "center".
pub const GAZE_CENTER_BAND: f64 = 0.1;

/// Previous eye positions kept per session.
pub const PREVIOUS_EYES_LIMIT: usize = 5;

/// Lines returned by the log tail endpoint.
pub const LOG_TAIL_LINES: usize = 10;

/// Session used when the client does not identify itself.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Logger name written into every event log line.
pub const EVENT_LOGGER_NAME: &str = "proctor_shield";
