//! Constants used throughout the application

/// Default camera frame width in pixels
pub const DEFAULT_FRAME_WIDTH: u32 = 640;
/// Default camera frame height in pixels
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// MediaPipe face mesh indices (refined landmarks, 478 points)
pub const LEFT_IRIS: [u32; 4] = [474, 475, 476, 477];
pub const RIGHT_IRIS: [u32; 4] = [469, 470, 471, 472];
pub const LEFT_EYE: [u32; 8] = [33, 133, 160, 159, 158, 144, 145, 153];
pub const RIGHT_EYE: [u32; 8] = [362, 263, 387, 386, 385, 373, 374, 380];
pub const NOSE_TIP: [u32; 1] = [1];

/// Exponential smoothing factor (0-1, smaller is smoother)
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.3;

/// Frames between periodic baseline reassignments
pub const DEFAULT_BASELINE_INTERVAL: u32 = 20;

/// Majority-vote defaults
pub const DEFAULT_IRIS_CHANGE_THRESHOLD: f64 = 0.002;
pub const DEFAULT_MOTION_BUFFER_SIZE: usize = 5;
pub const DEFAULT_CONFIRM_RATIO: f64 = 0.7;

/// Dwell defaults, normalized to frame height/width
pub const DEFAULT_DWELL_DOWN_THRESHOLD: f64 = 0.05;
pub const DEFAULT_DWELL_UP_THRESHOLD: f64 = 0.08;
pub const DEFAULT_DWELL_HORIZONTAL_THRESHOLD: f64 = 0.10;
pub const DEFAULT_LOOK_DOWN_THRESHOLD: f64 = 0.12;
pub const DEFAULT_HOLD_TIME_SECS: f64 = 0.3;
pub const DEFAULT_COMPOUND_HOLD_FACTOR: f64 = 0.6;

/// Saccade defaults
pub const DEFAULT_QUICK_THRESHOLD: f64 = 0.08;
pub const DEFAULT_QUICK_TIME_SECS: f64 = 0.3;

/// Timing defaults (seconds)
pub const DEFAULT_COOLDOWN_SECS: f64 = 1.0;
pub const DEFAULT_SCREEN_OFF_TIMEOUT_SECS: f64 = 3.0;
pub const DEFAULT_WAKE_SAFETY_DELAY_SECS: f64 = 3.0;
pub const DEFAULT_WAKE_PAGE_DELAY_SECS: f64 = 2.0;
pub const DEFAULT_FACE_DETECTION_COOLDOWN_SECS: f64 = 2.0;
pub const DEFAULT_STARTUP_DELAY_SECS: f64 = 4.0;

/// X11 keysyms for the reader commands
pub const XK_PAGE_UP: u32 = 0xff55;
pub const XK_PAGE_DOWN: u32 = 0xff56;
pub const XF86XK_AUDIO_PREV: u32 = 0x1008_ff16;
pub const XF86XK_AUDIO_NEXT: u32 = 0x1008_ff17;

/// Pointer buttons used as screen-off / screen-on signals
pub const SCREEN_OFF_BUTTON: u8 = 1;
pub const SCREEN_ON_BUTTON: u8 = 3;
