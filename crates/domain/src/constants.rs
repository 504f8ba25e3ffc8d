//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Video identifier extraction
pub const VIDEO_ID_LENGTH: usize = 11;
pub const THUMBNAIL_BASE_URL: &str = "https://img.youtube.com/vi";
pub const THUMBNAIL_VARIANT: &str = "mqdefault.jpg";

// Suggestion heuristics
pub const INACTIVITY_WARNING_DAYS: i64 = 4;
pub const HIGH_COMPLETION_RATE: u32 = 80;
pub const LOW_COMPLETION_RATE: u32 = 50;
pub const HIGH_RATE_MIN_SESSIONS: usize = 3;
pub const LOW_RATE_MIN_SESSIONS: usize = 2;
pub const REPETITION_WINDOW: usize = 3;
pub const NEGLECTED_CATEGORY_DISPLAY_CAP: usize = 2;

// Watch-time accrual
pub const WATCH_TICK_SECS: u64 = 1;

// Document store namespace for the single implicit user
pub const DEFAULT_USER_NAMESPACE: &str = "default-user";
