//! Fixed scheduling policy constants.

/// An applied interval strictly above this many days marks a card mature.
pub const MATURE_INTERVAL: i32 = 21;

pub const MIN_REVIEW_INTERVAL: i32 = 1;
pub const MAX_REVIEW_INTERVAL: i32 = 999;

pub const MIN_LIMIT_REVIEWS: i32 = 0;
pub const MAX_LIMIT_REVIEWS: i32 = 999;

pub const MIN_NEW_REVIEWS: i32 = 0;
pub const MAX_NEW_REVIEWS: i32 = 100;

/// How many days reviews can at most be pushed ahead in one call.
pub const MAX_PUSH_REVIEWS_DAYS: i32 = 7;

pub const DEFAULT_EASY_FACTOR: f64 = 2.5;
pub const MIN_EASY_FACTOR: f64 = 0.1;

pub const STORY_MIN_LENGTH: u64 = 1;
pub const STORY_MAX_LENGTH: u64 = 160;
pub const HINT_MIN_LENGTH: u64 = 1;
pub const HINT_MAX_LENGTH: u64 = 25;

/// Whether an extra (practice) review advances `review_count`, the due
/// date and maturity. Extra reviews are always written to the review
/// ledger for statistics either way.
pub const EXTRA_REVIEW_AFFECTS_SCHEDULE: bool = false;
