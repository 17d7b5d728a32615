//! Process-wide gateway counters.
//!
//! Cheap atomics bumped by the dispatcher and the driver; a [`Snapshot`] is logged
//! when the gateway stops.
use std::sync::atomic::{AtomicU64, Ordering};

static COMMANDS_HANDLED: AtomicU64 = AtomicU64::new(0);
static UNRECOGNIZED_COMMANDS: AtomicU64 = AtomicU64::new(0);
static FRAMES_SENT: AtomicU64 = AtomicU64::new(0);
static FRAMES_FAILED: AtomicU64 = AtomicU64::new(0);
static EMAILS_SENT: AtomicU64 = AtomicU64::new(0);
static EMAILS_FAILED: AtomicU64 = AtomicU64::new(0);
static FETCHES: AtomicU64 = AtomicU64::new(0);
static FETCHES_FAILED: AtomicU64 = AtomicU64::new(0);
static BACKEND_TIMEOUTS: AtomicU64 = AtomicU64::new(0);

pub fn inc_commands_handled() {
    COMMANDS_HANDLED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_unrecognized() {
    UNRECOGNIZED_COMMANDS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_frames_sent() {
    FRAMES_SENT.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_frames_failed() {
    FRAMES_FAILED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_emails_sent() {
    EMAILS_SENT.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_emails_failed() {
    EMAILS_FAILED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_fetches() {
    FETCHES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_fetches_failed() {
    FETCHES_FAILED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_backend_timeouts() {
    BACKEND_TIMEOUTS.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub commands_handled: u64,
    pub unrecognized_commands: u64,
    pub frames_sent: u64,
    pub frames_failed: u64,
    pub emails_sent: u64,
    pub emails_failed: u64,
    pub fetches: u64,
    pub fetches_failed: u64,
    pub backend_timeouts: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        commands_handled: COMMANDS_HANDLED.load(Ordering::Relaxed),
        unrecognized_commands: UNRECOGNIZED_COMMANDS.load(Ordering::Relaxed),
        frames_sent: FRAMES_SENT.load(Ordering::Relaxed),
        frames_failed: FRAMES_FAILED.load(Ordering::Relaxed),
        emails_sent: EMAILS_SENT.load(Ordering::Relaxed),
        emails_failed: EMAILS_FAILED.load(Ordering::Relaxed),
        fetches: FETCHES.load(Ordering::Relaxed),
        fetches_failed: FETCHES_FAILED.load(Ordering::Relaxed),
        backend_timeouts: BACKEND_TIMEOUTS.load(Ordering::Relaxed),
    }
}
