//! Desktop notifications

pub mod permission;

pub use permission::{LogBackend, NotificationBackend, NotificationRequest, Notifier, Permission, ShowOutcome};
