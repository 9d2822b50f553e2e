//! What's New catalog notification module.
//!
//! Provides functionality to notify users about new catalog content
//! when changelog batches are closed.

mod notifier;

pub use notifier::WhatsNewNotifier;
