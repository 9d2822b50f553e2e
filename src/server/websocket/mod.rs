//! WebSocket infrastructure for real-time communication.
//!
//! This module provides generic WebSocket support that can be extended
//! for features like user data sync, remote playback control, and notifications.

// Submodules will be added as they are implemented:
// pub mod messages;
// pub mod connection;
// pub mod handler;
