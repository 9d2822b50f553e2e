//! Client and data models for the external downloader service.

pub mod client;
pub mod models;

pub use client::DownloaderClient;
