pub mod config;
mod http_layers;
pub mod metrics;
pub mod proxy;
mod search;
pub mod server;
pub(self) mod session;
pub mod state;
pub(self) mod stream_track;

pub use config::ServerConfig;
pub use http_layers::*;
pub use proxy::CatalogProxy;
pub(self) use search::make_search_routes;
#[allow(unused_imports)] // Used by main.rs
pub use server::run_server;
