pub mod config;
mod emotion_routes;
mod http_layers;
pub mod metrics;
mod playlist_routes;
pub mod server;
mod session;
mod song_routes;
pub mod state;
mod stream_song;

pub use config::ServerConfig;
pub use http_layers::{log_requests, RequestsLoggingLevel};
pub use server::run_server;
