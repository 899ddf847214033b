mod client;
mod config;

pub use client::{ConnectError, NetworkClient, NetworkEvent};
pub use config::ClientConfig;
