use std::env;
use std::net::SocketAddr;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3000;

/// Server settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    /// Reads `PORT`, falling back to [`DEFAULT_PORT`] when unset or invalid.
    pub fn from_env() -> Self {
        Self {
            port: parse_port(env::var("PORT").ok()),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn parse_port(raw: Option<String>) -> u16 {
    match raw {
        Some(port_str) => match port_str.trim().parse::<u16>() {
            Ok(port_num) => {
                info!("Using port {} from environment variable PORT.", port_num);
                port_num
            }
            Err(_) => {
                warn!(
                    "Invalid PORT value '{}' in environment variable. Using default port {}.",
                    port_str, DEFAULT_PORT
                );
                DEFAULT_PORT
            }
        },
        None => {
            info!(
                "PORT environment variable not set. Using default port {}.",
                DEFAULT_PORT
            );
            DEFAULT_PORT
        }
    }
}
