use once_cell::sync::Lazy;
use std::env;
use std::net::SocketAddr;

pub static CONFIG: Lazy<Config> = Lazy::new(Config::new);

pub struct Config {
    pub server_addr: SocketAddr,
    pub allowed_origin: String,
}

impl Config {
    fn new() -> Self {
        let server_addr = env::var("SERVER_ADDR")
            .ok()
            .and_then(|v| v.parse::<SocketAddr>().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)));
        let allowed_origin =
            env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Self {
            server_addr,
            allowed_origin,
        }
    }
}
