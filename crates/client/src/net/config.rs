use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout_secs: u64,
    /// How long the final board stays on screen after the server goes away.
    pub linger_secs: u64,
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn linger(&self) -> Duration {
        Duration::from_secs(self.linger_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: dropfour::DEFAULT_HOST.to_string(),
            port: dropfour::DEFAULT_PORT,
            connect_timeout_secs: 5,
            linger_secs: 10,
        }
    }
}
