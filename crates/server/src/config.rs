use dropfour::{DEFAULT_HOST, DEFAULT_PORT, EndpointConfig, TableConfig};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub strict: bool,
    pub outbound_queue: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            strict: false,
            outbound_queue: EndpointConfig::default().outbound_queue,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn table(&self) -> TableConfig {
        TableConfig {
            strict: self.strict,
        }
    }

    pub fn endpoint(&self) -> EndpointConfig {
        EndpointConfig {
            outbound_queue: self.outbound_queue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_addr() {
        assert_eq!(ServerConfig::default().bind_addr(), "localhost:5555");
    }

    #[test]
    fn test_strict_flows_into_table() {
        let config = ServerConfig {
            strict: true,
            outbound_queue: 8,
            ..ServerConfig::default()
        };
        assert!(config.table().strict);
        assert_eq!(config.endpoint().outbound_queue, 8);
    }
}
