//! Configuration for the gateway daemon
//!
//! Loads configuration from a TOML file: serial port to the coordinator,
//! TCP listen address for control clients, log level.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
}

/// Serial link to the ZigBee coordinator
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerialConfig {
    /// Coordinator serial device (e.g., /dev/ttyACM0)
    pub port: String,
    /// Baud rate (coordinator firmware runs at 115200)
    pub baud_rate: u32,
}

/// TCP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Bind address for the client listener
    ///
    /// Examples:
    /// - `0.0.0.0:16000` - all interfaces
    /// - `127.0.0.1:16000` - localhost only
    pub bind_address: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Default configuration
    ///
    /// Suitable for testing and development. Production deployments
    /// should use a proper TOML configuration file.
    pub fn defaults() -> Self {
        Self {
            serial: SerialConfig {
                port: "/dev/ttyACM0".to_string(),
                baud_rate: 115_200,
            },
            network: NetworkConfig {
                bind_address: "0.0.0.0:16000".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::defaults();
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.network.bind_address, "0.0.0.0:16000");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[serial]
port = "/dev/ttyUSB0"
baud_rate = 57600

[network]
bind_address = "127.0.0.1:17000"

[logging]
level = "debug"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 57600);
        assert_eq!(config.network.bind_address, "127.0.0.1:17000");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::defaults();
        let toml_string = toml::to_string_pretty(&config).unwrap();
        assert!(toml_string.contains("[serial]"));
        assert!(toml_string.contains("[network]"));
        assert!(toml_string.contains("[logging]"));

        let parsed: AppConfig = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.serial.port, config.serial.port);
    }
}
