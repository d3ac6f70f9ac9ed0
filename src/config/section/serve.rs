//! `[serve]`: where `kiln dev` listens and whether it watches.
//!
//! ```toml
//! [serve]
//! interface = "0.0.0.0"   # reachable from the LAN; default is loopback only
//! port = 8080             # first port tried; the next nine are fallbacks
//! watch = false           # serve one build, no rebuilds or reload client
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

pub const FIELD_PORT: &str = "serve.port";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub interface: IpAddr,
    pub port: u16,
    /// Rebuild on source changes and inject the reload client.
    pub watch: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            watch: true,
        }
    }
}

impl ServeConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port == 0 {
            diag.error(FIELD_PORT, "port must not be 0")
                .hint("the default is 3000");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use std::net::Ipv6Addr;

    #[test]
    fn test_defaults_listen_on_loopback() {
        let serve = test_parse_config("").serve;
        assert_eq!(serve.interface, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(serve.port, 3000);
        assert!(serve.watch);
    }

    #[test]
    fn test_overrides() {
        let serve = test_parse_config("[serve]\ninterface = \"::1\"\nport = 8080\nwatch = false").serve;
        assert_eq!(serve.interface, IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(serve.port, 8080);
        assert!(!serve.watch);
    }

    #[test]
    fn test_port_zero_rejected() {
        let serve = ServeConfig {
            port: 0,
            ..ServeConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        serve.validate(&mut diag);
        assert_eq!(diag.errors()[0].field, FIELD_PORT);
    }
}
