use serde::Deserialize;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

/// Environment-derived server configuration
#[derive(Deserialize, Debug)]
pub struct Configuration {
    /// service host IP address
    #[serde(default = "get_v4_localhost")]
    pub host: IpAddr,
    /// service port
    #[serde(default = "get_service_port")]
    pub port: u16,
    /// termination grace period (in milliseconds)
    #[serde(default)]
    termination_period: Option<u64>,
    /// upper bound on any single request (in milliseconds), on top of client-sent deadlines
    #[serde(default)]
    request_timeout: Option<u64>,
}

impl Configuration {
    /// How long to keep serving after SIGTERM is received
    pub fn termination_period(&self) -> Option<Duration> {
        self.termination_period.map(Duration::from_millis)
    }

    /// Server-side limit on the duration of a single request
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout.map(Duration::from_millis)
    }
}

/// Generate a default Ipv4 pointing to localhost for configuration
fn get_v4_localhost() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

/// Generate a default service port for configuration
fn get_service_port() -> u16 {
    50051
}

/// Convert configurations into a valid SocketAddr
impl From<&Configuration> for SocketAddr {
    fn from(configuration: &Configuration) -> Self {
        SocketAddr::new(configuration.host, configuration.port)
    }
}
