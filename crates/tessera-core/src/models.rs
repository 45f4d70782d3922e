//! Grid topology data model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Module/device address within the grid capacity range `[0, N)`.
pub type Address = u32;

/// Network endpoint of a device: a bare host or `host:port`.
///
/// A bare host is contacted on the configured device port.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self(endpoint.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// `host:port` authority, filling in `default_port` when none is given
    pub fn authority(&self, default_port: u16) -> String {
        if self.0.parse::<SocketAddr>().is_ok() {
            return self.0.clone();
        }
        if let Ok(ip) = self.0.parse::<IpAddr>() {
            return SocketAddr::new(ip, default_port).to_string();
        }
        match self.0.rsplit_once(':') {
            Some((_, port)) if port.parse::<u16>().is_ok() => self.0.clone(),
            _ => format!("{}:{}", self.0, default_port),
        }
    }

    /// Full request URL for a device path (path includes the leading `/`)
    pub fn url(&self, default_port: u16, path: &str) -> String {
        format!("http://{}{}", self.authority(default_port), path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Endpoint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<IpAddr> for Endpoint {
    fn from(value: IpAddr) -> Self {
        Self(value.to_string())
    }
}

/// A device discovered by one scan. Serializes as `{ "ip", "id" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "ip")]
    pub endpoint: Endpoint,
    pub id: Address,
}

/// Layout descriptor for one physical module, as reported by a master
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub addr: Address,
    pub x: i32,
    pub y: i32,
    pub rotation: i32,
    #[serde(default, alias = "isPlaced")]
    pub is_placed: bool,
}

/// Modules governed by one master, bound to that master's endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Island {
    pub master_endpoint: Endpoint,
    pub modules: Vec<Module>,
}

impl Island {
    pub fn new(master_endpoint: Endpoint) -> Self {
        Self {
            master_endpoint,
            modules: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn contains(&self, address: Address) -> bool {
        self.modules.iter().any(|m| m.addr == address)
    }

    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.modules.iter().map(|m| m.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_authority_fills_default_port() {
        assert_eq!(Endpoint::from("10.0.0.2").authority(80), "10.0.0.2:80");
        assert_eq!(Endpoint::from("127.0.0.1:8081").authority(80), "127.0.0.1:8081");
        assert_eq!(Endpoint::from("esp-1.local").authority(80), "esp-1.local:80");
        assert_eq!(Endpoint::from("esp-1.local:9000").authority(80), "esp-1.local:9000");
        assert_eq!(Endpoint::from("::1").authority(80), "[::1]:80");
    }

    #[test]
    fn test_endpoint_url() {
        let endpoint = Endpoint::from("172.20.10.3");
        assert_eq!(
            endpoint.url(80, "/setHeight?module=4&height=120"),
            "http://172.20.10.3:80/setHeight?module=4&height=120"
        );
    }

    #[test]
    fn test_device_serializes_as_ip_and_id() {
        let device = Device {
            endpoint: Endpoint::from("10.0.0.2"),
            id: 1,
        };
        assert_eq!(
            serde_json::to_value(&device).unwrap(),
            serde_json::json!({"ip": "10.0.0.2", "id": 1})
        );
    }

    #[test]
    fn test_module_accepts_camel_case_placement_flag() {
        let module: Module =
            serde_json::from_str(r#"{"addr":3,"x":1,"y":2,"rotation":90,"isPlaced":true}"#)
                .unwrap();
        assert!(module.is_placed);

        let module: Module =
            serde_json::from_str(r#"{"addr":3,"x":1,"y":2,"rotation":0}"#).unwrap();
        assert!(!module.is_placed);
    }

    #[test]
    fn test_island_membership() {
        let mut island = Island::new(Endpoint::from("10.0.0.2"));
        assert!(island.is_empty());
        island.modules.push(Module {
            addr: 2,
            x: 1,
            y: 0,
            rotation: 0,
            is_placed: true,
        });
        assert!(island.contains(2));
        assert!(!island.contains(1));
        assert_eq!(island.addresses().collect::<Vec<_>>(), vec![2]);
    }
}
