//! Device wire vocabulary
//!
//! Paths and payload decoding for the HTTP GET operations every grid module
//! exposes on its device port.

use crate::error::ProbeError;
use crate::models::{Address, Module};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Negotiated role of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Master,
    Slave,
}

impl Role {
    pub fn directive(self) -> Directive {
        match self {
            Role::Master => Directive::BecomeMaster,
            Role::Slave => Directive::BecomeSlave,
        }
    }
}

/// One-way command; the device acknowledges with any success status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Directive {
    BecomeMaster,
    BecomeSlave,
    BeginGrid,
    SetHeight { module: Address, height: u32 },
}

impl Directive {
    pub fn path(&self) -> String {
        match self {
            Directive::BecomeMaster => "/becomeMaster".to_string(),
            Directive::BecomeSlave => "/becomeSlave".to_string(),
            Directive::BeginGrid => "/beginGrid".to_string(),
            Directive::SetHeight { module, height } => {
                format!("/setHeight?module={module}&height={height}")
            }
        }
    }
}

/// Request whose response body carries a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Query {
    GetId,
    GetGrid,
}

impl Query {
    pub fn path(&self) -> &'static str {
        match self {
            Query::GetId => "/getID",
            Query::GetGrid => "/getGrid",
        }
    }
}

/// Decode a `/getID` body: a JSON array whose first element is the address.
///
/// The address is returned unvalidated; range checks against the grid
/// capacity belong to the scan.
pub fn decode_identity(body: &[u8]) -> Result<i64, ProbeError> {
    let values: Vec<serde_json::Value> =
        serde_json::from_slice(body).map_err(|e| ProbeError::MalformedResponse {
            payload: "identity",
            reason: e.to_string(),
        })?;

    values
        .first()
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| ProbeError::MalformedResponse {
            payload: "identity",
            reason: "expected a non-empty array starting with an integer".to_string(),
        })
}

/// One entry of a `/getGrid` body, as reported by a master.
///
/// `addr` is kept as reported; a descriptor only becomes a [`Module`] once
/// its address is known to fit the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ModuleDescriptor {
    pub addr: i64,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub rotation: i32,
    #[serde(default, alias = "isPlaced")]
    pub is_placed: bool,
}

impl ModuleDescriptor {
    /// `None` if `addr` is not a valid [`Address`]
    pub fn module(&self) -> Option<Module> {
        let addr = Address::try_from(self.addr).ok()?;
        Some(Module {
            addr,
            x: self.x,
            y: self.y,
            rotation: self.rotation,
            is_placed: self.is_placed,
        })
    }
}

/// Decode a `/getGrid` body: a JSON array of module descriptors
pub fn decode_grid(body: &[u8]) -> Result<Vec<ModuleDescriptor>, ProbeError> {
    serde_json::from_slice(body).map_err(|e| ProbeError::MalformedResponse {
        payload: "grid",
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_paths() {
        assert_eq!(Directive::BecomeMaster.path(), "/becomeMaster");
        assert_eq!(Directive::BecomeSlave.path(), "/becomeSlave");
        assert_eq!(Directive::BeginGrid.path(), "/beginGrid");
        assert_eq!(
            Directive::SetHeight {
                module: 7,
                height: 150
            }
            .path(),
            "/setHeight?module=7&height=150"
        );
        assert_eq!(Role::Master.directive(), Directive::BecomeMaster);
        assert_eq!(Directive::BeginGrid.to_string(), "begin_grid");
    }

    #[test]
    fn test_decode_identity() {
        assert_eq!(decode_identity(b"[4]").unwrap(), 4);
        assert_eq!(decode_identity(b"[12, \"extra\"]").unwrap(), 12);
        assert_eq!(decode_identity(b"[-1]").unwrap(), -1);

        for bad in [&b"[]"[..], b"4", b"[\"4\"]", b"not json"] {
            let err = decode_identity(bad).unwrap_err();
            assert_eq!(err.kind(), "malformed", "body {:?}", String::from_utf8_lossy(bad));
        }
    }

    #[test]
    fn test_decode_grid() {
        let modules = decode_grid(
            br#"[{"addr":1,"x":0,"y":0,"rotation":0,"is_placed":true},
                 {"addr":2,"x":1,"y":0,"rotation":180,"is_placed":false}]"#,
        )
        .unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[1].rotation, 180);
        assert!(decode_grid(b"[]").unwrap().is_empty());
        assert!(decode_grid(br#"[{"x":1,"y":0}]"#).is_err());
        assert!(decode_grid(br#"{"addr":1}"#).is_err());
    }

    #[test]
    fn test_negative_descriptor_decodes_without_failing_layout() {
        let descriptors = decode_grid(
            br#"[{"addr":1,"x":0,"y":0,"rotation":0,"is_placed":true},
                 {"addr":-1,"x":3,"y":3,"rotation":0,"is_placed":true},
                 {"addr":2,"isPlaced":true}]"#,
        )
        .unwrap();
        assert_eq!(descriptors.len(), 3);
        assert_eq!(descriptors[1].addr, -1);
        assert!(descriptors[1].module().is_none());
        assert!(descriptors[2].is_placed);
        assert_eq!(descriptors[2].module().map(|m| m.addr), Some(2));

        let huge = ModuleDescriptor {
            addr: i64::from(u32::MAX) + 1,
            x: 0,
            y: 0,
            rotation: 0,
            is_placed: false,
        };
        assert!(huge.module().is_none());
    }
}
