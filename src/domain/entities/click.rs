//! Click entity representing a single recorded redirect.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Coarse device classification attached to a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(DeviceType::Desktop),
            "mobile" => Ok(DeviceType::Mobile),
            "tablet" => Ok(DeviceType::Tablet),
            other => Err(format!("unknown device type: {other}")),
        }
    }
}

/// A click event as persisted in the click stat store.
#[derive(Debug, Clone)]
pub struct Click {
    pub id: Uuid,
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub country: Option<String>,
    pub device_type: Option<DeviceType>,
}

/// Input data for recording a new click event.
///
/// The event id is a UUIDv7 generated by the caller, so ids are time-ordered
/// and never reused.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClick {
    pub id: Uuid,
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub country: Option<String>,
    pub device_type: Option<DeviceType>,
}

impl NewClick {
    /// Creates a click record with a fresh time-ordered id and no metadata.
    pub fn new(link_id: i64, clicked_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            link_id,
            clicked_at,
            ip: None,
            user_agent: None,
            referer: None,
            country: None,
            device_type: None,
        }
    }
}
