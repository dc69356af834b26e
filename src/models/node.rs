//! Probe node and AZ pair records

use serde::{Deserialize, Serialize};

/// Cloud tag assumed when an inventory entry carries none
pub const DEFAULT_CLOUD: &str = "aws";

/// A deployed probe endpoint, one per availability zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier, unique within an inventory (e.g. `us-east-1-use1-az1`)
    pub id: String,

    /// Cloud region name
    pub region: String,

    /// Availability-zone identifier, unique within a region
    pub az_id: String,

    /// Provider-facing AZ name (e.g. `us-east-1a`), informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub az_name: Option<String>,

    /// Provider instance identifier, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,

    /// Address the control channel dials; required for probe sources only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,

    /// Address probes are aimed at
    pub private_address: String,

    /// Provider tag, used for labeling and SSH user selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
}

impl Node {
    /// Provider tag, falling back to [`DEFAULT_CLOUD`]
    pub fn cloud_or_default(&self) -> &str {
        self.cloud.as_deref().unwrap_or(DEFAULT_CLOUD)
    }
}

/// An unordered combination of two nodes in the same region.
///
/// The planner always puts the node with the smaller `az_id` in `source`;
/// the probe runs from `source` toward `target.private_address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub region: String,
    pub source: Node,
    pub target: Node,
}

impl Pair {
    pub fn new(region: impl Into<String>, source: Node, target: Node) -> Self {
        Self {
            region: region.into(),
            source,
            target,
        }
    }

    pub fn source_az(&self) -> &str {
        &self.source.az_id
    }

    pub fn target_az(&self) -> &str {
        &self.target.az_id
    }

    /// Display label, e.g. `az-a<->az-b`
    pub fn label(&self) -> String {
        format!("{}<->{}", self.source.az_id, self.target.az_id)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Node;

    /// Minimal node used across unit tests
    pub fn node(region: &str, az_id: &str) -> Node {
        Node {
            id: format!("{}-{}", region, az_id),
            region: region.to_string(),
            az_id: az_id.to_string(),
            az_name: None,
            instance_id: None,
            public_address: Some(format!("203.0.113.{}", az_id.len())),
            private_address: format!("10.0.0.{}", az_id.len()),
            cloud: Some("aws".to_string()),
        }
    }
}
