//! Inventory loading and validation
//!
//! The provisioning layer describes every probe node as an entry in a JSON
//! object keyed by node id:
//!
//! ```json
//! {
//!   "us-east-1-use1-az1": {
//!     "instance_id": "i-0abc", "private_ip": "10.0.1.10", "public_ip": "3.80.1.2",
//!     "az_id": "use1-az1", "az_name": "us-east-1a", "region": "us-east-1", "cloud": "aws"
//!   }
//! }
//! ```
//!
//! Entries are validated into [`Node`]s and grouped by region. Any structural
//! problem is a fatal [`AppError::MalformedInventory`].

pub mod source;

pub use source::InventorySource;

use crate::{
    error::{AppError, Result},
    models::Node,
};
use serde::{
    de::{self, IgnoredAny, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;
use std::net::IpAddr;

/// Node descriptor as emitted by the provisioning collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub az_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub az_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
}

impl From<&Node> for NodeDescriptor {
    fn from(node: &Node) -> Self {
        Self {
            instance_id: node.instance_id.clone(),
            private_ip: Some(node.private_address.clone()),
            public_ip: node.public_address.clone(),
            az_id: Some(node.az_id.clone()),
            az_name: node.az_name.clone(),
            region: Some(node.region.clone()),
            cloud: node.cloud.clone(),
        }
    }
}

/// JSON object whose keys must all be distinct; plain maps keep the last
/// of repeated keys
struct UniqueKeys<V>(BTreeMap<String, V>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for UniqueKeys<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct UniqueKeysVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueKeysVisitor<V> {
            type Value = UniqueKeys<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object keyed by node id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = BTreeMap::new();
                while let Some(key) = access.next_key::<String>()? {
                    if entries.contains_key(&key) {
                        return Err(de::Error::custom(format!("key '{}' appears more than once", key)));
                    }
                    let value = access.next_value()?;
                    entries.insert(key, value);
                }
                Ok(UniqueKeys(entries))
            }
        }

        deserializer.deserialize_map(UniqueKeysVisitor(PhantomData))
    }
}

/// `terraform output -json <name>` envelope
#[derive(Deserialize)]
struct TerraformOutput {
    value: UniqueKeys<NodeDescriptor>,
}

/// Validated set of probe nodes keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    nodes: BTreeMap<String, Node>,
}

impl Inventory {
    /// Parse and validate an inventory document.
    ///
    /// Accepts either the bare id → descriptor map or Terraform's
    /// `{"value": {...}, "type": ...}` wrapper around it.
    pub fn from_json(json: &str) -> Result<Self> {
        let top: UniqueKeys<IgnoredAny> = serde_json::from_str(json)
            .map_err(|e| AppError::malformed_inventory(format!("inventory must be a JSON object keyed by node id: {}", e)))?;

        let descriptors = if top.0.contains_key("value") && top.0.contains_key("type") {
            serde_json::from_str::<TerraformOutput>(json).map(|output| output.value.0)
        } else {
            serde_json::from_str::<UniqueKeys<NodeDescriptor>>(json).map(|map| map.0)
        }
        .map_err(|e| AppError::malformed_inventory(format!("inventory must map node ids to descriptors: {}", e)))?;

        Self::from_descriptors(descriptors)
    }

    /// Validate raw descriptors into nodes
    pub fn from_descriptors(descriptors: BTreeMap<String, NodeDescriptor>) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(AppError::malformed_inventory("inventory contains no nodes"));
        }

        let mut nodes = BTreeMap::new();
        let mut seen_azs: BTreeSet<(String, String)> = BTreeSet::new();

        for (id, descriptor) in descriptors {
            let node = validate_descriptor(&id, descriptor)?;

            if !seen_azs.insert((node.region.clone(), node.az_id.clone())) {
                return Err(AppError::malformed_inventory(format!(
                    "az_id '{}' appears more than once in region '{}'",
                    node.az_id, node.region
                )));
            }

            nodes.insert(id, node);
        }

        Ok(Self { nodes })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Group nodes by region; regions iterate in sorted order
    pub fn by_region(&self) -> BTreeMap<String, Vec<Node>> {
        let mut grouped: BTreeMap<String, Vec<Node>> = BTreeMap::new();
        for node in self.nodes.values() {
            grouped.entry(node.region.clone()).or_default().push(node.clone());
        }
        grouped
    }

    /// Sorted, de-duplicated region names
    pub fn regions(&self) -> Vec<String> {
        self.by_region().into_keys().collect()
    }

    /// Sorted, de-duplicated cloud tags (defaulted where absent)
    pub fn clouds(&self) -> Vec<String> {
        self.nodes
            .values()
            .map(|n| n.cloud_or_default().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Serializable snapshot in the provisioning collaborator's format
    pub fn to_descriptors(&self) -> BTreeMap<String, NodeDescriptor> {
        self.nodes
            .iter()
            .map(|(id, node)| (id.clone(), NodeDescriptor::from(node)))
            .collect()
    }
}

fn validate_descriptor(id: &str, descriptor: NodeDescriptor) -> Result<Node> {
    if id.trim().is_empty() {
        return Err(AppError::malformed_inventory("node id cannot be empty"));
    }

    let region = required_field(id, "region", descriptor.region)?;
    let az_id = required_field(id, "az_id", descriptor.az_id)?;
    let private_address = required_field(id, "private_ip", descriptor.private_ip)?;

    if !is_valid_address(&private_address) {
        return Err(AppError::malformed_inventory(format!(
            "node '{}' has an invalid private_ip '{}'",
            id, private_address
        )));
    }

    let public_address = non_empty(descriptor.public_ip);
    if let Some(address) = &public_address {
        if !is_valid_address(address) {
            return Err(AppError::malformed_inventory(format!(
                "node '{}' has an invalid public_ip '{}'",
                id, address
            )));
        }
    }

    Ok(Node {
        id: id.to_string(),
        region,
        az_id,
        az_name: non_empty(descriptor.az_name),
        instance_id: non_empty(descriptor.instance_id),
        public_address,
        private_address,
        cloud: non_empty(descriptor.cloud),
    })
}

fn required_field(id: &str, field: &str, value: Option<String>) -> Result<String> {
    non_empty(value).ok_or_else(|| {
        AppError::malformed_inventory(format!("node '{}' is missing required field '{}'", id, field))
    })
}

/// Provisioning tools emit `""` for unset attributes
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Syntactic check for an IPv4/IPv6 literal or a DNS host name
pub fn is_valid_address(address: &str) -> bool {
    if address.parse::<IpAddr>().is_ok() {
        return true;
    }

    match url::Host::parse(address) {
        Ok(url::Host::Domain(domain)) => is_hostname(&domain),
        _ => false,
    }
}

fn is_hostname(name: &str) -> bool {
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() || name.len() > 253 {
        return false;
    }

    name.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
