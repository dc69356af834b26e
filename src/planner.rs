//! Full-mesh pair planning
//!
//! Each region's nodes are sorted by `az_id` and every unordered combination
//! `(i, j)` with `i < j` becomes one [`Pair`], so the plan is reproducible for
//! identical input. The node with the smaller `az_id` is the probe source.

use crate::{
    error::{AppError, Result},
    inventory::Inventory,
    models::{Node, Pair},
};
use std::collections::BTreeMap;

/// Planned pairs per region, regions in sorted order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairPlan {
    regions: BTreeMap<String, Vec<Pair>>,
}

impl PairPlan {
    pub fn total_pairs(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }

    /// All regions in the inventory, including those with no pairs
    pub fn regions(&self) -> impl Iterator<Item = (&str, &[Pair])> {
        self.regions.iter().map(|(r, p)| (r.as_str(), p.as_slice()))
    }

    pub fn region_names(&self) -> Vec<String> {
        self.regions.keys().cloned().collect()
    }

    pub fn pairs_for(&self, region: &str) -> &[Pair] {
        self.regions.get(region).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.total_pairs() == 0
    }
}

/// Plan pairs for every region of a validated inventory
pub fn plan_pairs(inventory: &Inventory) -> Result<PairPlan> {
    let mut regions = BTreeMap::new();
    for (region, nodes) in inventory.by_region() {
        let pairs = plan_region(&region, &nodes)?;
        regions.insert(region, pairs);
    }
    Ok(PairPlan { regions })
}

/// Plan the unordered cross-AZ pairs of one region.
///
/// Fewer than two nodes yields no pairs. A repeated `az_id` or a source node
/// without a public address is a [`AppError::MalformedInventory`].
pub fn plan_region(region: &str, nodes: &[Node]) -> Result<Vec<Pair>> {
    let mut sorted: Vec<&Node> = nodes.iter().collect();
    sorted.sort_by(|a, b| a.az_id.cmp(&b.az_id));

    if let Some(window) = sorted.windows(2).find(|w| w[0].az_id == w[1].az_id) {
        return Err(AppError::malformed_inventory(format!(
            "az_id '{}' appears more than once in region '{}'",
            window[0].az_id, region
        )));
    }

    let n = sorted.len();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);

    for (i, source) in sorted.iter().enumerate() {
        for target in &sorted[i + 1..] {
            if source.public_address.is_none() {
                return Err(AppError::malformed_inventory(format!(
                    "node '{}' in region '{}' probes {} but has no public address",
                    source.id, region, target.az_id
                )));
            }
            pairs.push(Pair::new(region, (*source).clone(), (*target).clone()));
        }
    }

    Ok(pairs)
}
