//! Per-object communication edges

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ElementId;

/// The communication edges of one object in one phase
///
/// Both directions are multi-valued: repeated edges to the same peer
/// accumulate instead of replacing each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectCommunicator {
    object_id: ElementId,
    sent: BTreeMap<ElementId, Vec<f64>>,
    received: BTreeMap<ElementId, Vec<f64>>,
}

impl ObjectCommunicator {
    pub fn new(object_id: ElementId) -> Self {
        Self {
            object_id,
            sent: BTreeMap::new(),
            received: BTreeMap::new(),
        }
    }

    pub fn object_id(&self) -> ElementId {
        self.object_id
    }

    /// Record `bytes` sent to `to`
    pub fn add_sent(&mut self, to: ElementId, bytes: f64) {
        self.sent.entry(to).or_default().push(bytes);
    }

    /// Record `bytes` received from `from`
    pub fn add_received(&mut self, from: ElementId, bytes: f64) {
        self.received.entry(from).or_default().push(bytes);
    }

    /// Sent edges as `(peer, bytes)`, ordered by peer
    pub fn sent(&self) -> impl Iterator<Item = (ElementId, f64)> + '_ {
        flatten(&self.sent)
    }

    /// Received edges as `(peer, bytes)`, ordered by peer
    pub fn received(&self) -> impl Iterator<Item = (ElementId, f64)> + '_ {
        flatten(&self.received)
    }

    pub fn has_sent_to(&self, peer: ElementId) -> bool {
        self.sent.contains_key(&peer)
    }

    pub fn has_received_from(&self, peer: ElementId) -> bool {
        self.received.contains_key(&peer)
    }

    pub fn total_sent_volume(&self) -> f64 {
        self.sent().map(|(_, bytes)| bytes).sum()
    }

    pub fn total_received_volume(&self) -> f64 {
        self.received().map(|(_, bytes)| bytes).sum()
    }

    /// Largest single edge over both directions; 0.0 without edges
    pub fn max_volume(&self) -> f64 {
        self.sent()
            .chain(self.received())
            .map(|(_, bytes)| bytes)
            .fold(0.0, f64::max)
    }

    /// Number of recorded edges in both directions
    pub fn edge_count(&self) -> usize {
        self.sent.values().chain(self.received.values()).map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty() && self.received.is_empty()
    }
}

fn flatten(edges: &BTreeMap<ElementId, Vec<f64>>) -> impl Iterator<Item = (ElementId, f64)> + '_ {
    edges
        .iter()
        .flat_map(|(peer, volumes)| volumes.iter().map(move |bytes| (*peer, *bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_edges_accumulate() {
        let mut comm = ObjectCommunicator::new(1);
        comm.add_sent(2, 10.0);
        comm.add_sent(2, 5.0);

        assert_eq!(comm.sent().collect::<Vec<_>>(), vec![(2, 10.0), (2, 5.0)]);
        assert_eq!(comm.total_sent_volume(), 15.0);
        assert_eq!(comm.edge_count(), 2);
    }

    #[test]
    fn test_max_volume_without_edges_is_zero() {
        let comm = ObjectCommunicator::new(1);
        assert!(comm.is_empty());
        assert_eq!(comm.max_volume(), 0.0);
    }

    #[test]
    fn test_volumes_over_both_directions() {
        let mut comm = ObjectCommunicator::new(1);
        comm.add_received(10, 25.5);
        comm.add_received(11, 12.0);
        assert_eq!(comm.total_received_volume(), 37.5);
        assert_eq!(comm.max_volume(), 25.5);

        comm.add_sent(12, 29.5);
        assert_eq!(comm.max_volume(), 29.5);
        assert!(comm.has_sent_to(12));
        assert!(comm.has_received_from(10));
        assert!(!comm.has_received_from(12));
    }
}
