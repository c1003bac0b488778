//! Global index of clusters ordered by final id.
//!
//! Clusters are appended in finalization order, and each new cluster starts
//! right after the capacity of the previous one, so the backing vector is
//! sorted by `base_final_id` and a final id is located by predecessor search.

use crate::compressor::cluster::IdCluster;
use crate::compressor::types::FinalId;

/// Position of a cluster in the final space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterRef(usize);

impl ClusterRef {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalSpace {
    clusters: Vec<IdCluster>,
}

impl FinalSpace {
    pub fn new() -> Self {
        FinalSpace::default()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn cluster(&self, cluster_ref: ClusterRef) -> &IdCluster {
        &self.clusters[cluster_ref.0]
    }

    pub(crate) fn cluster_mut(&mut self, cluster_ref: ClusterRef) -> &mut IdCluster {
        &mut self.clusters[cluster_ref.0]
    }

    pub fn clusters(&self) -> impl Iterator<Item = &IdCluster> {
        self.clusters.iter()
    }

    pub fn tail(&self) -> Option<&IdCluster> {
        self.clusters.last()
    }

    /// Only the last cluster may grow its capacity in place.
    pub fn is_last(&self, cluster_ref: ClusterRef) -> bool {
        cluster_ref.0 + 1 == self.clusters.len()
    }

    /// The base final id the next appended cluster receives.
    pub fn next_base_final(&self) -> FinalId {
        match self.tail() {
            Some(tail) => tail.base_final_id.offset(tail.capacity),
            None => FinalId::new(0),
        }
    }

    /// One past the greatest finalized final id. Nothing at or above this
    /// limit can have reached another peer.
    pub fn final_id_limit(&self) -> FinalId {
        match self.tail() {
            Some(tail) => tail.base_final_id.offset(tail.count),
            None => FinalId::new(0),
        }
    }

    pub(crate) fn push(&mut self, cluster: IdCluster) -> ClusterRef {
        debug_assert_eq!(
            cluster.base_final_id,
            self.next_base_final(),
            "cluster appended to final space out of order"
        );
        self.clusters.push(cluster);
        ClusterRef(self.clusters.len() - 1)
    }

    /// Finds the cluster whose capacity covers `final_id`. The id may be
    /// reserved but not yet finalized.
    pub fn containing_cluster(&self, final_id: FinalId) -> Option<ClusterRef> {
        let index = self
            .clusters
            .partition_point(|cluster| cluster.base_final_id <= final_id);
        let candidate = index.checked_sub(1)?;
        self.clusters[candidate]
            .contains_final(final_id)
            .then_some(ClusterRef(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::session::SessionRef;
    use crate::compressor::types::LocalId;

    fn append(space: &mut FinalSpace, session: usize, capacity: u64, count: u64) -> ClusterRef {
        let mut cluster = IdCluster::new(
            SessionRef::from_index(session),
            space.next_base_final(),
            LocalId::from_generation_count(1),
            capacity,
        );
        cluster.count = count;
        space.push(cluster)
    }

    #[test]
    fn test_empty() {
        let space = FinalSpace::new();
        assert!(space.is_empty());
        assert_eq!(space.next_base_final(), FinalId::new(0));
        assert_eq!(space.final_id_limit(), FinalId::new(0));
        assert_eq!(space.containing_cluster(FinalId::new(0)), None);
    }

    #[test]
    fn test_predecessor_search() {
        let mut space = FinalSpace::new();
        let a = append(&mut space, 0, 3, 3);
        let b = append(&mut space, 1, 5, 2);
        assert_eq!(space.cluster(b).base_final_id(), FinalId::new(3));

        assert_eq!(space.containing_cluster(FinalId::new(0)), Some(a));
        assert_eq!(space.containing_cluster(FinalId::new(2)), Some(a));
        assert_eq!(space.containing_cluster(FinalId::new(3)), Some(b));
        assert_eq!(space.containing_cluster(FinalId::new(7)), Some(b));
        assert_eq!(space.containing_cluster(FinalId::new(8)), None);
    }

    #[test]
    fn test_limits_track_tail() {
        let mut space = FinalSpace::new();
        let a = append(&mut space, 0, 3, 1);
        assert!(space.is_last(a));
        assert_eq!(space.final_id_limit(), FinalId::new(1));
        let b = append(&mut space, 1, 4, 2);
        assert!(!space.is_last(a));
        assert!(space.is_last(b));
        assert_eq!(space.next_base_final(), FinalId::new(7));
        assert_eq!(space.final_id_limit(), FinalId::new(5));
    }
}
