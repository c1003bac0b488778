//! Tracks which of the local session's ids were minted as local ids.
//!
//! Ids handed to the application as locals stay locals in session space for
//! their whole lifetime, even after their creation range is finalized. Eager
//! finals are never recorded here.

/// Sorted, disjoint runs of generation counts, stored as `(first, count)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSpaceNormalizer {
    leading_locals: Vec<(u64, u64)>,
}

impl SessionSpaceNormalizer {
    pub fn new() -> Self {
        SessionSpaceNormalizer::default()
    }

    /// Rebuilds a normalizer from persisted runs.
    ///
    /// Returns `None` unless the runs are non-empty, 1-based, ascending and
    /// disjoint.
    pub fn from_ranges(ranges: Vec<(u64, u64)>) -> Option<Self> {
        let mut next_free = 1;
        for &(first, count) in &ranges {
            if count == 0 || first < next_free {
                return None;
            }
            next_free = first.checked_add(count)?;
        }
        Some(SessionSpaceNormalizer {
            leading_locals: ranges,
        })
    }

    pub fn ranges(&self) -> &[(u64, u64)] {
        &self.leading_locals
    }

    /// Records `count` locals starting at `first_generation_count`. Runs
    /// must be added in ascending order; adjacent runs are merged.
    pub fn add_local_range(&mut self, first_generation_count: u64, count: u64) {
        debug_assert!(count > 0, "empty local range");
        if let Some((last_first, last_count)) = self.leading_locals.last_mut() {
            debug_assert!(
                *last_first + *last_count <= first_generation_count,
                "local ranges added out of order"
            );
            if *last_first + *last_count == first_generation_count {
                *last_count += count;
                return;
            }
        }
        self.leading_locals.push((first_generation_count, count));
    }

    pub fn contains(&self, generation_count: u64) -> bool {
        let index = self
            .leading_locals
            .partition_point(|(first, _)| *first <= generation_count);
        match index.checked_sub(1) {
            Some(candidate) => {
                let (first, count) = self.leading_locals[candidate];
                generation_count < first + count
            }
            None => false,
        }
    }
}
