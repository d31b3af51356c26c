//! Overlap layout
//!
//! Packs possibly-overlapping time ranges of one day into side-by-side
//! columns. Ranges are placed greedily in start order into the lowest column
//! free among the ranges they intersect; intersecting pairs are merged into
//! clusters with a disjoint-set forest, and every member of a cluster reports
//! the same column count so rendered widths agree across the cluster.

use crate::time_range::TimeRange;

/// Column assignment for one range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSlot {
    /// Zero-based column index
    pub column: usize,
    /// Column count shared by the whole overlap cluster
    pub total_columns: usize,
}

impl ColumnSlot {
    /// Horizontal offset as a percentage of the column-space width
    pub fn left_percent(&self) -> f64 {
        self.column as f64 * self.width_percent()
    }

    /// Width as a percentage of the column-space width
    pub fn width_percent(&self) -> f64 {
        100.0 / self.total_columns as f64
    }
}

/// Disjoint-set forest with path halving and union by size
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut a, mut b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        self.size[a] += self.size[b];
    }
}

/// Assign a column and cluster-wide column count to every range.
///
/// The result is index-aligned with `ranges`. Ties on start keep input order,
/// so re-running on the same input yields the same picture.
pub fn layout_columns(ranges: &[TimeRange]) -> Vec<ColumnSlot> {
    let mut order: Vec<usize> = (0..ranges.len()).collect();
    order.sort_by_key(|&i| ranges[i].start());

    let mut columns = vec![0usize; ranges.len()];
    let mut clusters = DisjointSet::new(ranges.len());
    // Placed ranges that may still intersect something starting later
    let mut active: Vec<usize> = Vec::new();
    let mut taken: Vec<bool> = Vec::new();

    for &current in &order {
        let range = &ranges[current];
        active.retain(|&placed| ranges[placed].end() > range.start());

        taken.clear();
        for &placed in &active {
            if ranges[placed].intersects(range) {
                clusters.union(current, placed);
                let column = columns[placed];
                if column >= taken.len() {
                    taken.resize(column + 1, false);
                }
                taken[column] = true;
            }
        }

        columns[current] = taken.iter().position(|used| !used).unwrap_or(taken.len());
        active.push(current);
    }

    let mut widest = vec![0usize; ranges.len()];
    for index in 0..ranges.len() {
        let root = clusters.find(index);
        widest[root] = widest[root].max(columns[index]);
    }

    (0..ranges.len())
        .map(|index| {
            let root = clusters.find(index);
            ColumnSlot {
                column: columns[index],
                total_columns: widest[root] + 1,
            }
        })
        .collect()
}
