//! Barnes-Hut spatial index
//!
//! A quadtree (2D) or octree (3D) over the current node positions, stored
//! as an arena: cells live in one flat `Vec` and refer to their children by
//! index. The tree is rebuilt from scratch every tick it is needed, so the
//! arena is cleared and refilled rather than mutated in place.
//!
//! Each cell keeps the total mass and the mass-weighted centroid of the
//! bodies beneath it, updated incrementally on insertion. Queries walk the
//! tree from the root and treat a cell as one aggregate body once it is far
//! enough away relative to its size (the `theta` criterion).

use std::cell::RefCell;

use crate::node::{Dimensions, SimulationNode};

/// Padding added around the bounding square/cube
pub const TREE_PADDING: f64 = 1.0;

/// Depth past which bodies are chained in one leaf instead of split further
const MAX_DEPTH: usize = 48;

const NONE: u32 = u32::MAX;

/// One cell of the tree
#[derive(Debug, Clone)]
pub struct Cell {
    /// Minimum corner
    pub min: [f64; 3],
    /// Side length (cells are squares/cubes)
    pub size: f64,
    /// Total mass of the bodies below
    pub mass: f64,
    /// Mass-weighted centroid of the bodies below
    pub centroid: [f64; 3],
    /// Number of bodies below
    pub count: usize,
    children: [u32; 8],
    /// Head of the leaf's body chain, `NONE` for empty or internal cells
    body: u32,
    internal: bool,
}

impl Cell {
    fn new(min: [f64; 3], size: f64) -> Self {
        Self {
            min,
            size,
            mass: 0.0,
            centroid: [0.0; 3],
            count: 0,
            children: [NONE; 8],
            body: NONE,
            internal: false,
        }
    }

    pub fn is_leaf(&self) -> bool {
        !self.internal
    }

    /// Child cell indices that exist
    pub fn children(&self) -> impl Iterator<Item = usize> + '_ {
        self.children
            .iter()
            .filter(|&&c| c != NONE)
            .map(|&c| c as usize)
    }

    fn contains(&self, p: &[f64; 3], axes: usize) -> bool {
        (0..axes).all(|a| p[a] >= self.min[a] && p[a] <= self.min[a] + self.size)
    }
}

/// A body interaction produced by a query: offset from the target to the
/// interacting body (or cell centroid) and its mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub offset: [f64; 3],
    pub mass: f64,
    /// Whether this is an aggregated cell rather than a single body
    pub aggregate: bool,
}

/// Arena-backed Barnes-Hut tree
#[derive(Debug, Clone, Default)]
pub struct SpatialTree {
    cells: Vec<Cell>,
    /// Per-node link to the next body in the same leaf
    next: Vec<u32>,
    dimensions: Dimensions,
    /// Traversal stack reused across queries
    stack: RefCell<Vec<usize>>,
}

impl SpatialTree {
    /// Build a tree over the given nodes
    pub fn build(nodes: &[SimulationNode], dimensions: Dimensions) -> Self {
        let mut tree = Self::default();
        tree.rebuild(nodes, dimensions);
        tree
    }

    /// Discard the current contents and rebuild from the nodes' positions
    pub fn rebuild(&mut self, nodes: &[SimulationNode], dimensions: Dimensions) {
        self.cells.clear();
        self.next.clear();
        self.next.resize(nodes.len(), NONE);
        self.dimensions = dimensions;

        let axes = dimensions.count();
        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        let mut placed = 0usize;
        for node in nodes {
            let p = position(node);
            if !(0..axes).all(|a| p[a].is_finite()) {
                continue;
            }
            for a in 0..axes {
                lo[a] = lo[a].min(p[a]);
                hi[a] = hi[a].max(p[a]);
            }
            placed += 1;
        }
        if placed == 0 {
            return;
        }

        let extent = (0..axes).map(|a| hi[a] - lo[a]).fold(0.0, f64::max);
        let size = extent + 2.0 * TREE_PADDING;
        let mut min = [0.0; 3];
        for a in 0..axes {
            min[a] = (lo[a] + hi[a]) * 0.5 - size * 0.5;
        }
        self.cells.push(Cell::new(min, size));

        for (i, node) in nodes.iter().enumerate() {
            let p = position(node);
            if (0..axes).all(|a| p[a].is_finite()) {
                self.insert(0, i as u32, nodes, 0);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Root cell, if any body was inserted
    pub fn root(&self) -> Option<&Cell> {
        self.cells.first()
    }

    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Bodies chained in a leaf cell
    pub fn leaf_bodies(&self, index: usize) -> LeafBodies<'_> {
        LeafBodies {
            tree: self,
            current: self.cells[index].body,
        }
    }

    fn insert(&mut self, cell: usize, body: u32, nodes: &[SimulationNode], depth: usize) {
        let p = position(&nodes[body as usize]);
        let m = nodes[body as usize].mass;
        self.add_mass(cell, &p, m);

        if self.cells[cell].internal {
            self.descend(cell, body, nodes, depth);
            return;
        }

        let head = self.cells[cell].body;
        if head == NONE {
            self.cells[cell].body = body;
            return;
        }

        let axes = self.dimensions.count();
        let existing = position(&nodes[head as usize]);
        if depth >= MAX_DEPTH || (0..axes).all(|a| existing[a] == p[a]) {
            self.next[body as usize] = head;
            self.cells[cell].body = body;
            return;
        }

        // Occupied leaf becomes internal: push its chain down, then the new body.
        self.cells[cell].body = NONE;
        self.cells[cell].internal = true;
        let mut current = head;
        while current != NONE {
            let following = self.next[current as usize];
            self.next[current as usize] = NONE;
            self.descend(cell, current, nodes, depth);
            current = following;
        }
        self.descend(cell, body, nodes, depth);
    }

    fn descend(&mut self, cell: usize, body: u32, nodes: &[SimulationNode], depth: usize) {
        let p = position(&nodes[body as usize]);
        let (slot, child_min, half) = {
            let c = &self.cells[cell];
            let half = c.size * 0.5;
            let mut slot = 0;
            let mut child_min = c.min;
            for a in 0..self.dimensions.count() {
                if p[a] >= c.min[a] + half {
                    slot |= 1 << a;
                    child_min[a] += half;
                }
            }
            (slot, child_min, half)
        };

        let child = match self.cells[cell].children[slot] {
            NONE => {
                let index = self.cells.len();
                self.cells.push(Cell::new(child_min, half));
                self.cells[cell].children[slot] = index as u32;
                index
            }
            existing => existing as usize,
        };
        self.insert(child, body, nodes, depth + 1);
    }

    fn add_mass(&mut self, cell: usize, p: &[f64; 3], m: f64) {
        let c = &mut self.cells[cell];
        c.count += 1;
        let total = c.mass + m;
        if total > 0.0 {
            for a in 0..3 {
                c.centroid[a] = (c.centroid[a] * c.mass + p[a] * m) / total;
            }
        } else if c.count == 1 {
            c.centroid = *p;
        }
        c.mass = total;
    }

    /// Visit the interactions acting on `target` under the Barnes-Hut
    /// criterion. A cell is aggregated when `size² < theta² · d²` and the
    /// target lies outside it; leaves always report their bodies
    /// individually, skipping the target itself.
    pub fn for_each_interaction(
        &self,
        target: usize,
        nodes: &[SimulationNode],
        theta: f64,
        mut visit: impl FnMut(Interaction),
    ) {
        if self.cells.is_empty() {
            return;
        }
        let axes = self.dimensions.count();
        let p = position(&nodes[target]);
        let theta2 = theta * theta;
        // A nested query finds the slot empty and allocates its own stack.
        let mut stack = self.stack.take();
        stack.clear();
        stack.push(0);

        while let Some(index) = stack.pop() {
            let cell = &self.cells[index];
            if cell.count == 0 {
                continue;
            }

            if cell.is_leaf() {
                for body in self.leaf_bodies(index) {
                    if body == target {
                        continue;
                    }
                    let q = position(&nodes[body]);
                    let mut offset = [0.0; 3];
                    for a in 0..axes {
                        offset[a] = q[a] - p[a];
                    }
                    visit(Interaction {
                        offset,
                        mass: nodes[body].mass,
                        aggregate: false,
                    });
                }
                continue;
            }

            let mut offset = [0.0; 3];
            let mut d2 = 0.0;
            for a in 0..axes {
                offset[a] = cell.centroid[a] - p[a];
                d2 += offset[a] * offset[a];
            }

            if !cell.contains(&p, axes) && cell.size * cell.size < theta2 * d2 {
                if cell.mass > 0.0 {
                    visit(Interaction {
                        offset,
                        mass: cell.mass,
                        aggregate: true,
                    });
                }
                continue;
            }
            stack.extend(cell.children());
        }
        self.stack.replace(stack);
    }
}

/// Iterator over the bodies chained in one leaf
pub struct LeafBodies<'a> {
    tree: &'a SpatialTree,
    current: u32,
}

impl Iterator for LeafBodies<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.current == NONE {
            return None;
        }
        let body = self.current as usize;
        self.current = self.tree.next[body];
        Some(body)
    }
}

fn position(node: &SimulationNode) -> [f64; 3] {
    [node.x, node.y, node.z]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes_2d(points: &[(f64, f64)]) -> Vec<SimulationNode> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| {
                let mut n = SimulationNode::new(format!("n{i}")).with_position(x, y);
                n.index = i;
                n
            })
            .collect()
    }

    #[test]
    fn empty_tree_has_no_root() {
        let tree = SpatialTree::build(&[], Dimensions::Two);
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
    }

    #[test]
    fn root_aggregates_mass_and_centroid() {
        let mut nodes = nodes_2d(&[(0.0, 0.0), (10.0, 0.0), (0.0, 30.0)]);
        nodes[2].mass = 2.0;
        let tree = SpatialTree::build(&nodes, Dimensions::Two);
        let root = tree.root().unwrap();

        assert_eq!(root.count, 3);
        assert!((root.mass - 4.0).abs() < 1e-12);
        assert!((root.centroid[0] - 2.5).abs() < 1e-12);
        assert!((root.centroid[1] - 15.0).abs() < 1e-12);
    }

    #[test]
    fn bounding_cell_is_square_and_padded() {
        let nodes = nodes_2d(&[(0.0, 0.0), (100.0, 10.0)]);
        let tree = SpatialTree::build(&nodes, Dimensions::Two);
        let root = tree.root().unwrap();

        assert!((root.size - (100.0 + 2.0 * TREE_PADDING)).abs() < 1e-12);
        assert!(root.min[0] <= 0.0 && root.min[0] + root.size >= 100.0);
        assert!(root.min[1] <= 0.0 && root.min[1] + root.size >= 10.0);
    }

    #[test]
    fn every_body_lands_in_exactly_one_leaf() {
        let points: Vec<(f64, f64)> = (0..50)
            .map(|i| ((i * 37 % 101) as f64, (i * 53 % 89) as f64))
            .collect();
        let nodes = nodes_2d(&points);
        let tree = SpatialTree::build(&nodes, Dimensions::Two);

        let mut seen = vec![0; nodes.len()];
        for (index, cell) in tree.cells().iter().enumerate() {
            if cell.is_leaf() {
                for body in tree.leaf_bodies(index) {
                    seen[body] += 1;
                }
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn quadtree_cells_have_at_most_four_children() {
        let nodes = nodes_2d(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0), (5.0, 5.0)]);
        let tree = SpatialTree::build(&nodes, Dimensions::Two);
        assert!(tree.cells().iter().all(|c| c.children().count() <= 4));
    }

    #[test]
    fn octree_uses_depth_axis() {
        let nodes: Vec<SimulationNode> = [(0.0, 0.0, 0.0), (0.0, 0.0, 10.0)]
            .iter()
            .enumerate()
            .map(|(i, &(x, y, z))| SimulationNode::new(format!("n{i}")).with_position_3d(x, y, z))
            .collect();
        let tree = SpatialTree::build(&nodes, Dimensions::Three);
        let root = tree.root().unwrap();
        let children: Vec<usize> = root.children().collect();

        assert_eq!(children.len(), 2);
        assert!((root.centroid[2] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn coincident_bodies_share_a_leaf() {
        let nodes = nodes_2d(&[(3.0, 3.0), (3.0, 3.0), (3.0, 3.0)]);
        let tree = SpatialTree::build(&nodes, Dimensions::Two);

        assert_eq!(tree.cells().len(), 1);
        assert_eq!(tree.leaf_bodies(0).count(), 3);
        assert_eq!(tree.root().unwrap().mass, 3.0);
    }

    #[test]
    fn query_skips_target_and_reaches_everyone_else() {
        let nodes = nodes_2d(&[(0.0, 0.0), (10.0, 0.0), (20.0, 5.0), (-4.0, 8.0)]);
        let tree = SpatialTree::build(&nodes, Dimensions::Two);

        let mut mass = 0.0;
        tree.for_each_interaction(0, &nodes, 0.0, |i| {
            assert!(!i.aggregate);
            assert!(i.offset != [0.0; 3]);
            mass += i.mass;
        });
        assert_eq!(mass, 3.0);
    }

    #[test]
    fn distant_cluster_is_aggregated() {
        let mut points = vec![(0.0, 0.0)];
        points.extend((0..10).map(|i| (1000.0 + i as f64, 1000.0 + (i % 3) as f64)));
        let nodes = nodes_2d(&points);
        let tree = SpatialTree::build(&nodes, Dimensions::Two);

        let mut interactions = Vec::new();
        tree.for_each_interaction(0, &nodes, 0.9, |i| interactions.push(i));

        assert!(interactions.iter().any(|i| i.aggregate));
        let total: f64 = interactions.iter().map(|i| i.mass).sum();
        assert!((total - 10.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_queries_see_the_same_interactions() {
        let nodes = nodes_2d(&[(0.0, 0.0), (10.0, 0.0), (20.0, 5.0), (-4.0, 8.0), (300.0, 2.0)]);
        let tree = SpatialTree::build(&nodes, Dimensions::Two);

        let collect = |target| {
            let mut out = Vec::new();
            tree.for_each_interaction(target, &nodes, 0.9, |i| out.push(i));
            out
        };
        let first = collect(0);
        assert_eq!(collect(0), first);
        assert_eq!(collect(4), collect(4));
        assert_eq!(collect(0), first);
    }

    #[test]
    fn nested_query_inside_visitor_is_complete() {
        let nodes = nodes_2d(&[(0.0, 0.0), (10.0, 0.0), (20.0, 5.0)]);
        let tree = SpatialTree::build(&nodes, Dimensions::Two);

        let mut outer = 0;
        let mut inner = 0;
        tree.for_each_interaction(0, &nodes, 0.0, |_| {
            outer += 1;
            tree.for_each_interaction(1, &nodes, 0.0, |_| inner += 1);
        });
        assert_eq!(outer, 2);
        assert_eq!(inner, 4);
    }
}
