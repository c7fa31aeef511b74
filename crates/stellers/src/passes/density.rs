use crate::graph::Node;

/// Neighbor lists within a fixed radius, computed once per frame and shared by every pass.
///
/// The scan is all-pairs, which is fine for the bounded node counts this engine targets. Passes
/// only mutate velocities, so the lists stay valid for the whole frame; neighbor velocities are
/// always read live from the node slice. Nodes with non-finite state are neither counted nor
/// given neighbors.
#[derive(Debug, Clone, Default)]
pub struct DensityField {
    offsets: Vec<usize>,
    neighbors: Vec<usize>,
}

impl DensityField {
    pub fn compute(nodes: &[Node], radius: f64) -> Self {
        let n = nodes.len();
        let mut offsets: Vec<usize> = Vec::with_capacity(n + 1);
        let mut neighbors: Vec<usize> = Vec::new();
        offsets.push(0);

        for (i, a) in nodes.iter().enumerate() {
            if a.is_finite() && radius > 0.0 {
                for (j, b) in nodes.iter().enumerate() {
                    if i == j || !b.is_finite() {
                        continue;
                    }
                    let dx = b.x - a.x;
                    let dy = b.y - a.y;
                    if (dx * dx + dy * dy).sqrt() < radius {
                        neighbors.push(j);
                    }
                }
            }
            offsets.push(neighbors.len());
        }

        Self { offsets, neighbors }
    }

    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn neighbors(&self, idx: usize) -> &[usize] {
        if idx + 1 >= self.offsets.len() {
            return &[];
        }
        &self.neighbors[self.offsets[idx]..self.offsets[idx + 1]]
    }

    pub fn neighbor_count(&self, idx: usize) -> usize {
        self.neighbors(idx).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_strictly_inside_radius() {
        let nodes = vec![
            Node::new("a", 0.0, 0.0),
            Node::new("b", 29.0, 0.0),
            Node::new("c", 30.0, 0.0),
            Node::new("d", f64::NAN, 0.0),
        ];
        let field = DensityField::compute(&nodes, 30.0);
        assert_eq!(field.len(), 4);
        assert_eq!(field.neighbors(0), &[1]);
        assert_eq!(field.neighbors(1), &[0, 2]);
        assert_eq!(field.neighbor_count(3), 0);
        assert_eq!(field.neighbor_count(99), 0);
    }
}
