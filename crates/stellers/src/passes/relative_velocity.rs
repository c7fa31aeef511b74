use crate::graph::Node;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityProjection {
    pub parallel_x: f64,
    pub parallel_y: f64,
    pub perp_x: f64,
    pub perp_y: f64,
}

/// Mean velocity of the given neighbors, or `None` when there are none.
pub fn average_neighbor_velocity(nodes: &[Node], neighbors: &[usize]) -> Option<(f64, f64)> {
    if neighbors.is_empty() {
        return None;
    }
    let mut sum_vx = 0.0;
    let mut sum_vy = 0.0;
    for &j in neighbors {
        sum_vx += nodes[j].vx;
        sum_vy += nodes[j].vy;
    }
    let n = neighbors.len() as f64;
    Some((sum_vx / n, sum_vy / n))
}

#[inline]
pub fn relative_velocity(source: &Node, target: &Node) -> (f64, f64) {
    (source.vx - target.vx, source.vy - target.vy)
}

/// Splits `(vx, vy)` along the unit vector `(ux, uy)`.
pub fn project_velocity(vx: f64, vy: f64, ux: f64, uy: f64) -> VelocityProjection {
    let along = vx * ux + vy * uy;
    let parallel_x = along * ux;
    let parallel_y = along * uy;
    VelocityProjection {
        parallel_x,
        parallel_y,
        perp_x: vx - parallel_x,
        perp_y: vy - parallel_y,
    }
}

/// Rescales `(vx, vy)` to `speed`, leaving zero vectors alone.
pub fn with_speed(vx: f64, vy: f64, speed: f64) -> (f64, f64) {
    let cur = crate::num::hypot(vx, vy);
    if cur > 0.0 {
        (vx / cur * speed, vy / cur * speed)
    } else {
        (vx, vy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_recombines_exactly() {
        let p = project_velocity(3.0, 4.0, 1.0, 0.0);
        assert_eq!((p.parallel_x, p.parallel_y), (3.0, 0.0));
        assert_eq!((p.perp_x, p.perp_y), (0.0, 4.0));
    }

    #[test]
    fn average_skips_empty_neighborhoods() {
        let nodes = vec![
            Node::new("a", 0.0, 0.0).with_velocity(1.0, 0.0),
            Node::new("b", 0.0, 0.0).with_velocity(3.0, 2.0),
        ];
        assert_eq!(average_neighbor_velocity(&nodes, &[]), None);
        assert_eq!(average_neighbor_velocity(&nodes, &[0, 1]), Some((2.0, 1.0)));
        assert_eq!(relative_velocity(&nodes[0], &nodes[1]), (-2.0, -2.0));
    }
}
