use crate::error::{Error, Result};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Net force from the host's force pass for this frame.
    pub fx: f64,
    pub fy: f64,
    pub is_fixed: bool,
    /// Magnitude of the positional correction the host's constraint solver applied last frame.
    pub last_correction_mag: f64,
    /// Direction of that correction (unnormalized).
    pub last_correction_dx: f64,
    pub last_correction_dy: f64,
    pub sleep_frames: u32,
    pub is_sleeping: bool,
    /// Engine clock (ms) of the last pairwise micro-slip that touched this node.
    pub last_micro_slip_ms: Option<f64>,
}

impl Node {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            fx: 0.0,
            fy: 0.0,
            is_fixed: false,
            last_correction_mag: 0.0,
            last_correction_dx: 0.0,
            last_correction_dy: 0.0,
            sleep_frames: 0,
            is_sleeping: false,
            last_micro_slip_ms: None,
        }
    }

    pub fn with_velocity(mut self, vx: f64, vy: f64) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.is_fixed = true;
        self
    }

    pub fn speed(&self) -> f64 {
        crate::num::hypot(self.vx, self.vy)
    }

    pub fn force_mag(&self) -> f64 {
        crate::num::hypot(self.fx, self.fy)
    }

    /// Position, velocity and force are all finite.
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.vx, self.vy, self.fx, self.fy]
            .into_iter()
            .all(crate::num::is_finite)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub source: String,
    pub target: String,
    /// Rest length; `None` falls back to `ForceConfig::link_rest_length`.
    pub length: Option<f64>,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            length: None,
        }
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }
}

/// A link with endpoints resolved to arena indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLink {
    pub source: usize,
    pub target: usize,
    pub length: Option<f64>,
}

impl ResolvedLink {
    pub fn rest_length(&self, fallback: f64) -> f64 {
        match self.length {
            Some(l) if crate::num::is_finite(l) && l > 0.0 => l,
            _ => fallback,
        }
    }
}

/// Dense node arena with an id side table.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub nodes: Vec<Node>,
    pub links: Vec<ResolvedLink>,
    id_to_idx: FxHashMap<String, usize>,
}

impl Topology {
    /// Builds the arena from a host snapshot. Self-links are dropped; duplicate node ids and
    /// dangling link endpoints are rejected.
    pub fn from_snapshot(nodes: Vec<Node>, links: &[Link]) -> Result<Self> {
        let mut id_to_idx: FxHashMap<String, usize> = FxHashMap::default();
        id_to_idx.reserve(nodes.len());
        for (idx, n) in nodes.iter().enumerate() {
            if id_to_idx.insert(n.id.clone(), idx).is_some() {
                return Err(Error::DuplicateNode { id: n.id.clone() });
            }
        }

        let mut resolved: Vec<ResolvedLink> = Vec::with_capacity(links.len());
        for l in links {
            let (Some(&source), Some(&target)) = (
                id_to_idx.get(l.source.as_str()),
                id_to_idx.get(l.target.as_str()),
            ) else {
                return Err(Error::MissingEndpoint {
                    source_id: l.source.clone(),
                    target_id: l.target.clone(),
                });
            };
            if source == target {
                continue;
            }
            resolved.push(ResolvedLink {
                source,
                target,
                length: l.length,
            });
        }

        Ok(Self {
            nodes,
            links: resolved,
            id_to_idx,
        })
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.id_to_idx.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|idx| &self.nodes[idx])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        let idx = self.index_of(id)?;
        Some(&mut self.nodes[idx])
    }

    pub fn sleeping_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_sleeping).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_rejects_dangling_links() {
        let nodes = vec![Node::new("a", 0.0, 0.0)];
        let err = Topology::from_snapshot(nodes, &[Link::new("a", "b")]).unwrap_err();
        assert!(matches!(err, Error::MissingEndpoint { .. }));
    }

    #[test]
    fn snapshot_rejects_duplicate_ids() {
        let nodes = vec![Node::new("a", 0.0, 0.0), Node::new("a", 1.0, 0.0)];
        let err = Topology::from_snapshot(nodes, &[]).unwrap_err();
        assert!(matches!(err, Error::DuplicateNode { id } if id == "a"));
    }

    #[test]
    fn self_links_are_dropped_and_lengths_fall_back() {
        let nodes = vec![Node::new("a", 0.0, 0.0), Node::new("b", 10.0, 0.0)];
        let links = [
            Link::new("a", "a"),
            Link::new("a", "b"),
            Link::new("b", "a").with_length(-3.0),
        ];
        let topo = Topology::from_snapshot(nodes, &links).expect("topology");
        assert_eq!(topo.links.len(), 2);
        assert_eq!(topo.links[0].rest_length(50.0), 50.0);
        assert_eq!(topo.links[1].rest_length(50.0), 50.0);
        assert_eq!(topo.index_of("b"), Some(1));
    }
}
