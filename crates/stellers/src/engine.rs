//! Frame-stepped owner of the node arena and the cross-frame stabilization state.

use crate::config::ForceConfig;
use crate::energy::EnergyEnvelope;
use crate::error::{Error, Result};
use crate::graph::{Link, Node, ResolvedLink, Topology};
use crate::interaction::{InteractionAuthorityPolicy, Velocity, compute_interaction_authority};
use crate::motion::{MotionPolicy, UnifiedMotionState, UnifiedMotionStateInput};
use crate::passes::{DensityField, PassContext, PassStats, run_correction_passes};
use crate::settle::{SettleDebugStats, SettleFrame, SettleLadder};
use serde::Serialize;

/// Host-provided inputs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Frame duration in seconds.
    pub dt: f64,
    /// Global simulation energy; clamped to `[0, 1]` as the temperature.
    pub energy: f64,
    pub budget_scale: f64,
    /// Current velocity cap. Falls back to `ForceConfig::max_velocity` when absent or invalid.
    pub max_velocity_effective: Option<f64>,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            energy: 1.0,
            budget_scale: 1.0,
            max_velocity_effective: None,
        }
    }
}

impl FrameInput {
    /// Inputs derived from the exponential cooling envelope at `lifecycle` seconds.
    pub fn from_lifecycle(lifecycle: f64, dt: f64) -> Self {
        let envelope = EnergyEnvelope::at(lifecycle);
        Self {
            dt,
            energy: envelope.energy,
            budget_scale: 1.0,
            max_velocity_effective: Some(envelope.max_velocity_effective),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub motion: UnifiedMotionState,
    pub settle: SettleDebugStats,
    /// Present while dragging and on the frame a release is handed off.
    pub interaction: Option<InteractionAuthorityPolicy>,
    /// Empty when the ladder held the passes back or a reduced budget skipped this frame.
    pub passes: Vec<PassStats>,
    pub local_boost_frames: u32,
    pub non_finite_nodes: usize,
}

impl FrameReport {
    pub fn pass(&self, kind: crate::passes::PassKind) -> Option<&PassStats> {
        self.passes.iter().find(|p| p.pass == kind)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StabilizationEngine {
    config: ForceConfig,
    topology: Topology,
    dragged: Option<usize>,
    pending_release: Option<(usize, Velocity)>,
    ladder: SettleLadder,
    local_boost_frames: u32,
    clock_ms: f64,
    frame_index: u64,
    last_policy: Option<MotionPolicy>,
}

/// Pass cadence under load: every frame at full budget, every 2nd or 4th frame as it shrinks.
fn micro_every(budget_scale: f64) -> u64 {
    if budget_scale >= 0.75 {
        1
    } else if budget_scale >= 0.4 {
        2
    } else {
        4
    }
}

impl StabilizationEngine {
    pub fn new(config: ForceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn with_graph(config: ForceConfig, nodes: Vec<Node>, links: &[Link]) -> Result<Self> {
        let mut engine = Self::new(config)?;
        engine.set_topology(nodes, links)?;
        Ok(engine)
    }

    /// Replaces the node/link snapshot. A drag in progress survives if its node is still present.
    pub fn set_topology(&mut self, nodes: Vec<Node>, links: &[Link]) -> Result<()> {
        let topology = Topology::from_snapshot(nodes, links)?;
        let remap = |idx: usize, old: &Topology| {
            old.nodes
                .get(idx)
                .and_then(|n| topology.index_of(&n.id))
        };
        self.dragged = self.dragged.and_then(|idx| remap(idx, &self.topology));
        self.pending_release = self
            .pending_release
            .and_then(|(idx, v)| remap(idx, &self.topology).map(|i| (i, v)));
        self.topology = topology;
        self.ladder.reset_positions();
        Ok(())
    }

    pub fn set_config(&mut self, config: ForceConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[Node] {
        &self.topology.nodes
    }

    /// Mutable access for the host integrator. Node ids must not be changed through this.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.topology.nodes
    }

    pub fn links(&self) -> &[ResolvedLink] {
        &self.topology.links
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.topology.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.topology.get_mut(id)
    }

    pub fn dragged(&self) -> Option<&Node> {
        self.dragged.map(|idx| &self.topology.nodes[idx])
    }

    pub fn ladder(&self) -> &SettleLadder {
        &self.ladder
    }

    /// Policy computed by the most recent [`step`](Self::step).
    pub fn last_policy(&self) -> Option<&MotionPolicy> {
        self.last_policy.as_ref()
    }

    pub fn local_boost_frames(&self) -> u32 {
        self.local_boost_frames
    }

    /// Engine clock in milliseconds: the sum of every stepped `dt`.
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn begin_drag(&mut self, id: &str) -> Result<()> {
        let idx = self
            .topology
            .index_of(id)
            .ok_or_else(|| Error::UnknownNode { id: id.to_string() })?;
        let node = &mut self.topology.nodes[idx];
        node.is_sleeping = false;
        node.sleep_frames = 0;
        self.dragged = Some(idx);
        self.pending_release = None;
        Ok(())
    }

    /// Releases the held node. The handoff velocity is applied on the next step.
    pub fn end_drag(&mut self, release_velocity: Option<Velocity>) {
        if let Some(idx) = self.dragged.take() {
            let v = release_velocity.unwrap_or(Velocity::new(0.0, 0.0));
            self.pending_release = Some((idx, v));
        }
    }

    pub fn step(&mut self, input: FrameInput) -> FrameReport {
        let timing_enabled = std::env::var("STELLERS_TIMING").ok().as_deref() == Some("1");
        let total_start = timing_enabled.then(std::time::Instant::now);

        let dt = if input.dt.is_finite() && input.dt > 0.0 {
            input.dt
        } else {
            0.0
        };
        let max_velocity_effective = input
            .max_velocity_effective
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(self.config.max_velocity);

        let motion = UnifiedMotionState::compute(&UnifiedMotionStateInput {
            energy: if input.energy.is_finite() {
                input.energy
            } else {
                0.0
            },
            node_count: self.topology.nodes.len(),
            link_count: self.topology.links.len(),
            sleeping_count: self.topology.sleeping_count(),
            dragging: self.dragged.is_some(),
            budget_scale: if input.budget_scale.is_finite() {
                input.budget_scale
            } else {
                1.0
            },
            config: &self.config,
        });
        let policy = MotionPolicy::compute(&motion, &self.config, max_velocity_effective);

        let non_finite_nodes = self.topology.nodes.iter().filter(|n| !n.is_finite()).count();
        if non_finite_nodes > 0 {
            tracing::warn!(count = non_finite_nodes, "skipping nodes with non-finite state");
        }

        let previous = self.ladder.state();
        let settle = self.ladder.apply(
            &mut self.topology.nodes,
            &SettleFrame {
                motion: &motion,
                policy: &policy,
                config: &self.config,
                dragged: self.dragged,
                dt,
                max_velocity_effective,
            },
        );
        if settle.settle_state != previous {
            tracing::debug!(
                from = ?previous,
                to = ?settle.settle_state,
                jitter_avg = settle.jitter_avg,
                "settle state changed"
            );
        }

        let interaction = self.run_interaction(&policy);

        self.clock_ms += dt * 1000.0;
        self.frame_index = self.frame_index.wrapping_add(1);

        let mut passes = Vec::new();
        let micro_enabled = self.frame_index % micro_every(motion.budget_scale) == 0;
        if micro_enabled && settle.settle_state.allows_corrections() {
            let passes_start = timing_enabled.then(std::time::Instant::now);
            let density =
                DensityField::compute(&self.topology.nodes, policy.geometry.density_radius);
            let ctx = PassContext {
                links: &self.topology.links,
                policy: &policy,
                density: &density,
                dragged: self.dragged,
                now_ms: self.clock_ms,
                angular_decoherence: self.config.angular_decoherence,
            };
            passes = run_correction_passes(&mut self.topology.nodes, &ctx);
            for p in passes.iter().filter(|p| p.nodes_affected > 0) {
                tracing::debug!(
                    pass = p.pass.name(),
                    nodes_affected = p.nodes_affected,
                    velocity_delta_sum = p.velocity_delta_sum,
                    "correction pass applied"
                );
            }
            if let Some(s) = passes_start {
                tracing::info!(elapsed = ?s.elapsed(), nodes = self.topology.nodes.len(), "stellers passes");
            }
        }

        self.last_policy = Some(policy);

        if let Some(s) = total_start {
            tracing::info!(elapsed = ?s.elapsed(), state = ?settle.settle_state, "stellers step");
        }

        FrameReport {
            motion,
            settle,
            interaction,
            passes,
            local_boost_frames: self.local_boost_frames,
            non_finite_nodes,
        }
    }

    fn run_interaction(&mut self, policy: &MotionPolicy) -> Option<InteractionAuthorityPolicy> {
        let release = self.pending_release.take();
        if self.dragged.is_none() && release.is_none() {
            self.local_boost_frames = self.local_boost_frames.saturating_sub(1);
            return None;
        }

        let out = compute_interaction_authority(policy, release.map(|(_, v)| v));
        self.local_boost_frames = out.local_boost_frames;

        if let (Some((idx, _)), Some(v)) = (release, out.release_velocity) {
            if let Some(node) = self.topology.nodes.get_mut(idx).filter(|n| !n.is_fixed) {
                node.vx = v.vx;
                node.vy = v.vy;
                node.is_sleeping = false;
                node.sleep_frames = 0;
                tracing::debug!(
                    id = %node.id,
                    vx = v.vx,
                    vy = v.vy,
                    reason = out.release_reason.map(|r| r.as_str()),
                    "drag release handoff"
                );
            }
        }
        Some(out)
    }
}
