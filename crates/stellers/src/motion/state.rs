use crate::config::ForceConfig;
use crate::num::clamp01;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionAuthority {
    /// The user holds a node.
    Dragged,
    /// Every node is asleep.
    Sleeping,
    Normal,
}

/// Whole-population summary, recomputed every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnifiedMotionState {
    pub temperature: f64,
    pub density: f64,
    pub degree: f64,
    pub authority: MotionAuthority,
    pub budget_scale: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct UnifiedMotionStateInput<'a> {
    pub energy: f64,
    pub node_count: usize,
    pub link_count: usize,
    pub sleeping_count: usize,
    pub dragging: bool,
    pub budget_scale: f64,
    pub config: &'a ForceConfig,
}

impl UnifiedMotionState {
    /// The same equations apply at every population size; load only moves `density`.
    pub fn compute(input: &UnifiedMotionStateInput<'_>) -> Self {
        let cfg = input.config;
        let nodes = input.node_count as f64;
        let links = input.link_count as f64;

        let temperature = clamp01(input.energy);
        let avg_degree = if input.node_count > 0 {
            (links * 2.0) / nodes
        } else {
            0.0
        };
        let degree = clamp01((avg_degree - 1.0) / 4.0);

        let density_by_nodes = clamp01(
            (nodes - cfg.perf_mode_n_stressed)
                / (cfg.perf_mode_n_fatal - cfg.perf_mode_n_stressed).max(1.0),
        );
        let density_by_links = clamp01(
            (links - cfg.perf_mode_e_stressed)
                / (cfg.perf_mode_e_fatal - cfg.perf_mode_e_stressed).max(1.0),
        );
        let density = density_by_nodes.max(density_by_links);

        let authority = if input.dragging {
            MotionAuthority::Dragged
        } else if input.node_count > 0 && input.sleeping_count >= input.node_count {
            MotionAuthority::Sleeping
        } else {
            MotionAuthority::Normal
        };

        Self {
            temperature,
            density,
            degree,
            authority,
            budget_scale: clamp01(input.budget_scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(cfg: &ForceConfig) -> UnifiedMotionStateInput<'_> {
        UnifiedMotionStateInput {
            energy: 0.5,
            node_count: 10,
            link_count: 10,
            sleeping_count: 0,
            dragging: false,
            budget_scale: 1.0,
            config: cfg,
        }
    }

    #[test]
    fn density_takes_the_heavier_ramp() {
        let cfg = ForceConfig::default();
        let mut i = input(&cfg);
        // Halfway between 250 and 900 nodes.
        i.node_count = 575;
        // Links below the stressed threshold.
        i.link_count = 100;
        let s = UnifiedMotionState::compute(&i);
        assert!((s.density - 0.5).abs() < 1e-12);

        i.node_count = 10;
        i.link_count = 3000;
        assert_eq!(UnifiedMotionState::compute(&i).density, 1.0);
    }

    #[test]
    fn degree_and_temperature_are_clamped() {
        let cfg = ForceConfig::default();
        let mut i = input(&cfg);
        i.energy = 4.0;
        // avgDegree = 2 -> (2 - 1) / 4.
        let s = UnifiedMotionState::compute(&i);
        assert_eq!(s.temperature, 1.0);
        assert!((s.degree - 0.25).abs() < 1e-12);

        i.node_count = 0;
        i.link_count = 0;
        i.energy = -1.0;
        let s = UnifiedMotionState::compute(&i);
        assert_eq!(s.degree, 0.0);
        assert_eq!(s.temperature, 0.0);
        assert_eq!(s.authority, MotionAuthority::Normal);
    }

    #[test]
    fn authority_prefers_drag_over_sleep() {
        let cfg = ForceConfig::default();
        let mut i = input(&cfg);
        i.sleeping_count = 10;
        assert_eq!(
            UnifiedMotionState::compute(&i).authority,
            MotionAuthority::Sleeping
        );
        i.dragging = true;
        assert_eq!(
            UnifiedMotionState::compute(&i).authority,
            MotionAuthority::Dragged
        );
    }
}
