use stellers::passes::{
    apply_angular_velocity_decoherence, apply_dense_core_inertia_relaxation,
    apply_edge_shear_stagnation_escape, apply_local_phase_diffusion, apply_static_friction_bypass,
};
use stellers::{
    DensityField, ForceConfig, MotionAuthority, MotionPolicy, Node, PassContext, ResolvedLink,
    UnifiedMotionState, run_correction_passes,
};

struct XorShift(u64);

impl XorShift {
    fn next_f64(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        (x >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

fn policy(temperature: f64) -> MotionPolicy {
    let state = UnifiedMotionState {
        temperature,
        density: 0.0,
        degree: 0.0,
        authority: MotionAuthority::Normal,
        budget_scale: 1.0,
    };
    MotionPolicy::compute(&state, &ForceConfig::default(), 80.0)
}

fn ctx<'a>(
    links: &'a [ResolvedLink],
    policy: &'a MotionPolicy,
    density: &'a DensityField,
) -> PassContext<'a> {
    PassContext {
        links,
        policy,
        density,
        dragged: None,
        now_ms: 0.0,
        angular_decoherence: true,
    }
}

/// `side x side` lattice at 10px spacing: every node is dense at a 30px radius.
fn lattice(side: usize) -> Vec<Node> {
    let mut out = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            out.push(Node::new(
                format!("n{row}_{col}"),
                col as f64 * 10.0,
                row as f64 * 10.0,
            ));
        }
    }
    out
}

/// Disjoint horizontal pairs `(2k, 2k + 1)` at their 10px rest length.
fn paired_links(side: usize) -> Vec<ResolvedLink> {
    let mut out = Vec::new();
    for row in 0..side {
        for col in (0..side.saturating_sub(1)).step_by(2) {
            out.push(ResolvedLink {
                source: row * side + col,
                target: row * side + col + 1,
                length: Some(10.0),
            });
        }
    }
    out
}

fn with_random_velocities(mut nodes: Vec<Node>, seed: u64, max: f64) -> Vec<Node> {
    let mut rng = XorShift(seed);
    for n in &mut nodes {
        n.vx = rng.range(-max, max);
        n.vy = rng.range(-max, max);
    }
    nodes
}

#[test]
fn rotating_passes_preserve_speed() {
    let base = with_random_velocities(lattice(6), 0x9e37_79b9_7f4a_7c15, 0.3);
    let field = DensityField::compute(&base, 30.0);
    let p = policy(1.0);
    let c = ctx(&[], &p, &field);

    type Pass = fn(&mut [Node], &PassContext<'_>) -> stellers::PassStats;
    let passes: [Pass; 3] = [
        apply_dense_core_inertia_relaxation,
        apply_angular_velocity_decoherence,
        apply_local_phase_diffusion,
    ];
    for pass in passes {
        let mut nodes = base.clone();
        let stats = pass(&mut nodes, &c);
        assert!(stats.nodes_affected > 0, "{:?} did nothing", stats.pass);
        for (after, before) in nodes.iter().zip(&base) {
            let (a, b) = (after.speed(), before.speed());
            assert!((a - b).abs() <= 1e-9 * b.max(1.0), "{:?} {}: {b} -> {a}", stats.pass, after.id);
        }
    }
}

#[test]
fn pairwise_passes_are_momentum_neutral() {
    let side = 6;
    let links = paired_links(side);
    let p = policy(1.0);

    type Pass = fn(&mut [Node], &PassContext<'_>) -> stellers::PassStats;
    let passes: [Pass; 2] = [apply_edge_shear_stagnation_escape, apply_static_friction_bypass];
    for pass in passes {
        let before = lattice(side);
        let field = DensityField::compute(&before, 30.0);
        let mut after = before.clone();
        let stats = pass(&mut after, &ctx(&links, &p, &field));
        assert_eq!(stats.nodes_affected, links.len() * 2, "{:?}", stats.pass);

        for l in &links {
            let dsx = after[l.source].vx - before[l.source].vx;
            let dsy = after[l.source].vy - before[l.source].vy;
            let dtx = after[l.target].vx - before[l.target].vx;
            let dty = after[l.target].vy - before[l.target].vy;
            assert!((dsx + dtx).abs() < 1e-6 && (dsy + dty).abs() < 1e-6);
            assert!(dsx.hypot(dsy) > 0.0);
            // Perpendicular to a horizontal edge.
            assert!(dsx.abs() < 1e-12);
        }
    }
}

#[test]
fn passes_are_deterministic() {
    let side = 6;
    let links = paired_links(side);
    let p = policy(0.95);
    let run = || {
        let mut nodes = with_random_velocities(lattice(side), 42, 0.2);
        let field = DensityField::compute(&nodes, 30.0);
        let stats = run_correction_passes(&mut nodes, &ctx(&links, &p, &field));
        (nodes, stats)
    };
    let (a, a_stats) = run();
    let (b, b_stats) = run();
    assert_eq!(a_stats, b_stats);
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.vx.to_bits(), y.vx.to_bits());
        assert_eq!(x.vy.to_bits(), y.vy.to_bits());
    }
}

#[test]
fn fixed_dragged_and_sleeping_nodes_are_never_touched() {
    let side = 6;
    let links = paired_links(side);
    let p = policy(1.0);
    let mut nodes = with_random_velocities(lattice(side), 7, 0.2);
    nodes[0].is_fixed = true;
    nodes[1].vx = 0.0;
    nodes[1].vy = 0.0;
    nodes[1].is_sleeping = true;
    let dragged = 14;
    let before = nodes.clone();

    let field = DensityField::compute(&nodes, 30.0);
    let mut c = ctx(&links, &p, &field);
    c.dragged = Some(dragged);
    for frame in 0..5 {
        c.now_ms = frame as f64 * 2000.0;
        run_correction_passes(&mut nodes, &c);
    }

    for idx in [0, 1, dragged] {
        assert_eq!((nodes[idx].vx, nodes[idx].vy), (before[idx].vx, before[idx].vy));
    }
    // The partners of excluded nodes are left alone too.
    assert_eq!(nodes[15].last_micro_slip_ms, None);
}

#[test]
fn every_pass_is_inert_at_zero_temperature() {
    let side = 6;
    let links = paired_links(side);
    let p = policy(0.0);
    let before = with_random_velocities(lattice(side), 11, 0.2);
    let mut nodes = before.clone();
    let field = DensityField::compute(&nodes, 30.0);
    let stats = run_correction_passes(&mut nodes, &ctx(&links, &p, &field));

    assert_eq!(stats.len(), 6);
    assert!(stats.iter().all(|s| s.nodes_affected == 0));
    assert_eq!(nodes, before);
}

#[test]
fn non_finite_nodes_are_skipped() {
    let side = 4;
    let links = paired_links(side);
    let p = policy(1.0);
    let mut nodes = with_random_velocities(lattice(side), 3, 0.2);
    nodes[5].vx = f64::NAN;
    nodes[6].x = f64::INFINITY;
    let field = DensityField::compute(&nodes, 30.0);
    run_correction_passes(&mut nodes, &ctx(&links, &p, &field));

    assert!(nodes[5].vx.is_nan());
    assert!(nodes[6].x.is_infinite());
    for (i, n) in nodes.iter().enumerate() {
        if i != 5 {
            assert!(n.vx.is_finite() && n.vy.is_finite(), "{} went non-finite", n.id);
        }
    }
}
