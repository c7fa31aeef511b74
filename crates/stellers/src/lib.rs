#![forbid(unsafe_code)]

//! Jam-resistant stabilization for force-directed graph layouts.
//!
//! The host integrator computes spring/repulsion forces and advances positions; `stellers`
//! runs after it every frame, classifying the population on a settle ladder and applying
//! small, deterministic velocity corrections that break dense-cluster jamming.

pub mod config;
pub mod energy;
pub mod engine;
pub mod error;
pub mod graph;
pub mod hash;
pub mod interaction;
pub mod motion;
pub mod num;
pub mod passes;
pub mod settle;

pub use config::ForceConfig;
pub use energy::EnergyEnvelope;
pub use engine::{FrameInput, FrameReport, StabilizationEngine};
pub use error::{Error, Result};
pub use graph::{Link, Node, ResolvedLink, Topology};
pub use interaction::{
    InteractionAuthorityPolicy, ReleaseReason, Velocity, compute_interaction_authority,
};
pub use motion::{MotionAuthority, MotionPolicy, UnifiedMotionState, UnifiedMotionStateInput};
pub use passes::{DensityField, PassContext, PassKind, PassStats, run_correction_passes};
pub use settle::{SettleDebugStats, SettleFrame, SettleLadder, SettleState};
