use crate::motion::MotionPolicy;
use crate::num::hypot;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
}

impl Velocity {
    pub fn new(vx: f64, vy: f64) -> Self {
        Self { vx, vy }
    }

    pub fn speed(&self) -> f64 {
        hypot(self.vx, self.vy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReleaseReason {
    #[serde(rename = "drag-release-handoff")]
    DragReleaseHandoff,
    #[serde(rename = "release-rest")]
    ReleaseRest,
}

impl ReleaseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DragReleaseHandoff => "drag-release-handoff",
            Self::ReleaseRest => "release-rest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InteractionAuthorityPolicy {
    pub local_boost_frames: u32,
    pub local_boost_strength: f64,
    pub local_boost_radius: f64,
    /// Velocity the caller should hand to the released node.
    pub release_velocity: Option<Velocity>,
    pub release_reason: Option<ReleaseReason>,
}

/// Computes the drag-release handoff. Never touches node state: the caller applies
/// `release_velocity` to the released node.
pub fn compute_interaction_authority(
    policy: &MotionPolicy,
    release: Option<Velocity>,
) -> InteractionAuthorityPolicy {
    let bands = &policy.interaction;
    let mut out = InteractionAuthorityPolicy {
        local_boost_frames: bands.local_boost_frames,
        local_boost_strength: bands.local_boost_strength,
        local_boost_radius: bands.local_boost_radius,
        release_velocity: None,
        release_reason: None,
    };
    let Some(v) = release else {
        return out;
    };

    let mut vx = v.vx * bands.release_damping;
    let mut vy = v.vy * bands.release_damping;
    if !(vx.is_finite() && vy.is_finite()) {
        vx = 0.0;
        vy = 0.0;
    }
    let speed = hypot(vx, vy);
    if speed > bands.max_release_speed && speed > 0.0 {
        let scale = bands.max_release_speed.max(0.0) / speed;
        vx *= scale;
        vy *= scale;
    }

    out.release_velocity = Some(Velocity { vx, vy });
    out.release_reason = Some(if speed > 0.001 {
        ReleaseReason::DragReleaseHandoff
    } else {
        ReleaseReason::ReleaseRest
    });
    out
}
