pub mod policy;
pub mod state;

pub use policy::{InteractionBands, MotionPolicy, PassGates, PassGeometry, SettleBands};
pub use state::{MotionAuthority, UnifiedMotionState, UnifiedMotionStateInput};
