//! Ice-skating locomotion simulation.
//!
//! Replaces a host character controller's walking locomotion with momentum
//! skating while the rider stands on a skateable surface: foot pumps and
//! analog input build momentum, body facing steers it, and lateral blade
//! postures brake. The core is pure computation over per-tick tracking
//! samples, with trait seams for the host controller and physics raycasts.

pub mod effects;
pub mod facing;
pub mod height;
pub mod inflection;
pub mod move_state;
pub mod rink;
pub mod skating;
pub mod status;
pub mod surface;
pub mod types;

pub use skating::{SkateConfig, SkateEngine, SkateEvent, SkateSnapshot, TickOutput};
pub use surface::{FrameOutput, SurfaceTracker};
