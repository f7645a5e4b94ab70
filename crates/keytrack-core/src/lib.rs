//! keytrack-core: keyframed property animation and curve evaluation
//! (engine-agnostic).
//!
//! This crate stores time-indexed keyframes for arbitrary value types
//! (scalars, vectors, quaternions, matrices, discrete types) and evaluates
//! a continuous or fixed-rate-sampled value at any query time: Hermite/
//! cubic-Bezier math with asymmetric in/out tangents, spherical rotation
//! blending, tangent-unification policies, baking to sample caches,
//! looping wrap-around, and analytic velocity/acceleration derivatives.
//!
//! A `Curve` is advanced once per simulation tick by its owning update
//! pass; there is no internal locking. Concurrent reads are safe against
//! the baked path only.

pub mod codec;
pub mod curve;
pub mod eval;
pub mod keyframe;
pub mod tangent;
pub mod track;
pub mod value;

// Re-exports for consumers (adapters)
pub use codec::{FormatError, TextFields};
pub use curve::{BakedSamples, Curve, SampleMode, StepCurve};
pub use keyframe::{Interp, Keyframe, StepKeyframe};
pub use tangent::TangentBias;
pub use track::{KeyframeTrack, StepTrack};
pub use value::{Interpolate, Quat};
