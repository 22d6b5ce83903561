//! Geometric kernel of the index.
//!
//! [`predicates`] holds the pure coordinate-level tests, [`wrapper`] lifts
//! them to mesh entities addressed by id, and [`distortion`] provides the
//! trihedral angles behind the discrete-distortion query.

pub mod distortion;
pub mod predicates;
pub mod wrapper;

pub use predicates::{TOLERANCE, LEFT_TURN, NO_TURN, RIGHT_TURN};
