//! # Ring Module
//!
//! Provides the [`ModRing`] struct for representing the residue rings Z_N and Z_{N²}
//! over arbitrary-precision integers.

pub mod math;

pub use math::ModRing;
