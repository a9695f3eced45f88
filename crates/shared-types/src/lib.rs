//! # Shared Types Crate
//!
//! Chain primitives shared by every subsystem that reasons about value
//! transfer: amounts, output scripts, transactions and canonical hashing.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Amount units, money range and script shapes
//!   are defined once here.
//! - **Checked Arithmetic**: Sums over untrusted outputs never wrap; they
//!   report out-of-range instead.

pub mod entities;
pub mod hashing;

pub use entities::*;
pub use hashing::*;
