//! # Governance Services
//!
//! - [`TriggerRegistry`]: tracked triggers and their reaping
//! - [`SuperblockManager`]: winner selection and block checks, implements
//!   [`crate::ports::SuperblockApi`]
//!
//! Lock order: the governance store lock is always taken before the
//! registry lock. Registry methods take the store view as a parameter so
//! the order cannot be inverted.

mod manager;
mod registry;

pub use manager::SuperblockManager;
pub use registry::TriggerRegistry;
