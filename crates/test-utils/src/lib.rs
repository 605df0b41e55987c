//! This crate provides fixtures shared by the tests across the escrow workspace.
//!
//! It only depends on the primitives so that any crate in the workspace can pull it in as a
//! dev-dependency without creating a cycle.

pub mod deposit;
pub mod money;
pub mod parties;
pub mod prelude;
