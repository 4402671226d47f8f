//! Database entities for the asset tracking domain.
//!
//! Availability is never stored: whether a product is assigned is always a
//! projection over its assignment rows (see [`assignment`]).

pub mod assignment;
pub mod branch;
pub mod category;
pub mod department;
pub mod employee;
pub mod product;
pub mod user;

pub use assignment::{AssignmentCondition, AssignmentStatus};
pub use user::UserRole;
