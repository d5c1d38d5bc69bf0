//! Data models for the Spoonful recipe application.
//!
//! Field names serialize in camelCase to match the mobile client's documents.

mod datastore;
mod ingredient;
mod recipe;
mod user;

pub use datastore::*;
pub use ingredient::*;
pub use recipe::*;
pub use user::*;
