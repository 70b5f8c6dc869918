//! Database models split into domain-specific modules.

pub mod attribute;
pub mod ingredient;
pub mod recipe;
pub mod tag;
pub mod user;

pub use attribute::{AttributeRef, AttributeResponse, RecipeAttribute, UpdateAttributeRequest};
pub use ingredient::*;
pub use recipe::*;
pub use tag::*;
pub use user::*;
