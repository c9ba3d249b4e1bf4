pub mod entity;
pub mod store;

pub use entity::{FieldLookup, PathNode, TrackedEntity};
pub use store::LogStore;
