//! Object store facade and self-persisting records

mod live;
mod object_store;

pub use live::{LiveObject, Mutation, MutationHooks};
pub use object_store::ObjectStore;
