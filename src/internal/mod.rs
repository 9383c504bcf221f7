//! Internal implementation details.

pub(crate) mod cache;
pub(crate) mod path;

pub(crate) use cache::{Disposer, InstanceCache};
pub use path::ResolutionPath;
