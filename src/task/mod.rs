//! Task module - open task descriptions and the records they are built from.
//!
//! Tasks flow top-down through the agent tree; each node maps one task into
//! zero or more subtasks without side effects.

mod profile;
mod spec;
mod trip;
mod visit;

pub use profile::UserProfile;
pub use spec::{TaskSpec, AGENT_INDEX};
pub use trip::{inclusive_days, Trip};
pub use visit::Visit;
