//! Municipal policies ("magazines"), the organizations that run them, and
//! the locations they apply to.

pub mod directory;
pub mod policy;

pub use directory::{Location, NewLocation, NewOrganization, Organization};
pub use policy::{Bookmark, NewPolicy, Policy, PolicyQuery};
