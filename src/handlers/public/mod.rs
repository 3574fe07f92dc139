// Handlers reachable without the shared-secret header

pub mod verify;

pub use verify::{method_not_allowed, verify_post};
