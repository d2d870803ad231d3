//! Domain layer: core entities and reconciliation rules.

pub mod chat;
pub mod message;
pub mod sync;
pub mod user;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
