//! Use case layer: application workflows and orchestration.

pub mod auth;
pub mod bootstrap;
pub mod context;
pub mod create_chat;
pub mod send_message;
pub mod sync;

/// Returns the usecases module name for smoke checks.
pub fn module_name() -> &'static str {
    "usecases"
}
