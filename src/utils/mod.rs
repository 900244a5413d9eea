//! Project-specific utilities live here.

pub mod validation;

/// Generate a fresh document id (UUID v7, time ordered).
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
