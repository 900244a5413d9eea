//! Authentication and authorization for ATLAS services.
//!
//! - [`token::TokenIssuer`] signs and verifies bearer credentials (HS256 JWT).
//! - [`password`] hashes and verifies passwords with Argon2id.
//! - [`guard::Authenticated`] is the axum extractor protected routes take.
//! - [`guard::ensure_owner`] authorizes mutation of an owned resource.

pub mod error;
pub mod guard;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use guard::{ensure_owner, Authenticated};
pub use token::{Claims, TokenIssuer};
