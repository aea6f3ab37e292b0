//! Credential primitives: redacted secrets and the token vault built on a key-value store.

pub mod credentials;
pub mod secret;

pub use credentials::*;
pub use secret::*;
