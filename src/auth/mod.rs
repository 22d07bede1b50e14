//! Credential state, persistence, and the token refresh lifecycle.

pub mod credentials;
pub mod lifecycle;
pub mod store;

pub use credentials::{Credentials, PersistedToken, TokenState};
pub use lifecycle::{TokenLifecycle, TokenResponse};
pub use store::{FileTokenStore, TokenStore};
