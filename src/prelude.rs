//! Convenience re-exports for common use.

pub use crate::api::{MediaKind, TemplateCategory, TemplateHeader, TemplateLang};
pub use crate::auth::{Credentials, FileTokenStore, TokenState, TokenStore};
pub use crate::client::KrmPesanClient;
pub use crate::config::{ClientConfig, CredentialSource, DirectCredentials, HeaderMode};
pub use crate::error::{KrmPesanError, Result};
pub use crate::transport::{ApiResponse, HttpMethod, RequestBody};
