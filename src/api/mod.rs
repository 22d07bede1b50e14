//! Per-endpoint methods on [`KrmPesanClient`](crate::KrmPesanClient).
//!
//! Every method builds a fixed JSON shape and hands it to the dispatcher;
//! responses come back unparsed as [`ApiResponse`](crate::transport::ApiResponse).

pub mod devices;
pub mod messages;
pub mod templates;

pub use templates::{MediaKind, TemplateCategory, TemplateHeader, TemplateLang};

pub const MESSAGES_PATH: &str = "messages";
pub const TEMPLATE_PATH: &str = "messages/template";
pub const TEMPLATE_LANG_PATH: &str = "messages/template/lang";
pub const DEVICES_PATH: &str = "devices";
