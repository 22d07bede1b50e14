use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{TEMPLATE_LANG_PATH, TEMPLATE_PATH};
use crate::client::KrmPesanClient;
use crate::error::Result;
use crate::transport::ApiResponse;

/// Template category accepted by the service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum TemplateCategory {
    Utility,
    Authentication,
    Marketing,
}

/// Media kind for template headers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Image,
    Document,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateHeader {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
}

impl TemplateHeader {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            url: url.into(),
        }
    }

    pub fn document(url: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Document,
            url: url.into(),
        }
    }
}

/// A language variant of an existing template.
///
/// Absent `header`, `footer` and `button` are sent as JSON `null`.
///
/// # Example
/// ```
/// use krmpesan::api::{TemplateHeader, TemplateLang};
///
/// let lang = TemplateLang::builder()
///     .slug("order-shipped")
///     .language("id")
///     .message("Pesanan {{1}} sudah dikirim")
///     .fields(vec!["order_id".to_string()])
///     .header(TemplateHeader::image("https://cdn.example/banner.png"))
///     .build();
/// assert!(lang.footer.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Builder)]
pub struct TemplateLang {
    #[builder(into)]
    pub slug: String,
    #[builder(into)]
    pub language: String,
    #[builder(into)]
    pub message: String,
    #[builder(default)]
    pub fields: Vec<String>,
    pub header: Option<TemplateHeader>,
    #[builder(into)]
    pub footer: Option<String>,
    pub button: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct CreateTemplate<'a> {
    name: &'a str,
    category: TemplateCategory,
    description: &'a str,
}

impl KrmPesanClient {
    pub async fn create_template(
        &self,
        name: &str,
        category: TemplateCategory,
        description: &str,
    ) -> Result<ApiResponse> {
        self.post_json(
            TEMPLATE_PATH,
            &CreateTemplate {
                name,
                category,
                description,
            },
        )
        .await
    }

    pub async fn create_template_lang(&self, template: &TemplateLang) -> Result<ApiResponse> {
        self.post_json(TEMPLATE_LANG_PATH, template).await
    }
}
