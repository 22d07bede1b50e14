use serde::Serialize;

use super::templates::TemplateHeader;
use super::MESSAGES_PATH;
use crate::client::KrmPesanClient;
use crate::error::Result;
use crate::transport::ApiResponse;

#[derive(Debug, Serialize)]
struct TemplateMessage<'a> {
    phone: &'a str,
    template_name: &'a str,
    template_language: &'a str,
    template: TemplateContent<'a>,
}

#[derive(Debug, Serialize)]
struct TemplateContent<'a> {
    body: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<TemplateHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buttons: Option<ButtonLink<'a>>,
}

#[derive(Debug, Serialize)]
struct ButtonLink<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct ReplyMessage<'a> {
    phone: &'a str,
    reply: Reply<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Reply<'a> {
    Text { text: &'a str },
    Image { image: &'a str, caption: &'a str },
    Document { document: &'a str },
}

fn template_message<'a, S: AsRef<str>>(
    to: &'a str,
    template_name: &'a str,
    template_language: &'a str,
    body: &'a [S],
) -> TemplateMessage<'a> {
    TemplateMessage {
        phone: to,
        template_name,
        template_language,
        template: TemplateContent {
            body: body.iter().map(|part| part.as_ref()).collect(),
            header: None,
            buttons: None,
        },
    }
}

impl KrmPesanClient {
    /// Send a text-only template; `body` fills the template placeholders in order.
    pub async fn send_message_template_text<S: AsRef<str>>(
        &self,
        to: &str,
        template_name: &str,
        template_language: &str,
        body: &[S],
    ) -> Result<ApiResponse> {
        let message = template_message(to, template_name, template_language, body);
        self.post_json(MESSAGES_PATH, &message).await
    }

    pub async fn send_message_template_image<S: AsRef<str>>(
        &self,
        to: &str,
        template_name: &str,
        template_language: &str,
        body: &[S],
        image_url: &str,
    ) -> Result<ApiResponse> {
        let mut message = template_message(to, template_name, template_language, body);
        message.template.header = Some(TemplateHeader::image(image_url));
        self.post_json(MESSAGES_PATH, &message).await
    }

    pub async fn send_message_template_document<S: AsRef<str>>(
        &self,
        to: &str,
        template_name: &str,
        template_language: &str,
        body: &[S],
        document_url: &str,
    ) -> Result<ApiResponse> {
        let mut message = template_message(to, template_name, template_language, body);
        message.template.header = Some(TemplateHeader::document(document_url));
        self.post_json(MESSAGES_PATH, &message).await
    }

    /// Send a template whose call-to-action button opens `button_url`.
    pub async fn send_message_template_button<S: AsRef<str>>(
        &self,
        to: &str,
        template_name: &str,
        template_language: &str,
        body: &[S],
        button_url: &str,
    ) -> Result<ApiResponse> {
        let mut message = template_message(to, template_name, template_language, body);
        message.template.buttons = Some(ButtonLink { url: button_url });
        self.post_json(MESSAGES_PATH, &message).await
    }

    pub async fn send_reply_text(&self, to: &str, text: &str) -> Result<ApiResponse> {
        let message = ReplyMessage {
            phone: to,
            reply: Reply::Text { text },
        };
        self.post_json(MESSAGES_PATH, &message).await
    }

    pub async fn send_reply_image(
        &self,
        to: &str,
        image_url: &str,
        caption: &str,
    ) -> Result<ApiResponse> {
        let message = ReplyMessage {
            phone: to,
            reply: Reply::Image {
                image: image_url,
                caption,
            },
        };
        self.post_json(MESSAGES_PATH, &message).await
    }

    pub async fn send_reply_document(&self, to: &str, document_url: &str) -> Result<ApiResponse> {
        let message = ReplyMessage {
            phone: to,
            reply: Reply::Document {
                document: document_url,
            },
        };
        self.post_json(MESSAGES_PATH, &message).await
    }

    /// List messages sent from this device.
    pub async fn get_messages(&self) -> Result<ApiResponse> {
        self.get(MESSAGES_PATH).await
    }
}
