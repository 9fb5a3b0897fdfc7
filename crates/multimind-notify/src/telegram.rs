//! Telegram document upload

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Why forwarding a report failed. Never escalated past the caller — the
/// persisted artifact stays valid regardless.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to reach sink: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sink rejected upload (status {status}): {detail}")]
    Rejected { status: u16, detail: String },
}

/// Uploads report files to a Telegram chat via the bot API.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
    api_base: String,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self::with_api_base(bot_token, chat_id, DEFAULT_API_BASE.to_string())
    }

    /// Point the notifier at a different API host (used by tests).
    pub fn with_api_base(bot_token: String, chat_id: String, api_base: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            bot_token,
            chat_id,
            api_base,
        }
    }

    /// Upload the file at `path` as a document to the configured chat.
    pub async fn send_document(&self, path: &Path) -> Result<(), ForwardError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.txt".to_string());

        debug!(file = %file_name, bytes = bytes.len(), "uploading document to Telegram");

        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .part("document", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(format!(
                "{}/bot{}/sendDocument",
                self.api_base, self.bot_token
            ))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(chat_id = %self.chat_id, "document forwarded to Telegram");
            Ok(())
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(ForwardError::Rejected {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn report_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[tokio::test]
    async fn test_send_document_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendDocument"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json_ok()))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::with_api_base(
            "123:abc".to_string(),
            "42".to_string(),
            server.uri(),
        );
        let file = report_file("report body");
        notifier.send_document(file.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_document_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendDocument"))
            .respond_with(
                ResponseTemplate::new(403).set_body_string(
                    r#"{"ok":false,"error_code":403,"description":"Forbidden: bot was blocked"}"#,
                ),
            )
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::with_api_base(
            "123:abc".to_string(),
            "42".to_string(),
            server.uri(),
        );
        let file = report_file("report body");
        let err = notifier.send_document(file.path()).await.unwrap_err();
        match err {
            ForwardError::Rejected { status, detail } => {
                assert_eq!(status, 403);
                assert!(detail.contains("Forbidden"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let notifier = TelegramNotifier::new("123:abc".to_string(), "42".to_string());
        let err = notifier
            .send_document(Path::new("/nonexistent/report.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::Io(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let notifier = TelegramNotifier::new("123:secret".to_string(), "42".to_string());
        let debug = format!("{notifier:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    fn serde_json_ok() -> serde_json::Value {
        serde_json::json!({ "ok": true, "result": { "message_id": 1 } })
    }
}
