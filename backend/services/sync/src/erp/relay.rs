use reqwest::Client;

use super::models::ErrorLogRequest;

/// Posts known, non-actionable rejections to the ERP's own error log so
/// they stay visible without landing in the local `error.log`.
#[derive(Clone)]
pub struct ErrorLogRelay {
    client: Client,
    url: String,
    authorization: String,
}

impl ErrorLogRelay {
    pub fn new(client: Client, url: String, authorization: String) -> Self {
        Self {
            client,
            url,
            authorization,
        }
    }

    /// Best-effort: any failure is logged at WARN and dropped. Returns whether
    /// the remote accepted the entry.
    pub async fn relay(&self, title: &str, message: &str) -> bool {
        let body = ErrorLogRequest {
            title: title.to_string(),
            error: message.to_string(),
        };

        let result = self
            .client
            .post(&self.url)
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(title, "relayed error to remote error log");
                true
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                let response = resp.text().await.unwrap_or_default();
                tracing::warn!(status, response = %response, title, "error log relay rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, title, "error log relay failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ERROR_LOG_PATH: &str = "/api/resource/Error%20Log";

    fn relay_for(base: &str) -> ErrorLogRelay {
        ErrorLogRelay::new(
            Client::new(),
            format!("{base}/api/resource/Error Log"),
            "token key:secret".to_string(),
        )
    }

    #[tokio::test]
    async fn posts_title_and_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ERROR_LOG_PATH))
            .and(header("Authorization", "token key:secret"))
            .and(body_json(serde_json::json!({
                "title": "Attendance sync: EMP-7",
                "error": "No Employee found for the given employee field value"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let ok = relay_for(&server.uri())
            .relay(
                "Attendance sync: EMP-7",
                "No Employee found for the given employee field value",
            )
            .await;
        assert!(ok);
    }

    #[tokio::test]
    #[traced_test]
    async fn rejection_is_logged_without_error_level() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ERROR_LOG_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("not permitted"))
            .expect(1)
            .mount(&server)
            .await;

        let ok = relay_for(&server.uri()).relay("t", "m").await;
        assert!(!ok);

        assert!(logs_contain("error log relay rejected"));
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|l| l.contains(" ERROR ")).count() {
                0 => Ok(()),
                n => Err(format!("expected no ERROR lines, got {n}")),
            }
        });
    }

    #[tokio::test]
    async fn unreachable_endpoint_does_not_raise() {
        let ok = relay_for("http://127.0.0.1:1").relay("t", "m").await;
        assert!(!ok);
    }
}
