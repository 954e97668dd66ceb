use anyhow::{Result, bail};
use serde::Serialize;
use tracing::info;

/// Settings for a transactional-mail HTTP API (Brevo-style JSON body).
#[derive(Debug, Clone)]
pub struct HttpMailConfig {
    pub endpoint: String,
    pub api_key: String,
    pub sender: String,
}

pub enum Mailer {
    Http {
        client: reqwest::Client,
        config: HttpMailConfig,
    },
    /// No provider configured: the message is written to the log instead.
    Log,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody<'a> {
    sender: EmailAddress<'a>,
    to: Vec<EmailAddress<'a>>,
    subject: &'a str,
    text_content: String,
}

impl Mailer {
    pub fn http(config: HttpMailConfig) -> Self {
        Mailer::Http {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub async fn send_verification_code(&self, to: &str, user_id: &str, code: &str) -> Result<()> {
        let subject = "Verify your email";
        let text = format!(
            "Hi {user_id},\n\nyour verification code is: {code}\n\nIt expires in 30 minutes."
        );

        match self {
            Mailer::Log => {
                info!(to, user = user_id, code, "mail delivery not configured; logging code");
                Ok(())
            }
            Mailer::Http { client, config } => {
                let body = SendEmailBody {
                    sender: EmailAddress {
                        email: &config.sender,
                    },
                    to: vec![EmailAddress { email: to }],
                    subject,
                    text_content: text,
                };

                let resp = client
                    .post(&config.endpoint)
                    .header("api-key", &config.api_key)
                    .header("Accept", "application/json")
                    .json(&body)
                    .send()
                    .await?;

                let status = resp.status();
                if status.is_success() {
                    return Ok(());
                }
                let body = resp.text().await.unwrap_or_default();
                bail!("Mail send failed (status={status}): {body}")
            }
        }
    }
}
