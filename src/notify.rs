//! Account lifecycle notifications.
//!
//! Sends are best-effort: spawned onto the runtime, never awaited by the
//! request handler, and failures are only logged. Without an API key
//! configured, sends are skipped entirely.

use serde_json::json;

use crate::config::Config;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Outbound email client for account lifecycle events.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_key: Option<String>,
    from: String,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.sendgrid_api_key.clone(),
            from: config.email_from.clone(),
        }
    }

    /// Greets a freshly registered account.
    pub fn send_welcome(&self, to: String, name: String) {
        let body = format!(
            "Welcome to the app, {}. Let me know how you get along with it.",
            name
        );
        self.send_in_background(to, "Thanks for joining in!".to_string(), body);
    }

    /// Confirms an account cancellation.
    pub fn send_cancellation(&self, to: String, name: String) {
        let body = format!(
            "It's a shame to see you go, {}. Please let us know why you cancelled your account.",
            name
        );
        self.send_in_background(to, "Cancellation confirmed".to_string(), body);
    }

    fn send_in_background(&self, to: String, subject: String, body: String) {
        let Some(api_key) = self.api_key.clone() else {
            log::debug!("email delivery disabled, skipping \"{}\" to {}", subject, to);
            return;
        };
        let client = self.client.clone();
        let from = self.from.clone();

        tokio::spawn(async move {
            let payload = json!({
                "personalizations": [{ "to": [{ "email": to }] }],
                "from": { "email": from },
                "subject": subject,
                "content": [{ "type": "text/plain", "value": body }],
            });

            let result = client
                .post(SENDGRID_SEND_URL)
                .bearer_auth(api_key)
                .json(&payload)
                .send()
                .await
                .and_then(|response| response.error_for_status());

            if let Err(err) = result {
                log::warn!("failed to send \"{}\" to {}: {}", subject, to, err);
            }
        });
    }
}
