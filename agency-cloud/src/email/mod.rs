//! Transactional email via SES
//!
//! Callers log and ignore send failures.

use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use chrono::NaiveDate;
use shared::compliance::AlertLevel;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Rendered plain-text email
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub subject: String,
    pub body: String,
}

#[derive(Clone)]
pub struct EmailClient {
    ses: SesClient,
    from: String,
    app_base_url: String,
}

impl EmailClient {
    pub fn new(ses: SesClient, from: String, app_base_url: String) -> Self {
        Self {
            ses,
            from,
            app_base_url,
        }
    }

    pub fn app_base_url(&self) -> &str {
        &self.app_base_url
    }

    pub async fn send(&self, to: &str, email: Email) -> Result<(), BoxError> {
        let subject = Content::builder().data(email.subject).build()?;
        let body = Body::builder()
            .text(Content::builder().data(email.body).build()?)
            .build();
        let message = Message::builder().subject(subject).body(body).build();

        self.ses
            .send_email()
            .from_email_address(&self.from)
            .destination(Destination::builder().to_addresses(to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await?;
        Ok(())
    }

    /// Send in the background; failures are logged
    pub fn send_detached(&self, to: String, email: Email, kind: &'static str) {
        let client = self.clone();
        tokio::spawn(async move {
            match client.send(&to, email).await {
                Ok(()) => tracing::info!(to = %to, kind, "Email sent"),
                Err(e) => tracing::error!(to = %to, kind, error = %e, "Failed to send email"),
            }
        });
    }
}

pub fn verification_code(code: &str) -> Email {
    Email {
        subject: "Your verification code".into(),
        body: format!(
            "Your verification code is: {code}\n\
             It is valid for 10 minutes.\n\n\
             If you did not create an account, you can ignore this email."
        ),
    }
}

pub fn password_reset_code(code: &str) -> Email {
    Email {
        subject: "Reset your password".into(),
        body: format!(
            "Your password reset code is: {code}\n\
             It is valid for 10 minutes.\n\n\
             If you did not request a reset, you can ignore this email."
        ),
    }
}

pub fn claim_approved(app_base_url: &str, agency_name: &str, agency_slug: &str) -> Email {
    Email {
        subject: format!("Your claim for {agency_name} was approved"),
        body: format!(
            "Your ownership claim for \"{agency_name}\" has been approved.\n\
             You can now manage the profile at {app_base_url}/agencies/{agency_slug}/edit"
        ),
    }
}

pub fn claim_rejected(agency_name: &str, reason: &str) -> Email {
    Email {
        subject: format!("Your claim for {agency_name} was not approved"),
        body: format!(
            "Your ownership claim for \"{agency_name}\" was not approved.\n\n\
             Reason: {reason}\n\n\
             You may submit a new claim with additional information."
        ),
    }
}

pub fn compliance_alert(
    app_base_url: &str,
    agency_name: &str,
    agency_id: i64,
    item_title: &str,
    expiration: NaiveDate,
    level: AlertLevel,
) -> Email {
    let (subject, lead) = match level {
        AlertLevel::Expired => (
            format!("{item_title} has expired"),
            format!("\"{item_title}\" for {agency_name} expired on {expiration}."),
        ),
        AlertLevel::Days1 => (
            format!("{item_title} expires tomorrow"),
            format!("\"{item_title}\" for {agency_name} expires on {expiration}."),
        ),
        AlertLevel::Days7 | AlertLevel::Days14 | AlertLevel::Days30 => {
            let days = match level {
                AlertLevel::Days7 => 7,
                AlertLevel::Days14 => 14,
                _ => 30,
            };
            (
                format!("{item_title} expires within {days} days"),
                format!("\"{item_title}\" for {agency_name} expires on {expiration}."),
            )
        }
    };
    Email {
        subject,
        body: format!(
            "{lead}\n\
             Upload the renewed document at {app_base_url}/dashboard/agencies/{agency_id}/compliance"
        ),
    }
}

pub fn labor_request_received(app_base_url: &str, agency_name: &str, agency_id: i64, headcount: i32) -> Email {
    Email {
        subject: format!("New labor request for {agency_name}"),
        body: format!(
            "{agency_name} received a new labor request for {headcount} worker(s).\n\
             Review it at {app_base_url}/dashboard/agencies/{agency_id}/labor-requests"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_code_body_contains_code() {
        let email = verification_code("123456");
        assert!(email.body.contains("123456"));
        assert!(email.body.contains("10 minutes"));
    }

    #[test]
    fn test_compliance_alert_subjects() {
        let exp = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let email = compliance_alert("https://app", "Acme", 4, "General Liability", exp, AlertLevel::Days7);
        assert_eq!(email.subject, "General Liability expires within 7 days");
        assert!(email.body.contains("2025-06-30"));
        assert!(email.body.contains("https://app/dashboard/agencies/4/compliance"));

        let email = compliance_alert("https://app", "Acme", 4, "Bond", exp, AlertLevel::Expired);
        assert_eq!(email.subject, "Bond has expired");
    }

    #[test]
    fn test_claim_rejected_includes_reason() {
        let email = claim_rejected("Acme", "Domain does not match");
        assert!(email.body.contains("Domain does not match"));
    }
}
