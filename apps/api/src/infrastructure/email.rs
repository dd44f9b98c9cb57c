use async_trait::async_trait;
use lettre::{
    message::{MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::auth::otp::OTP_TTL_MINUTES;
use crate::config::{SmtpConfig, SmtpEncryption};
use crate::domain::user::{Email, OtpCode};

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Failed to build email message: {0}")]
    MessageBuild(String),
    #[error("Failed to send email: {0}")]
    SendFailed(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Why a code is being sent; selects the subject line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    Verification,
    PasswordReset,
}

impl OtpPurpose {
    pub fn subject(self) -> &'static str {
        match self {
            OtpPurpose::Verification => "Your Email Verification OTP",
            OtpPurpose::PasswordReset => "Your Password Reset OTP",
        }
    }
}

/// Plain-text body shared by every transport
pub fn otp_text_body(code: &OtpCode) -> String {
    format!(
        "Your OTP is {}. It will expire in {} minutes.",
        code, OTP_TTL_MINUTES
    )
}

#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_otp(&self, to: &Email, code: &OtpCode, purpose: OtpPurpose)
        -> Result<(), EmailError>;
}

/// Writes codes to the log instead of sending them; used when SMTP is not configured
#[derive(Debug, Default, Clone)]
pub struct LogOtpMailer;

#[async_trait]
impl OtpMailer for LogOtpMailer {
    async fn send_otp(
        &self,
        to: &Email,
        code: &OtpCode,
        purpose: OtpPurpose,
    ) -> Result<(), EmailError> {
        tracing::info!(
            to = %to,
            subject = purpose.subject(),
            "[LOG MAILER] {}",
            otp_text_body(code)
        );
        Ok(())
    }
}

pub struct SmtpOtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpOtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = match config.encryption {
            SmtpEncryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| EmailError::ConfigError(format!("SMTP relay error: {}", e)))?
                .port(config.port)
                .credentials(credentials)
                .build(),
            SmtpEncryption::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| EmailError::ConfigError(format!("SMTP starttls error: {}", e)))?
                    .port(config.port)
                    .credentials(credentials)
                    .build()
            }
            SmtpEncryption::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                    .port(config.port)
                    .credentials(credentials)
                    .build()
            }
        };

        Ok(Self {
            mailer,
            from: format!("{} <{}>", config.from_name, config.from_email),
        })
    }
}

#[async_trait]
impl OtpMailer for SmtpOtpMailer {
    async fn send_otp(
        &self,
        to: &Email,
        code: &OtpCode,
        purpose: OtpPurpose,
    ) -> Result<(), EmailError> {
        let text = otp_text_body(code);
        let html = format!("<b>{}</b>", text);

        let email = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| EmailError::MessageBuild(format!("Invalid from address: {}", e)))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|e| EmailError::MessageBuild(format!("Invalid to address: {}", e)))?)
            .subject(purpose.subject())
            .multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::plain(text))
                    .singlepart(SinglePart::html(html)),
            )
            .map_err(|e| EmailError::MessageBuild(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        Ok(())
    }
}

/// Picks the SMTP mailer when configured, the log mailer otherwise
pub fn create_mailer(smtp: Option<&SmtpConfig>) -> Box<dyn OtpMailer> {
    match smtp {
        Some(config) => match SmtpOtpMailer::new(config) {
            Ok(mailer) => {
                tracing::info!(host = %config.host, "Using SMTP mailer");
                Box::new(mailer)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize SMTP mailer: {}. Falling back to log mailer",
                    e
                );
                Box::new(LogOtpMailer)
            }
        },
        None => {
            tracing::info!("SMTP not configured. OTP emails will be written to the log");
            Box::new(LogOtpMailer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_mentions_code_and_lifetime() {
        let code = OtpCode::parse("482913").unwrap();
        assert_eq!(
            otp_text_body(&code),
            "Your OTP is 482913. It will expire in 10 minutes."
        );
    }

    #[test]
    fn subjects_differ_by_purpose() {
        assert_ne!(
            OtpPurpose::Verification.subject(),
            OtpPurpose::PasswordReset.subject()
        );
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let mailer = LogOtpMailer;
        let result = mailer
            .send_otp(
                &Email::new("someone@gmail.com").unwrap(),
                &OtpCode::parse("123456").unwrap(),
                OtpPurpose::Verification,
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn create_mailer_without_smtp_delivers_to_log() {
        let mailer = create_mailer(None);
        let result = mailer
            .send_otp(
                &Email::new("someone@gmail.com").unwrap(),
                &OtpCode::parse("654321").unwrap(),
                OtpPurpose::PasswordReset,
            )
            .await;
        assert!(result.is_ok());
    }
}
