use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
	message::{header::ContentType, Mailbox},
	transport::smtp::authentication::Credentials,
	AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio::sync::Mutex;

use crate::config::SmtpConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
	#[error("invalid address: {0}")]
	Address(#[from] lettre::address::AddressError),
	#[error("invalid message: {0}")]
	Message(#[from] lettre::error::Error),
	#[error("smtp error: {0}")]
	Smtp(#[from] lettre::transport::smtp::Error),
}

/// An outgoing HTML email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
	pub to: String,
	pub subject: String,
	pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
	async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Sends mail through an authenticated SMTP relay.
pub struct SmtpMailer {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from: Mailbox,
}

impl SmtpMailer {
	/// Port 465 uses implicit TLS, any other port upgrades with STARTTLS.
	pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
		let builder = if config.port == 465 {
			AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
		} else {
			AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
		};

		let transport = builder
			.port(config.port)
			.credentials(Credentials::new(
				config.username.clone(),
				config.password.clone(),
			))
			.build();

		Ok(Self {
			transport,
			from: config.from.parse()?,
		})
	}
}

#[async_trait]
impl Mailer for SmtpMailer {
	async fn send(&self, email: Email) -> Result<(), MailError> {
		let message = Message::builder()
			.from(self.from.clone())
			.to(email.to.parse()?)
			.subject(email.subject)
			.header(ContentType::TEXT_HTML)
			.body(email.html)?;

		self.transport.send(message).await?;

		Ok(())
	}
}

/// Writes mail to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
	async fn send(&self, email: Email) -> Result<(), MailError> {
		tracing::info!(
			to = %email.to,
			subject = %email.subject,
			body = %email.html,
			"mail transport not configured, logging email"
		);

		Ok(())
	}
}

/// Keeps sent mail in memory so it can be inspected.
#[derive(Clone, Default)]
pub struct Outbox {
	sent: Arc<Mutex<Vec<Email>>>,
}

impl Outbox {
	pub async fn sent(&self) -> Vec<Email> {
		self.sent.lock().await.clone()
	}
}

#[async_trait]
impl Mailer for Outbox {
	async fn send(&self, email: Email) -> Result<(), MailError> {
		self.sent.lock().await.push(email);

		Ok(())
	}
}

/// The email carrying a password reset code.
pub fn reset_code_email(to: &str, code: &str, ttl: Option<chrono::Duration>) -> Email {
	let expiry = ttl.map_or_else(String::new, |ttl| {
		format!(
			"<p>This code will expire in {} minutes.</p>",
			ttl.num_minutes()
		)
	});

	Email {
		to: to.to_owned(),
		subject: "Password Reset OTP".into(),
		html: format!(
			"<h2>Password Reset Request</h2><p>Your OTP for password reset is: <strong>{code}</strong></p>{expiry}"
		),
	}
}
