use crate::config::Settings;
use crate::report::Briefing;
use anyhow::Context;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SUBJECT: &str = "📊 Pre-Market Alert";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub user: String,
    pub pass: String,
    pub to: Vec<String>,
    pub subject: String,
}

impl EmailConfig {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let user = settings.require_email_user()?.to_string();
        let pass = settings.require_email_pass()?.to_string();
        let to = settings
            .require_email_to()?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        anyhow::ensure!(!to.is_empty(), "EMAIL_TO has no recipients");

        let smtp_host =
            std::env::var("SMTP_HOST").unwrap_or_else(|_| DEFAULT_SMTP_HOST.to_string());
        let smtp_port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_SMTP_PORT);
        let subject =
            std::env::var("EMAIL_SUBJECT").unwrap_or_else(|_| DEFAULT_SUBJECT.to_string());

        Ok(Self {
            smtp_host,
            smtp_port,
            user,
            pass,
            to,
            subject,
        })
    }
}

/// multipart/alternative: plain text first, HTML second.
pub fn build_message(cfg: &EmailConfig, briefing: &Briefing) -> anyhow::Result<Message> {
    let from: Mailbox = cfg
        .user
        .parse()
        .with_context(|| format!("invalid sender address {:?}", cfg.user))?;

    let mut builder = Message::builder().from(from).subject(cfg.subject.clone());
    for to in &cfg.to {
        let mailbox: Mailbox = to
            .parse()
            .with_context(|| format!("invalid recipient address {to:?}"))?;
        builder = builder.to(mailbox);
    }

    builder
        .multipart(MultiPart::alternative_plain_html(
            briefing.render_text(),
            briefing.render_html(),
        ))
        .context("failed to build briefing email")
}

pub async fn send_briefing(cfg: &EmailConfig, briefing: &Briefing) -> anyhow::Result<()> {
    let message = build_message(cfg, briefing)?;

    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)
        .with_context(|| format!("failed to configure SMTP relay {}", cfg.smtp_host))?
        .port(cfg.smtp_port)
        .credentials(Credentials::new(cfg.user.clone(), cfg.pass.clone()))
        .build();

    mailer
        .send(message)
        .await
        .with_context(|| format!("SMTP send via {} failed", cfg.smtp_host))?;

    tracing::info!(recipients = cfg.to.len(), "briefing email sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::{DirectionCall, MarketQuotes};
    use crate::domain::sentiment::Sentiment;
    use chrono::NaiveDate;

    fn cfg(to: &[&str]) -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.test".into(),
            smtp_port: 587,
            user: "bot@example.com".into(),
            pass: "secret".into(),
            to: to.iter().map(|s| s.to_string()).collect(),
            subject: "Pre-Market Alert".into(),
        }
    }

    fn briefing() -> Briefing {
        Briefing {
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            quotes: MarketQuotes::default(),
            news: vec![],
            direction: DirectionCall {
                sentiment: Sentiment::Neutral,
                confidence: 0.5,
                reasons: vec![],
            },
            move_msg: "N/A".into(),
            generated_at: "08:15 AM ET".into(),
        }
    }

    #[test]
    fn builds_alternative_message() {
        let msg = build_message(&cfg(&["desk@example.com", "me@example.com"]), &briefing()).unwrap();
        let raw = String::from_utf8_lossy(&msg.formatted()).to_string();
        assert!(raw.contains("Subject: Pre-Market Alert"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
        assert!(raw.contains("desk@example.com"));
        assert!(raw.contains("me@example.com"));
    }

    #[test]
    fn rejects_bad_recipient() {
        assert!(build_message(&cfg(&["not an address"]), &briefing()).is_err());
    }
}
