use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use super::export_pdf::EXPORT_FILE_NAME;
use super::{Action, ActionContext, ActionParams, ParamSpec};
use crate::error::ActionError;
use crate::models::{Mode, SmtpSettings};

const ACTION: &str = "send_email";

/// Name the exported resume carries when attached
pub const ATTACHMENT_NAME: &str = "resume.pdf";

/// A fully assembled message, ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachment: Option<PathBuf>,
}

/// Delivers an email with the stored SMTP settings
pub trait Mailer: Send + Sync {
    fn deliver(&self, smtp: &SmtpSettings, email: &OutgoingEmail) -> Result<(), String>;
}

/// Blocking SMTP delivery. Port 465 uses implicit TLS, 587 STARTTLS and 25
/// plain text.
#[derive(Debug, Default)]
pub struct SmtpMailer;

impl SmtpMailer {
    fn build_message(email: &OutgoingEmail) -> Result<Message, String> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|e| format!("invalid sender address '{}': {}", email.from, e))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| format!("invalid recipient address '{}': {}", email.to, e))?;

        let builder = Message::builder().from(from).to(to).subject(email.subject.as_str());
        let html = SinglePart::html(email.html_body.clone());

        let message = match &email.attachment {
            Some(path) => {
                let bytes = fs::read(path)
                    .map_err(|e| format!("cannot read attachment {}: {}", path.display(), e))?;
                let content_type =
                    ContentType::parse("application/pdf").map_err(|e| e.to_string())?;
                let attachment = Attachment::new(ATTACHMENT_NAME.to_string()).body(bytes, content_type);
                builder.multipart(MultiPart::mixed().singlepart(html).singlepart(attachment))
            }
            None => builder.singlepart(html),
        };
        message.map_err(|e| e.to_string())
    }
}

impl Mailer for SmtpMailer {
    fn deliver(&self, smtp: &SmtpSettings, email: &OutgoingEmail) -> Result<(), String> {
        let host = smtp.smtp_server.as_deref().unwrap_or_default();
        let credentials = Credentials::new(
            smtp.sender_email.clone().unwrap_or_default(),
            smtp.sender_password.clone().unwrap_or_default(),
        );

        let builder = match smtp.smtp_port {
            465 => SmtpTransport::relay(host).map_err(|e| e.to_string())?,
            587 => SmtpTransport::starttls_relay(host).map_err(|e| e.to_string())?,
            _ => SmtpTransport::builder_dangerous(host),
        };
        let transport = builder.port(smtp.smtp_port).credentials(credentials).build();

        let message = Self::build_message(email)?;
        debug!("Connecting to {}:{}", host, smtp.smtp_port);
        transport.send(&message).map_err(|e| e.to_string())?;
        Ok(())
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Escape the body and keep its line structure in HTML
pub fn plain_text_to_html(text: &str) -> String {
    let escaped = escape_html(&text.replace('\r', "")).replace('\n', "<br>\n");
    format!(
        "<html><body><div style=\"font-family:Arial,sans-serif;font-size:14px;line-height:1.6;\">{}</div></body></html>",
        escaped
    )
}

fn parse_flag(value: &str) -> Result<bool, ActionError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        other => Err(ActionError::InvalidParam {
            action: ACTION,
            param: "has_attachment".to_string(),
            message: format!("expected true or false, got '{}'", other),
        }),
    }
}

/// `send_email(recipient, subject, body, has_attachment)`
pub struct SendEmailAction {
    mailer: Box<dyn Mailer>,
}

impl SendEmailAction {
    pub fn new(mailer: Box<dyn Mailer>) -> Self {
        Self { mailer }
    }
}

impl Action for SendEmailAction {
    fn name(&self) -> &'static str {
        ACTION
    }

    fn summary(&self, mode: Mode) -> &'static str {
        match mode {
            Mode::Candidate => "Email a cover letter to the employer, optionally attaching the exported resume",
            Mode::Hunter => "Email a candidate recommendation letter to the client",
        }
    }

    fn params(&self, mode: Mode) -> Vec<ParamSpec> {
        match mode {
            Mode::Candidate => vec![
                ParamSpec::new("recipient", "the employer's email address, taken from the job description"),
                ParamSpec::new("subject", "\"Application for <job title> - <your name>\""),
                ParamSpec::new("body", "a cover letter tailored to the job description"),
                ParamSpec::new("has_attachment", "true to attach the exported resume PDF"),
            ],
            Mode::Hunter => vec![
                ParamSpec::new("recipient", "the client's or hiring manager's email address"),
                ParamSpec::new("subject", "\"Candidate recommendation: <candidate name> for <job title>\""),
                ParamSpec::new("body", "a recommendation letter for the candidate"),
                ParamSpec::new("has_attachment", "false unless the candidate resume was exported to PDF"),
            ],
        }
    }

    fn invoke(&self, params: &ActionParams, ctx: &ActionContext<'_>) -> Result<String, ActionError> {
        let smtp = ctx.store.smtp();
        let missing = smtp.missing_fields();
        if !missing.is_empty() {
            return Err(ActionError::Config {
                action: ACTION,
                message: format!(
                    "SMTP settings are incomplete (missing {}). Run /smtp to configure them",
                    missing.join(", ")
                ),
            });
        }
        smtp.validate().map_err(|e| ActionError::Config {
            action: ACTION,
            message: e.to_string(),
        })?;

        let recipient = params.require(ACTION, "recipient")?;
        if !recipient.contains('@') {
            return Err(ActionError::InvalidParam {
                action: ACTION,
                param: "recipient".to_string(),
                message: format!("'{}' is not an email address", recipient),
            });
        }
        let subject = params.require(ACTION, "subject")?;
        let body = params.require(ACTION, "body")?;
        let attach = parse_flag(params.require(ACTION, "has_attachment")?)?;

        let attachment = if attach {
            let path = ctx.workdir.join(EXPORT_FILE_NAME);
            if !path.exists() {
                return Err(ActionError::Failed {
                    action: ACTION,
                    message: format!("no exported resume at {}. Export it to PDF first", path.display()),
                });
            }
            Some(path)
        } else {
            None
        };

        let email = OutgoingEmail {
            from: smtp.sender_email.clone().unwrap_or_default(),
            to: recipient.to_string(),
            subject: subject.to_string(),
            html_body: plain_text_to_html(body),
            attachment,
        };

        self.mailer
            .deliver(smtp, &email)
            .map_err(|message| ActionError::Failed { action: ACTION, message })?;

        info!("Email sent to {}", recipient);
        Ok(format!("Email sent to {}", recipient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::Store;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct RecordingMailer(Arc<Mutex<Vec<OutgoingEmail>>>);

    impl Mailer for RecordingMailer {
        fn deliver(&self, _smtp: &SmtpSettings, email: &OutgoingEmail) -> Result<(), String> {
            self.0.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn params(attach: &str) -> ActionParams {
        [
            ("recipient", "hr@example.com"),
            ("subject", "Application"),
            ("body", "Dear team,\n<b>hello</b>"),
            ("has_attachment", attach),
        ]
        .into_iter()
        .collect()
    }

    fn configured_store(dir: &TempDir) -> Store {
        let mut store = Store::open(dir.path().join("config.json")).unwrap();
        store
            .set_smtp(SmtpSettings {
                sender_email: Some("me@example.com".to_string()),
                sender_password: Some("secret".to_string()),
                smtp_server: Some("smtp.example.com".to_string()),
                smtp_port: 465,
            })
            .unwrap();
        store
    }

    #[test]
    fn test_plain_text_to_html() {
        let html = plain_text_to_html("a < b\nc & d");
        assert!(html.contains("a &lt; b<br>\nc &amp; d"));
    }

    #[test]
    fn test_unconfigured_smtp_fails_before_delivery() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("config.json")).unwrap();
        let mailer = RecordingMailer::default();
        let action = SendEmailAction::new(Box::new(mailer.clone()));

        let ctx = ActionContext { store: &store, workdir: dir.path() };
        let err = action.invoke(&params("false"), &ctx).unwrap_err();

        assert!(matches!(err, ActionError::Config { action: "send_email", .. }));
        assert!(err.to_string().contains("sender_email"));
        assert!(mailer.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sends_escaped_body() {
        let dir = TempDir::new().unwrap();
        let store = configured_store(&dir);
        let mailer = RecordingMailer::default();
        let action = SendEmailAction::new(Box::new(mailer.clone()));

        let ctx = ActionContext { store: &store, workdir: dir.path() };
        action.invoke(&params("no"), &ctx).unwrap();

        let sent = mailer.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, "me@example.com");
        assert!(sent[0].html_body.contains("Dear team,<br>"));
        assert!(sent[0].html_body.contains("&lt;b&gt;hello&lt;/b&gt;"));
        assert!(sent[0].attachment.is_none());
    }

    #[test]
    fn test_attachment_requires_exported_pdf() {
        let dir = TempDir::new().unwrap();
        let store = configured_store(&dir);
        let mailer = RecordingMailer::default();
        let action = SendEmailAction::new(Box::new(mailer.clone()));
        let ctx = ActionContext { store: &store, workdir: dir.path() };

        let err = action.invoke(&params("true"), &ctx).unwrap_err();
        assert!(matches!(err, ActionError::Failed { .. }));

        fs::write(dir.path().join(EXPORT_FILE_NAME), b"%PDF").unwrap();
        action.invoke(&params("true"), &ctx).unwrap();
        let sent = mailer.0.lock().unwrap();
        assert_eq!(sent[0].attachment, Some(dir.path().join(EXPORT_FILE_NAME)));
    }

    #[test]
    fn test_rejects_bad_recipient_and_flag() {
        let dir = TempDir::new().unwrap();
        let store = configured_store(&dir);
        let action = SendEmailAction::new(Box::new(RecordingMailer::default()));
        let ctx = ActionContext { store: &store, workdir: dir.path() };

        let bad: ActionParams = [
            ("recipient", "not-an-address"),
            ("subject", "s"),
            ("body", "b"),
            ("has_attachment", "false"),
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            action.invoke(&bad, &ctx),
            Err(ActionError::InvalidParam { .. })
        ));
        assert!(matches!(
            action.invoke(&params("maybe"), &ctx),
            Err(ActionError::InvalidParam { .. })
        ));
    }

    #[test]
    fn test_build_message_with_attachment() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join(EXPORT_FILE_NAME);
        fs::write(&pdf, b"%PDF-1.4").unwrap();
        let email = OutgoingEmail {
            from: "me@example.com".to_string(),
            to: "hr@example.com".to_string(),
            subject: "Hello".to_string(),
            html_body: plain_text_to_html("hi"),
            attachment: Some(pdf),
        };
        let message = SmtpMailer::build_message(&email).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("resume.pdf"));
        assert!(raw.contains("Subject: Hello"));
    }
}
