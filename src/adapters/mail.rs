use crate::domain::model::{MailMessage, SendMode};
use crate::domain::ports::{MailSession, MailTransport};
use crate::utils::error::TransportError;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::{AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LettreTransportConfig {
    /// Account the messages are sent from (the `Sender` when sending on behalf of a shared mailbox).
    pub from: String,
    /// `smtp://` or `smtps://` URL; required only for send mode.
    pub smtp_url: Option<String>,
    /// Directory preview `.eml` files are written to.
    pub preview_dir: PathBuf,
    /// Open each preview in the desktop mail client.
    pub open_previews: bool,
}

/// Mail collaborator backed by lettre: SMTP for send mode, `.eml` files for preview mode.
#[derive(Debug, Clone)]
pub struct LettreTransport {
    config: LettreTransportConfig,
}

impl LettreTransport {
    pub fn new(config: LettreTransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailTransport for LettreTransport {
    async fn open(&self) -> Result<Box<dyn MailSession>, TransportError> {
        let from = parse_mailbox(&self.config.from)?;

        let smtp = match &self.config.smtp_url {
            Some(url) => Some(AsyncSmtpTransport::<Tokio1Executor>::from_url(url)?.build()),
            None => None,
        };

        tokio::fs::create_dir_all(&self.config.preview_dir)
            .await
            .map_err(|e| {
                TransportError::Other(format!(
                    "cannot create preview directory {}: {}",
                    self.config.preview_dir.display(),
                    e
                ))
            })?;

        tracing::debug!(
            "Mail session opened (smtp: {}, previews: {})",
            smtp.is_some(),
            self.config.preview_dir.display()
        );

        Ok(Box::new(LettreSession {
            from,
            smtp,
            preview: AsyncFileTransport::<Tokio1Executor>::new(&self.config.preview_dir),
            preview_dir: self.config.preview_dir.clone(),
            open_previews: self.config.open_previews,
            closed: false,
        }))
    }
}

pub struct LettreSession {
    from: Mailbox,
    smtp: Option<AsyncSmtpTransport<Tokio1Executor>>,
    preview: AsyncFileTransport<Tokio1Executor>,
    preview_dir: PathBuf,
    open_previews: bool,
    closed: bool,
}

#[async_trait]
impl MailSession for LettreSession {
    async fn deliver(&mut self, message: &MailMessage) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::SessionClosed);
        }

        let email = build_email(&self.from, message).await?;

        match message.mode {
            SendMode::Preview => {
                let id = self.preview.send(email).await?;
                let path = self.preview_dir.join(format!("{}.eml", id));
                tracing::debug!("Preview written to {}", path.display());

                if self.open_previews {
                    // a missing desktop handler should not fail the row
                    if let Err(e) = open::that_detached(&path) {
                        tracing::warn!("Could not open preview {}: {}", path.display(), e);
                    }
                }
            }
            SendMode::Send => {
                let smtp = self.smtp.as_ref().ok_or(TransportError::SmtpNotConfigured)?;
                smtp.send(email).await?;
            }
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        // dropping the transport shuts its pooled connections
        self.smtp = None;
        self.closed = true;
        tracing::debug!("Mail session closed");
        Ok(())
    }
}

/// Turn a rendered message into a MIME email.
///
/// `to` may hold several `;`/`,`-separated addresses. With `on_behalf_of`,
/// the shared mailbox becomes `From` and the session account becomes `Sender`. Attachment paths that do not exist are skipped.
pub async fn build_email(from: &Mailbox, message: &MailMessage) -> Result<Message, TransportError> {
    let recipients = parse_mailbox_list(Some(&message.to))?;
    if recipients.is_empty() {
        return Err(TransportError::Other("message has no recipient".to_string()));
    }

    let mut builder = Message::builder().subject(message.subject.clone());
    for addr in recipients {
        builder = builder.to(addr);
    }

    builder = match non_blank(message.on_behalf_of.as_deref()) {
        Some(owner) => builder.from(parse_mailbox(owner)?).sender(from.clone()),
        None => builder.from(from.clone()),
    };

    for addr in parse_mailbox_list(message.cc.as_deref())? {
        builder = builder.cc(addr);
    }
    for addr in parse_mailbox_list(message.bcc.as_deref())? {
        builder = builder.bcc(addr);
    }
    if let Some(reply_to) = non_blank(message.reply_to.as_deref()) {
        builder = builder.reply_to(parse_mailbox(reply_to)?);
    }

    let html = SinglePart::html(message.html_body.clone());
    if message.attachments.is_empty() {
        return Ok(builder.singlepart(html)?);
    }

    let mut mixed = MultiPart::mixed().singlepart(html);
    for path in &message.attachments {
        if !path.exists() {
            tracing::warn!("Attachment {} not found, skipping", path.display());
            continue;
        }
        mixed = mixed.singlepart(read_attachment(path).await?);
    }

    Ok(builder.multipart(mixed)?)
}

async fn read_attachment(path: &Path) -> Result<SinglePart, TransportError> {
    let body = tokio::fs::read(path)
        .await
        .map_err(|source| TransportError::Attachment {
            path: path.display().to_string(),
            source,
        })?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let content_type = ContentType::parse(mime.essence_str())
        .or_else(|_| ContentType::parse("application/octet-stream"))
        .map_err(|e| TransportError::Other(format!("invalid content type: {}", e)))?;

    Ok(Attachment::new(filename).body(body, content_type))
}

pub fn parse_mailbox(value: &str) -> Result<Mailbox, TransportError> {
    value
        .trim()
        .parse::<Mailbox>()
        .map_err(|source| TransportError::Address {
            value: value.to_string(),
            source,
        })
}

/// Split a `;`- or `,`-separated recipient list. Blank input yields no mailboxes.
pub fn parse_mailbox_list(value: Option<&str>) -> Result<Vec<Mailbox>, TransportError> {
    value
        .unwrap_or("")
        .split([';', ','])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_mailbox)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
