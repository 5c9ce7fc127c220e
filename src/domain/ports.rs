use crate::domain::model::MailMessage;
use crate::utils::error::TransportError;
use async_trait::async_trait;

/// Factory for scoped mail sessions. One session backs exactly one dispatch run.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn open(&self) -> std::result::Result<Box<dyn MailSession>, TransportError>;
}

/// A live login/connection to the mail client.
///
/// `close` is called once after the last row. When a run is aborted or
/// panics the session is dropped without `close`, so its resources must be
/// owned by fields that release themselves.
#[async_trait]
pub trait MailSession: Send {
    /// Preview or send `message` according to `message.mode`.
    async fn deliver(&mut self, message: &MailMessage) -> std::result::Result<(), TransportError>;

    async fn close(&mut self) -> std::result::Result<(), TransportError>;
}
