use crate::core::render::{render_body, render_subject};
use crate::domain::model::{
    DispatchOutcome, DispatchSummary, MailMessage, RowReport, RowView, SendMode, Table,
};
use crate::domain::ports::{MailSession, MailTransport};
use crate::domain::schema::RECIPIENT_COLUMN;
use crate::utils::error::{MailerError, Result};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Per-run settings shared by every message of the run.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    pub mode: SendMode,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub reply_to: Option<String>,
    pub on_behalf_of: Option<String>,
    pub attachments: Vec<PathBuf>,
}

impl DispatchOptions {
    pub fn with_mode(mut self, mode: SendMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Ordered progress stream of one run. Every event renders as one log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum DispatchEvent {
    Started { total: usize, mode: SendMode },
    Row(RowReport),
    Aborted { reason: String },
    Finished(DispatchSummary),
}

impl fmt::Display for DispatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchEvent::Started { total, mode } => {
                write!(f, "[Sending…] {} rows in {} mode", total, mode)
            }
            DispatchEvent::Row(report) => write!(f, "{}", report),
            DispatchEvent::Aborted { reason } => write!(f, "❌ Error: {}", reason),
            DispatchEvent::Finished(summary) => write!(f, "{}", summary),
        }
    }
}

/// Caller side of a running dispatch.
#[derive(Debug)]
pub struct DispatchHandle {
    events: mpsc::UnboundedReceiver<DispatchEvent>,
    task: JoinHandle<Result<DispatchSummary>>,
}

impl DispatchHandle {
    /// Next event in row order; `None` once the run has ended and the stream is drained.
    pub async fn next_event(&mut self) -> Option<DispatchEvent> {
        self.events.recv().await
    }

    /// Non-blocking poll for front ends that redraw on a timer.
    pub fn try_next_event(&mut self) -> Option<DispatchEvent> {
        self.events.try_recv().ok()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the run between rows. The transport session is released when the task is dropped.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Wait for the run to end, draining any events not yet read.
    pub async fn wait(mut self) -> Result<DispatchSummary> {
        while self.events.recv().await.is_some() {}

        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(MailerError::DispatchAborted {
                reason: "run was cancelled".to_string(),
            }),
            Err(e) => Err(MailerError::DispatchAborted {
                reason: e.to_string(),
            }),
        }
    }

    /// Collect every remaining event, then the final result.
    pub async fn collect(mut self) -> (Vec<DispatchEvent>, Result<DispatchSummary>) {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        (events, self.wait().await)
    }
}

/// Clears the owning session's "dispatching" flag when the run ends, however it ends.
pub(crate) struct ActiveRun(Arc<AtomicBool>);

impl ActiveRun {
    /// `None` when a run already holds the flag.
    pub(crate) fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fail fast, before any task or transport call, when a table cannot be dispatched.
pub fn check_preconditions(table: &Table) -> Result<()> {
    if table.is_empty() {
        return Err(MailerError::NoData);
    }
    if !table.has_column(RECIPIENT_COLUMN) {
        return Err(MailerError::MissingRecipientColumn {
            column: RECIPIENT_COLUMN.to_string(),
        });
    }
    Ok(())
}

/// Start a background run over `table`. Must be called inside a Tokio runtime.
pub fn start_dispatch(
    transport: Arc<dyn MailTransport>,
    table: Arc<Table>,
    options: DispatchOptions,
) -> Result<DispatchHandle> {
    spawn_run(transport, table, options, None)
}

pub(crate) fn spawn_run(
    transport: Arc<dyn MailTransport>,
    table: Arc<Table>,
    options: DispatchOptions,
    guard: Option<ActiveRun>,
) -> Result<DispatchHandle> {
    check_preconditions(&table)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_dispatch(transport, table, options, tx, guard));

    Ok(DispatchHandle { events: rx, task })
}

async fn run_dispatch(
    transport: Arc<dyn MailTransport>,
    table: Arc<Table>,
    options: DispatchOptions,
    events: mpsc::UnboundedSender<DispatchEvent>,
    guard: Option<ActiveRun>,
) -> Result<DispatchSummary> {
    // a dropped receiver only silences the log, the run keeps going
    let emit = |event: DispatchEvent| {
        let _ = events.send(event);
    };

    tracing::info!("📨 Dispatching {} rows ({} mode)", table.len(), options.mode);
    emit(DispatchEvent::Started {
        total: table.len(),
        mode: options.mode,
    });

    let mut session = match transport.open().await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("❌ Could not open mail session: {}", e);
            drop(guard);
            emit(DispatchEvent::Aborted {
                reason: e.to_string(),
            });
            return Err(MailerError::Transport(e));
        }
    };

    let mut summary = DispatchSummary::new(options.mode, table.len());

    for index in 0..table.len() {
        let Some(row) = table.record(index) else {
            continue;
        };
        let report = dispatch_row(session.as_mut(), &row, &options).await;
        summary.record(&report.outcome);
        emit(DispatchEvent::Row(report));
    }

    if let Err(e) = session.close().await {
        tracing::warn!("Mail session did not close cleanly: {}", e);
    }
    drop(session);
    drop(guard);

    tracing::info!(
        "✅ Dispatch finished: sent={} skipped={} failed={}",
        summary.sent,
        summary.skipped,
        summary.failed
    );
    emit(DispatchEvent::Finished(summary));

    Ok(summary)
}

async fn dispatch_row(
    session: &mut dyn MailSession,
    row: &RowView<'_>,
    options: &DispatchOptions,
) -> RowReport {
    let recipient = row.get(RECIPIENT_COLUMN).trim().to_string();

    if recipient.is_empty() {
        tracing::debug!("Row {} has no recipient, skipping", row.index());
        return RowReport {
            index: row.index(),
            recipient,
            mode: options.mode,
            outcome: DispatchOutcome::Skipped {
                reason: format!("missing {}", RECIPIENT_COLUMN),
            },
        };
    }

    let message = build_message(row, &recipient, options);

    let outcome = match session.deliver(&message).await {
        Ok(()) => {
            tracing::debug!("Row {} delivered to {}", row.index(), recipient);
            DispatchOutcome::Sent
        }
        Err(e) => {
            tracing::warn!("✗ Row {} → {} failed: {}", row.index(), recipient, e);
            DispatchOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    RowReport {
        index: row.index(),
        recipient,
        mode: options.mode,
        outcome,
    }
}

/// Render one row into the message handed to the transport.
pub fn build_message(row: &RowView<'_>, recipient: &str, options: &DispatchOptions) -> MailMessage {
    MailMessage {
        to: recipient.to_string(),
        subject: render_subject(row),
        html_body: render_body(row),
        cc: options.cc.clone(),
        bcc: options.bcc.clone(),
        reply_to: options.reply_to.clone(),
        on_behalf_of: options.on_behalf_of.clone(),
        attachments: options.attachments.clone(),
        mode: options.mode,
    }
}
