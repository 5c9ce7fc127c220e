use crate::core::dispatch::{spawn_run, ActiveRun, DispatchHandle, DispatchOptions};
use crate::core::loader;
use crate::domain::model::{SendMode, Table};
use crate::domain::ports::MailTransport;
use crate::utils::error::{MailerError, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Caller-owned context for one front end: the selected file, the loaded
/// table, and the single active dispatch run.
pub struct DisputeSession {
    transport: Arc<dyn MailTransport>,
    options: DispatchOptions,
    source: Option<PathBuf>,
    table: Option<Arc<Table>>,
    dispatching: Arc<AtomicBool>,
}

impl DisputeSession {
    pub fn new(transport: Arc<dyn MailTransport>, options: DispatchOptions) -> Self {
        Self {
            transport,
            options,
            source: None,
            table: None,
            dispatching: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Choosing a different file discards the table loaded from the previous one.
    pub fn select_file(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        if self.source.as_ref() != Some(&path) {
            self.table = None;
        }
        tracing::info!("Selected file: {}", path.display());
        self.source = Some(path);
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Sheet names of the selected workbook.
    pub fn inspect(&self) -> Result<Vec<String>> {
        let path = self.require_source()?;
        let sheets = loader::inspect_workbook(path)?;
        tracing::info!("✅ File is readable. Sheets: {}", sheets.join(", "));
        Ok(sheets)
    }

    /// Load the selected workbook. Any earlier table is dropped first, so a failed load leaves none.
    pub fn load(&mut self) -> Result<&Table> {
        self.table = None;
        let path = self.require_source()?.to_path_buf();
        let table = Arc::new(loader::load_table(&path)?);
        Ok(&**self.table.insert(table))
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_deref()
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatching.load(Ordering::Acquire)
    }

    /// Start a background run over the loaded table. Only one run may be active at a time.
    pub fn start_dispatch(&self, mode: SendMode) -> Result<DispatchHandle> {
        let table = match &self.table {
            Some(table) => Arc::clone(table),
            None => return Err(MailerError::NoData),
        };

        let guard = ActiveRun::acquire(&self.dispatching).ok_or(MailerError::DispatchInProgress)?;
        let options = self.options.clone().with_mode(mode);

        // precondition failures drop the guard here, before any task exists
        spawn_run(Arc::clone(&self.transport), table, options, Some(guard))
    }

    fn require_source(&self) -> Result<&Path> {
        self.source.as_deref().ok_or(MailerError::NoFileSelected)
    }
}
