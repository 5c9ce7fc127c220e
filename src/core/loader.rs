use crate::domain::model::{Row, Table};
use crate::domain::schema::{column_range_label, EXPECTED_COLUMNS, EXPECTED_SHEET, FIRST_COLUMN};
use crate::utils::error::{ColumnDiff, MailerError, Result, SchemaDiff};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::{NaiveDateTime, Timelike};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

// Windows ERROR_SHARING_VIOLATION, raised while Excel holds the file open.
const SHARING_VIOLATION: i32 = 32;

/// Confirm `path` is an openable workbook and list its sheets.
pub fn inspect_workbook(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let workbook = open_workbook(path)?;
    let sheets = workbook.sheet_names();
    tracing::debug!("{} has sheets: {:?}", path.display(), sheets);
    Ok(sheets)
}

/// Read columns C:N of the `Emails` sheet and validate the header against the fixed schema.
pub fn load_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let mut workbook = open_workbook(path)?;

    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == EXPECTED_SHEET) {
        tracing::warn!("❌ Missing sheet '{}' in {}", EXPECTED_SHEET, path.display());
        return Err(MailerError::MissingSheet {
            sheet: EXPECTED_SHEET.to_string(),
            available,
        });
    }

    let range = workbook
        .worksheet_range(EXPECTED_SHEET)
        .map_err(|e| MailerError::UnreadableFormat {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let table = table_from_range(&range)?;
    tracing::info!(
        "✅ Loaded {} rows from '{}' ({})",
        table.len(),
        EXPECTED_SHEET,
        column_range_label()
    );
    Ok(table)
}

fn open_workbook(path: &Path) -> Result<Sheets<BufReader<File>>> {
    let display = path.display().to_string();

    if !path.exists() {
        return Err(MailerError::FileNotFound { path: display });
    }

    // calamine buries io errors inside format-specific variants, so probe the
    // handle first to tell a locked file apart from a corrupt one.
    if let Err(e) = File::open(path) {
        return Err(classify_io_error(display, e));
    }

    open_workbook_auto(path).map_err(|e| MailerError::UnreadableFormat {
        path: display,
        reason: e.to_string(),
    })
}

fn classify_io_error(path: String, err: std::io::Error) -> MailerError {
    let locked = cfg!(windows) && err.raw_os_error() == Some(SHARING_VIOLATION);
    if err.kind() == ErrorKind::PermissionDenied || locked {
        MailerError::PermissionDenied { path }
    } else if err.kind() == ErrorKind::NotFound {
        MailerError::FileNotFound { path }
    } else {
        MailerError::IoError(err)
    }
}

/// Build a table from a sheet's used range. The first used row is the header.
pub fn table_from_range(range: &Range<Data>) -> Result<Table> {
    let (header_row, last_row, last_col) = match (range.start(), range.end()) {
        (Some((first_row, _)), Some((end_row, end_col))) => (first_row, end_row, end_col),
        _ => return Err(MailerError::SchemaMismatch(compare_headers(&[]))),
    };

    let wanted_last = FIRST_COLUMN + EXPECTED_COLUMNS.len() as u32 - 1;
    let columns: Vec<u32> = if last_col < FIRST_COLUMN {
        Vec::new()
    } else {
        (FIRST_COLUMN..=wanted_last.min(last_col)).collect()
    };

    let header: Vec<String> = columns
        .iter()
        .map(|&col| cell_text(range.get_value((header_row, col))).trim().to_string())
        .collect();

    let diff = compare_headers(&header);
    if !diff.is_empty() {
        tracing::warn!("❌ {}", diff);
        return Err(MailerError::SchemaMismatch(diff));
    }

    let mut rows: Vec<Row> = (header_row + 1..=last_row)
        .map(|row| {
            Row::new(
                columns
                    .iter()
                    .map(|&col| cell_text(range.get_value((row, col))))
                    .collect(),
            )
        })
        .collect();

    // 去除尾端空白列
    while rows.last().is_some_and(Row::is_blank) {
        rows.pop();
    }

    Ok(Table::new(header, rows))
}

/// Position-by-position comparison against the schema (positions are 1-based).
pub fn compare_headers(actual: &[String]) -> SchemaDiff {
    let columns = EXPECTED_COLUMNS
        .iter()
        .zip(actual)
        .enumerate()
        .filter(|(_, (expected, got))| **expected != got.as_str())
        .map(|(i, (expected, got))| ColumnDiff {
            position: i + 1,
            expected: expected.to_string(),
            actual: got.clone(),
        })
        .collect();

    let count_mismatch =
        (actual.len() != EXPECTED_COLUMNS.len()).then_some((EXPECTED_COLUMNS.len(), actual.len()));

    SchemaDiff {
        columns,
        count_mismatch,
    }
}

/// Render one cell as the text the templates embed.
pub fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.clone(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Float(f)) => format_float(*f),
        Some(Data::Bool(b)) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Some(Data::DateTime(dt)) => {
            if dt.is_duration() {
                format_float(dt.as_f64())
            } else {
                dt.as_datetime()
                    .map(format_datetime)
                    .unwrap_or_else(|| format_float(dt.as_f64()))
            }
        }
        Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => s.clone(),
        Some(Data::Error(e)) => e.to_string(),
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn format_datetime(value: NaiveDateTime) -> String {
    if value.hour() == 0 && value.minute() == 0 && value.second() == 0 {
        value.format("%m/%d/%Y").to_string()
    } else {
        value.format("%m/%d/%Y %H:%M").to_string()
    }
}
