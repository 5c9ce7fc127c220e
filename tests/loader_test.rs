mod common;

use anyhow::Result;
use common::{dispute_row, write_workbook};
use dispute_mailer::domain::schema::EXPECTED_COLUMNS;
use dispute_mailer::utils::error::ColumnDiff;
use dispute_mailer::{inspect_workbook, load_table, MailerError};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use tempfile::TempDir;

#[test]
fn test_valid_workbook_loads_every_data_row() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("disputes.xlsx");
    let rows = vec![
        dispute_row("P-1", "a@x.com"),
        dispute_row("P-2", ""),
        dispute_row("P-3", "b@x.com"),
    ];
    write_workbook(&path, "Emails", &EXPECTED_COLUMNS, &rows)?;

    let table = load_table(&path)?;

    assert_eq!(table.len(), 3);
    assert_eq!(table.columns().len(), 12);
    assert_eq!(table.value(0, "Project ID"), "P-1");
    assert_eq!(table.value(1, "Email-To"), "");
    assert_eq!(table.value(2, "Submitter"), "Dana Ruiz");
    Ok(())
}

#[test]
fn test_header_only_sheet_is_empty_table() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("empty.xlsx");
    write_workbook(&path, "Emails", &EXPECTED_COLUMNS, &[])?;

    let table = load_table(&path)?;

    assert!(table.is_empty());
    assert_eq!(table.columns().len(), 12);
    Ok(())
}

#[test]
fn test_wrong_column_name_reports_diff() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("renamed.xlsx");
    let mut header = EXPECTED_COLUMNS;
    header[3] = "Wrong Name";
    write_workbook(&path, "Emails", &header, &[dispute_row("P-1", "a@x.com")])?;

    let err = load_table(&path).unwrap_err();

    match err {
        MailerError::SchemaMismatch(diff) => {
            assert_eq!(
                diff.columns,
                vec![ColumnDiff {
                    position: 4,
                    expected: "Requested Outcome".to_string(),
                    actual: "Wrong Name".to_string(),
                }]
            );
            assert_eq!(diff.count_mismatch, None);
        }
        other => panic!("expected SchemaMismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_padded_headers_are_accepted() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("padded.xlsx");
    let padded: Vec<String> = EXPECTED_COLUMNS.iter().map(|c| format!(" {c} ")).collect();
    let padded: Vec<&str> = padded.iter().map(String::as_str).collect();
    write_workbook(&path, "Emails", &padded, &[dispute_row("P-1", "a@x.com")])?;

    let table = load_table(&path)?;
    assert_eq!(table.len(), 1);
    Ok(())
}

#[test]
fn test_missing_last_column_reports_count() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("short.xlsx");
    write_workbook(&path, "Emails", &EXPECTED_COLUMNS[..11], &[])?;

    match load_table(&path).unwrap_err() {
        MailerError::SchemaMismatch(diff) => {
            assert_eq!(diff.count_mismatch, Some((12, 11)));
        }
        other => panic!("expected SchemaMismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_missing_sheet_lists_available_sheets() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("wrong_sheet.xlsx");
    write_workbook(&path, "Results", &EXPECTED_COLUMNS, &[])?;

    match load_table(&path).unwrap_err() {
        MailerError::MissingSheet { sheet, available } => {
            assert_eq!(sheet, "Emails");
            assert_eq!(available, vec!["Results".to_string()]);
        }
        other => panic!("expected MissingSheet, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_missing_file_and_bad_format() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let missing = temp_dir.path().join("nope.xlsx");
    assert!(matches!(
        load_table(&missing),
        Err(MailerError::FileNotFound { .. })
    ));

    let garbage = temp_dir.path().join("garbage.xlsx");
    std::fs::write(&garbage, b"this is not a zip archive")?;
    assert!(matches!(
        load_table(&garbage),
        Err(MailerError::UnreadableFormat { .. })
    ));
    assert!(matches!(
        inspect_workbook(&garbage),
        Err(MailerError::UnreadableFormat { .. })
    ));
    Ok(())
}

#[test]
fn test_inspect_lists_sheets() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("disputes.xlsx");
    write_workbook(&path, "Emails", &EXPECTED_COLUMNS, &[])?;

    assert_eq!(inspect_workbook(&path)?, vec!["Emails".to_string()]);
    Ok(())
}

#[test]
fn test_numeric_and_date_cells_render_as_text() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("typed.xlsx");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Emails")?;
    for (col, name) in EXPECTED_COLUMNS.iter().enumerate() {
        worksheet.write_string(0, 2 + col as u16, *name)?;
    }
    let date_format = Format::new().set_num_format("mm/dd/yyyy");
    worksheet.write_number(1, 3, 40123)?;
    worksheet.write_datetime_with_format(1, 4, &ExcelDateTime::from_ymd(2024, 3, 7)?, &date_format)?;
    worksheet.write_string(1, 13, "a@x.com")?;
    workbook.save(&path)?;

    let table = load_table(&path)?;

    assert_eq!(table.value(0, "Project ID"), "40123");
    assert_eq!(table.value(0, "Appt Date"), "03/07/2024");
    assert_eq!(table.value(0, "Email-To"), "a@x.com");
    Ok(())
}
