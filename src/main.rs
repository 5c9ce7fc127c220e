use clap::Parser;
use dispute_mailer::config::Command;
use dispute_mailer::domain::schema::EXPECTED_SHEET;
use dispute_mailer::utils::error::ErrorSeverity;
use dispute_mailer::utils::{logger, validation::Validate};
use dispute_mailer::{
    inspect_workbook, load_table, CliConfig, DispatchEvent, DisputeSession, LettreTransport,
    MailerConfig, MailerError, Table,
};
use std::sync::Arc;

const MAX_PREVIEW_WIDTH: usize = 40;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting dispute-mailer");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證參數
    if let Err(e) = cli.validate() {
        exit_with(&e);
    }

    if let Err(e) = run(&cli).await {
        exit_with(&e);
    }
}

async fn run(cli: &CliConfig) -> Result<(), MailerError> {
    match &cli.command {
        Command::Inspect { file } => {
            let sheets = inspect_workbook(file)?;
            println!("✅ File is readable. Sheets: {}", sheets.join(", "));
        }
        Command::Load { file, limit } => {
            let table = load_table(file)?;
            println!("✅ Loaded {} rows from '{}'", table.len(), EXPECTED_SHEET);
            print_table(&table, *limit);
        }
        Command::Send { file, json, .. } => {
            tracing::info!("📁 Loading configuration from: {}", cli.config.display());
            let config = MailerConfig::from_file(&cli.config)?;

            let mode = cli.command.mode_override().unwrap_or_else(|| config.mode());
            config.validate_for_mode(mode)?;

            let transport = Arc::new(LettreTransport::new(config.transport_config()));
            let mut session = DisputeSession::new(transport, config.dispatch_options());
            session.select_file(file);

            let rows = session.load()?.len();
            println!("✅ Loaded {} rows from '{}'", rows, EXPECTED_SHEET);

            let mut handle = session.start_dispatch(mode)?;
            while let Some(event) = handle.next_event().await {
                match &event {
                    DispatchEvent::Started { .. } => println!("\n{}\n", event),
                    DispatchEvent::Finished(_) => println!("\n{}", event),
                    _ => println!("{}", event),
                }
            }

            let summary = handle.wait().await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }
    }

    Ok(())
}

fn exit_with(e: &MailerError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}

/// Fixed-width dump of the first `limit` rows, widths sized to content.
fn print_table(table: &Table, limit: usize) {
    let shown = &table.rows()[..limit.min(table.len())];

    let widths: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            shown
                .iter()
                .filter_map(|row| row.cells.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_PREVIEW_WIDTH)
        })
        .collect();

    println!("{}", format_line(table.columns().iter().map(String::as_str), &widths));
    println!(
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    );
    for row in shown {
        let cells = (0..widths.len()).map(|i| row.cells.get(i).map(String::as_str).unwrap_or(""));
        println!("{}", format_line(cells, &widths));
    }

    if table.len() > shown.len() {
        println!("… {} more rows", table.len() - shown.len());
    }
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", clip(cell, *width), width = *width))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
        clipped.push('…');
        clipped
    }
}
