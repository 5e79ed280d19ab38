use std::string::FromUtf8Error;

/// Tabular row that can be written to an export.
pub trait CsvRow {
    const HEADERS: &'static [&'static str];

    /// Cell values in `HEADERS` order.
    fn fields(&self) -> Vec<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer flush failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv output was not utf-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Header plus one line per row, every field quoted, lines joined by `\n`.
pub fn render_csv<R: CsvRow>(rows: &[R]) -> Result<String, ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(R::HEADERS)?;
    for row in rows {
        writer.write_record(row.fields())?;
    }

    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    let mut text = String::from_utf8(bytes)?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Naira display string with thousands separators, e.g. `₦12,900`.
pub fn format_currency(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("\u{20a6}{grouped}")
}
