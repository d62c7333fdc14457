//! Daily-rotated quote persistence: JSON lines + CSV.
//!
//! Two independent writers behind one `save` entry point. Files are named
//! `YYYYMMDD_quotes.json` / `YYYYMMDD_quotes.csv` and rotated when the system
//! date changes, detected at save time. Both writers open in append mode so a
//! mid-day restart continues the day's files; the CSV header is written only
//! when the file is newly created.
//!
//! The CSV timestamp cell is the literal `="YYYY-MM-DD HH:MM:SS.mmm"` — an
//! output-contract requirement that stops spreadsheets from mangling the
//! value. The writer therefore runs with `QuoteStyle::Never` and every field is
//! pre-formatted here, including the double-quoted depth list columns.
//!
//! Write failures are logged and counted, never propagated: a failed quote
//! must not take the receive loop down, and the next save retries the file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use csv::QuoteStyle;
use nfcast_core::error::FeedError;
use nfcast_core::types::{Quote, QuoteLevel};
use tracing::{error, info};

/// CSV column order; must stay in lockstep with [`csv_fields`].
const CSV_HEADERS: &[&str] = &[
    "token",
    "symbol",
    "symbol_name",
    "expiry",
    "option_type",
    "strike",
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "ltp",
    "volume",
    "prev_close",
    "bid_prices",
    "bid_qtys",
    "bid_orders",
    "ask_prices",
    "ask_qtys",
    "ask_orders",
];

/// Daily-rotated JSON + CSV quote writer.
pub struct QuoteSink {
    json_dir: PathBuf,
    csv_dir: PathBuf,
    date: Option<NaiveDate>,
    json: Option<BufWriter<File>>,
    csv: Option<csv::Writer<File>>,
    write_errors: u64,
}

impl QuoteSink {
    /// Create the sink, ensuring both output directories exist.
    ///
    /// Files are opened lazily on the first save.
    pub fn new(json_dir: PathBuf, csv_dir: PathBuf) -> Result<Self, FeedError> {
        std::fs::create_dir_all(&json_dir)
            .map_err(|e| FeedError::Sink(format!("creating {}: {e}", json_dir.display())))?;
        std::fs::create_dir_all(&csv_dir)
            .map_err(|e| FeedError::Sink(format!("creating {}: {e}", csv_dir.display())))?;
        Ok(Self { json_dir, csv_dir, date: None, json: None, csv: None, write_errors: 0 })
    }

    /// Append one quote to both daily files, rotating on date change.
    pub fn save(&mut self, quote: &Quote, now: DateTime<Local>) {
        let today = now.date_naive();
        if self.date != Some(today) {
            self.rotate(today);
        }
        self.write_json(quote, today);
        self.write_csv(quote, today);
    }

    /// Sink write failures so far.
    pub fn write_errors(&self) -> u64 {
        self.write_errors
    }

    /// Flush both writers (shutdown path).
    pub fn flush(&mut self) {
        if let Some(writer) = self.json.as_mut()
            && let Err(e) = writer.flush()
        {
            error!("json sink flush failed: {e}");
        }
        if let Some(writer) = self.csv.as_mut()
            && let Err(e) = writer.flush()
        {
            error!("csv sink flush failed: {e}");
        }
    }

    /// Close the current day's files; the next save opens under `today`.
    fn rotate(&mut self, today: NaiveDate) {
        self.flush();
        self.json = None;
        self.csv = None;
        if let Some(previous) = self.date {
            info!("rotating output files: {previous} -> {today}");
        }
        self.date = Some(today);
    }

    fn write_json(&mut self, quote: &Quote, date: NaiveDate) {
        if self.json.is_none() {
            match open_daily(&self.json_dir, date, "quotes.json") {
                Ok((file, _fresh)) => self.json = Some(BufWriter::new(file)),
                Err(e) => {
                    error!("json sink open failed: {e}");
                    self.write_errors += 1;
                    return;
                }
            }
        }
        let Some(writer) = self.json.as_mut() else { return };

        let result = serde_json::to_string(quote)
            .map_err(std::io::Error::other)
            .and_then(|line| writeln!(writer, "{line}"))
            .and_then(|_| writer.flush());
        if let Err(e) = result {
            error!("json sink write failed: {e}");
            self.write_errors += 1;
            // Drop the writer so the next save reopens the file.
            self.json = None;
        }
    }

    fn write_csv(&mut self, quote: &Quote, date: NaiveDate) {
        if self.csv.is_none() {
            match self.open_csv(date) {
                Ok(writer) => self.csv = Some(writer),
                Err(e) => {
                    error!("csv sink open failed: {e}");
                    self.write_errors += 1;
                    return;
                }
            }
        }
        let Some(writer) = self.csv.as_mut() else { return };

        let result = writer
            .write_record(csv_fields(quote))
            .map_err(std::io::Error::other)
            .and_then(|_| writer.flush());
        if let Err(e) = result {
            error!("csv sink write failed: {e}");
            self.write_errors += 1;
            self.csv = None;
        }
    }

    /// Open the daily CSV, writing the header exactly once per file.
    fn open_csv(&self, date: NaiveDate) -> std::io::Result<csv::Writer<File>> {
        let (file, fresh) = open_daily(&self.csv_dir, date, "quotes.csv")?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Never)
            .from_writer(file);
        if fresh {
            writer.write_record(CSV_HEADERS).map_err(std::io::Error::other)?;
            writer.flush()?;
        }
        Ok(writer)
    }
}

/// Open `YYYYMMDD_<suffix>` under `dir` in append mode.
///
/// The boolean is true when the file was just created (length zero).
fn open_daily(dir: &Path, date: NaiveDate, suffix: &str) -> std::io::Result<(File, bool)> {
    let path = dir.join(format!("{}_{suffix}", date.format("%Y%m%d")));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let fresh = file.metadata()?.len() == 0;
    Ok((file, fresh))
}

/// Pre-formatted CSV fields in [`CSV_HEADERS`] order.
fn csv_fields(quote: &Quote) -> Vec<String> {
    vec![
        quote.token.to_string(),
        quote.symbol.clone(),
        quote.symbol_name.clone(),
        quote.expiry.clone(),
        quote.option_type.clone(),
        fmt_number(quote.strike),
        format!("=\"{}\"", quote.timestamp),
        fmt_price(quote.open),
        fmt_price(quote.high),
        fmt_price(quote.low),
        fmt_price(quote.close),
        fmt_price(quote.ltp),
        quote.volume.to_string(),
        fmt_price(quote.prev_close),
        level_list(&quote.bid_levels, |l| fmt_price(l.price)),
        level_list(&quote.bid_levels, |l| l.quantity.to_string()),
        level_list(&quote.bid_levels, |l| l.orders.to_string()),
        level_list(&quote.ask_levels, |l| fmt_price(l.price)),
        level_list(&quote.ask_levels, |l| l.quantity.to_string()),
        level_list(&quote.ask_levels, |l| l.orders.to_string()),
    ]
}

#[inline]
fn fmt_price(value: f64) -> String {
    format!("{value:.2}")
}

/// Integral values render without a decimal point (strike column).
fn fmt_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Comma-joined, double-quoted depth list; empty string when no depth.
fn level_list(levels: &[QuoteLevel], f: impl Fn(&QuoteLevel) -> String) -> String {
    if levels.is_empty() {
        return String::new();
    }
    let joined: Vec<String> = levels.iter().map(f).collect();
    format!("\"{}\"", joined.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn quote() -> Quote {
        Quote {
            token: 873870,
            symbol: "SENSEX".into(),
            symbol_name: "SENSEX27NOV2025_84100CE".into(),
            expiry: "27-NOV-2025".into(),
            option_type: "CE".into(),
            strike: 84100.0,
            timestamp: "2025-11-27 10:15:30.123".into(),
            open: 1185.00,
            high: 1210.00,
            low: 1180.00,
            close: 1207.75,
            ltp: 1207.75,
            volume: 480,
            prev_close: 1190.00,
            bid_levels: vec![
                QuoteLevel { price: 1207.00, quantity: 25, orders: 5 },
                QuoteLevel { price: 1206.50, quantity: 100, orders: 7 },
            ],
            ask_levels: vec![],
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, 10, 15, 30).unwrap()
    }

    #[test]
    fn writes_json_line_and_csv_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink =
            QuoteSink::new(dir.path().to_path_buf(), dir.path().to_path_buf()).unwrap();
        sink.save(&quote(), at(2025, 11, 27));
        assert_eq!(sink.write_errors(), 0);

        let json = std::fs::read_to_string(dir.path().join("20251127_quotes.json")).unwrap();
        assert_eq!(json.lines().count(), 1);
        let parsed: serde_json::Value = serde_json::from_str(json.lines().next().unwrap()).unwrap();
        assert_eq!(parsed["symbol_name"], "SENSEX27NOV2025_84100CE");
        assert_eq!(parsed["ltp"], 1207.75);

        let csv = std::fs::read_to_string(dir.path().join("20251127_quotes.csv")).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("token,symbol,symbol_name,"));
        let row = lines.next().unwrap();
        assert!(row.contains("873870,SENSEX,SENSEX27NOV2025_84100CE,"));
        // Spreadsheet-defeating timestamp cell, verbatim.
        assert!(row.contains("=\"2025-11-27 10:15:30.123\""));
        assert!(row.contains("\"1207.00,1206.50\""));
        assert!(row.contains("\"25,100\""));
        assert!(row.contains("\"5,7\""));
        // Empty ask side flattens to empty fields.
        assert!(row.ends_with(",,,"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn restart_appends_without_rewriting_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let json_dir = dir.path().to_path_buf();
        let csv_dir = dir.path().to_path_buf();

        let mut sink = QuoteSink::new(json_dir.clone(), csv_dir.clone()).unwrap();
        sink.save(&quote(), at(2025, 11, 27));
        drop(sink);

        let mut sink = QuoteSink::new(json_dir, csv_dir).unwrap();
        sink.save(&quote(), at(2025, 11, 27));

        let json = std::fs::read_to_string(dir.path().join("20251127_quotes.json")).unwrap();
        assert_eq!(json.lines().count(), 2);

        let csv = std::fs::read_to_string(dir.path().join("20251127_quotes.csv")).unwrap();
        let headers = csv.lines().filter(|l| l.starts_with("token,")).count();
        assert_eq!(headers, 1);
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn date_change_rotates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink =
            QuoteSink::new(dir.path().to_path_buf(), dir.path().to_path_buf()).unwrap();
        sink.save(&quote(), at(2025, 11, 27));
        sink.save(&quote(), at(2025, 11, 28));

        for day in ["20251127", "20251128"] {
            let json =
                std::fs::read_to_string(dir.path().join(format!("{day}_quotes.json"))).unwrap();
            assert_eq!(json.lines().count(), 1, "{day} json");
            let csv =
                std::fs::read_to_string(dir.path().join(format!("{day}_quotes.csv"))).unwrap();
            assert_eq!(csv.lines().count(), 2, "{day} csv");
            assert!(csv.starts_with("token,"));
        }
    }
}
