//! Durable, append-only completion log.
//!
//! A single long-lived handle sits behind one mutex. Each record is formatted
//! and fully written (and flushed) while the mutex is held, so concurrent cooks
//! can never interleave bytes. The header goes out when the log is created,
//! the footer when it is finalized; both are timestamped in local time.
//!
//! Two on-disk layouts are supported: the human `text` layout
//!
//! ```text
//! === LOG DE PEDIDOS ===
//! Inicio: 2026-10-15 12:00:00
//!
//! [2026-10-15 12:00:02] Cocinero-1 completó Pedido #1: Paella Valenciana
//!
//! Fin: 2026-10-15 12:00:04
//! ```
//!
//! and `json`, one tagged object per line. [`read_log`] parses either.
//! In the text layout a description's backslashes and line breaks are
//! escaped (`\\`, `\n`, `\r`) so a record never spans two lines.

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{KitchenError, LogStage, Result};
use crate::order::WorkItem;

const TITLE: &str = "=== LOG DE PEDIDOS ===";
const HEADER_PREFIX: &str = "Inicio: ";
const FOOTER_PREFIX: &str = "Fin: ";
const COMPLETED_MARKER: &str = " completó Pedido #";

/// Timestamp layout used in both log formats.
///
/// Stamps are local wall-clock time with no offset. If the clock steps
/// back during a run (a daylight-saving fallback, an NTP correction) a
/// record can carry a time earlier than the header.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// On-disk layout of the completion log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Storage behind a [`CompletionLog`].
///
/// `sync` is called once at finalize to push the footer to durable storage.
pub trait LogMedium: Write + Send {
    fn sync(&mut self) -> io::Result<()>;
}

impl LogMedium for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

impl LogMedium for Vec<u8> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One completed order as written to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    pub timestamp: NaiveDateTime,
    pub worker_id: String,
    pub item: WorkItem,
}

/// Wire shape of a JSON log line.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum JsonEntry {
    Header {
        #[serde(with = "timestamp")]
        timestamp: NaiveDateTime,
    },
    Completion {
        #[serde(with = "timestamp")]
        timestamp: NaiveDateTime,
        worker_id: String,
        order_id: u64,
        description: String,
    },
    Footer {
        #[serde(with = "timestamp")]
        timestamp: NaiveDateTime,
    },
}

mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

fn stamp(ts: &NaiveDateTime) -> impl fmt::Display + '_ {
    ts.format(TIMESTAMP_FORMAT)
}

impl LogFormat {
    fn header(self, ts: &NaiveDateTime) -> Result<String> {
        Ok(match self {
            LogFormat::Text => format!("{TITLE}\n{HEADER_PREFIX}{}\n\n", stamp(ts)),
            LogFormat::Json => json_line(&JsonEntry::Header { timestamp: *ts })?,
        })
    }

    fn record(self, record: &CompletionRecord) -> Result<String> {
        Ok(match self {
            LogFormat::Text => format!(
                "[{}] {}{}{}: {}\n",
                stamp(&record.timestamp),
                record.worker_id,
                COMPLETED_MARKER,
                record.item.id(),
                escape_description(record.item.description())
            ),
            LogFormat::Json => json_line(&JsonEntry::Completion {
                timestamp: record.timestamp,
                worker_id: record.worker_id.clone(),
                order_id: record.item.id(),
                description: record.item.description().to_string(),
            })?,
        })
    }

    fn footer(self, ts: &NaiveDateTime) -> Result<String> {
        Ok(match self {
            LogFormat::Text => format!("\n{FOOTER_PREFIX}{}\n", stamp(ts)),
            LogFormat::Json => json_line(&JsonEntry::Footer { timestamp: *ts })?,
        })
    }
}

fn json_line(entry: &JsonEntry) -> Result<String> {
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    Ok(line)
}

struct LogState<W> {
    medium: W,
    records: usize,
    closed: bool,
}

/// Append-only completion log shared by every cook.
pub struct CompletionLog<W: LogMedium = File> {
    state: Mutex<LogState<W>>,
    format: LogFormat,
    started_at: NaiveDateTime,
}

impl CompletionLog<File> {
    /// Creates (or truncates) the log file at `path` and writes the header.
    pub fn create(path: &Path, format: LogFormat) -> Result<Self> {
        let file = File::create(path).map_err(KitchenError::log_write(LogStage::Initialize))?;
        info!(path = %path.display(), %format, "completion log opened");
        Self::from_writer(file, format)
    }
}

impl<W: LogMedium> CompletionLog<W> {
    /// Wraps an already-open medium and writes the header to it.
    pub fn from_writer(mut medium: W, format: LogFormat) -> Result<Self> {
        let started_at = now();
        let header = format.header(&started_at)?;
        medium
            .write_all(header.as_bytes())
            .and_then(|()| medium.flush())
            .map_err(KitchenError::log_write(LogStage::Initialize))?;

        Ok(Self {
            state: Mutex::new(LogState {
                medium,
                records: 0,
                closed: false,
            }),
            format,
            started_at,
        })
    }

    /// Writes one completion record.
    ///
    /// The timestamp is taken after the lock is acquired, so record order in
    /// the medium always agrees with timestamp order.
    pub fn append(&self, worker_id: &str, item: &WorkItem) -> Result<CompletionRecord> {
        let mut state = self.guard()?;
        if state.closed {
            return Err(KitchenError::LogClosed);
        }

        let record = CompletionRecord {
            timestamp: now(),
            worker_id: worker_id.to_string(),
            item: item.clone(),
        };
        let line = self.format.record(&record)?;
        state
            .medium
            .write_all(line.as_bytes())
            .and_then(|()| state.medium.flush())
            .map_err(KitchenError::log_write(LogStage::Append))?;
        state.records += 1;

        debug!(worker = worker_id, order_id = item.id(), "completion recorded");
        Ok(record)
    }

    /// Writes the footer, syncs the medium and closes the log.
    ///
    /// Returns the footer timestamp. A second call fails with
    /// [`KitchenError::LogClosed`].
    pub fn finalize(&self) -> Result<NaiveDateTime> {
        let mut state = self.guard()?;
        if state.closed {
            return Err(KitchenError::LogClosed);
        }

        let finished_at = now();
        let footer = self.format.footer(&finished_at)?;
        state
            .medium
            .write_all(footer.as_bytes())
            .and_then(|()| state.medium.flush())
            .and_then(|()| state.medium.sync())
            .map_err(KitchenError::log_write(LogStage::Finalize))?;
        state.closed = true;

        info!(records = state.records, "completion log finalized");
        Ok(finished_at)
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn started_at(&self) -> NaiveDateTime {
        self.started_at
    }

    pub fn record_count(&self) -> Result<usize> {
        Ok(self.guard()?.records)
    }

    pub fn is_closed(&self) -> Result<bool> {
        Ok(self.guard()?.closed)
    }

    /// Gives back the underlying medium.
    pub fn into_inner(self) -> Result<W> {
        self.state
            .into_inner()
            .map(|state| state.medium)
            .map_err(|e| KitchenError::LogCorruption(e.to_string()))
    }

    fn guard(&self) -> Result<MutexGuard<'_, LogState<W>>> {
        self.state
            .lock()
            .map_err(|e| KitchenError::LogCorruption(e.to_string()))
    }
}

/// A completion log read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLog {
    pub format: LogFormat,
    pub started_at: Option<NaiveDateTime>,
    pub records: Vec<CompletionRecord>,
    pub finished_at: Option<NaiveDateTime>,
}

impl ParsedLog {
    /// Structural problems found in the log, empty when it is well formed.
    ///
    /// Checks for a missing header or footer, duplicate order ids and
    /// timestamps that run backwards against the header/footer. The ordering
    /// checks trust the wall clock: a run that spans a clock step back is
    /// reported as out of order even though file order is still correct.
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.started_at.is_none() {
            issues.push("missing header".to_string());
        }
        if self.finished_at.is_none() {
            issues.push("missing footer (run aborted?)".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for record in &self.records {
            if !seen.insert(record.item.id()) {
                issues.push(format!("duplicate record for order #{}", record.item.id()));
            }
            if self.started_at.is_some_and(|start| record.timestamp < start) {
                issues.push(format!("order #{} completed before the header", record.item.id()));
            }
            if self.finished_at.is_some_and(|end| record.timestamp > end) {
                issues.push(format!("order #{} completed after the footer", record.item.id()));
            }
        }
        issues
    }

    pub fn is_complete(&self) -> bool {
        self.issues().is_empty()
    }
}

/// Reads a completion log from `path`, detecting its format.
pub fn read_log(path: &Path) -> Result<ParsedLog> {
    let contents = std::fs::read_to_string(path)?;
    parse_log(&contents)
}

/// Parses log contents in either format.
///
/// A line starting with `{` selects the JSON layout; anything else is read as
/// the text layout. Every non-blank line must be a header, record or footer.
pub fn parse_log(contents: &str) -> Result<ParsedLog> {
    let format = match contents.lines().map(str::trim).find(|l| !l.is_empty()) {
        Some(first) if first.starts_with('{') => LogFormat::Json,
        _ => LogFormat::Text,
    };

    let mut parsed = ParsedLog {
        format,
        started_at: None,
        records: Vec::new(),
        finished_at: None,
    };

    for (idx, line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let entry = match format {
            LogFormat::Text => parse_text_line(line),
            LogFormat::Json => parse_json_line(line),
        }
        .map_err(|reason| KitchenError::MalformedLog {
            line: line_no,
            reason,
        })?;

        let malformed = |reason: &str| KitchenError::MalformedLog {
            line: line_no,
            reason: reason.to_string(),
        };
        match entry {
            Line::Title => {}
            Line::Header(ts) => {
                if parsed.started_at.is_some() {
                    return Err(malformed("second header"));
                }
                parsed.started_at = Some(ts);
            }
            Line::Record(record) => {
                if parsed.finished_at.is_some() {
                    return Err(malformed("record after footer"));
                }
                parsed.records.push(record);
            }
            Line::Footer(ts) => {
                if parsed.finished_at.is_some() {
                    return Err(malformed("second footer"));
                }
                parsed.finished_at = Some(ts);
            }
        }
    }

    Ok(parsed)
}

enum Line {
    Title,
    Header(NaiveDateTime),
    Record(CompletionRecord),
    Footer(NaiveDateTime),
}

fn parse_ts(raw: &str) -> std::result::Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| format!("bad timestamp {raw:?}: {e}"))
}

fn parse_text_line(line: &str) -> std::result::Result<Line, String> {
    if line == TITLE {
        return Ok(Line::Title);
    }
    if let Some(rest) = line.strip_prefix(HEADER_PREFIX) {
        return parse_ts(rest).map(Line::Header);
    }
    if let Some(rest) = line.strip_prefix(FOOTER_PREFIX) {
        return parse_ts(rest).map(Line::Footer);
    }

    let rest = line
        .strip_prefix('[')
        .ok_or_else(|| format!("unrecognized line {line:?}"))?;
    let (ts, rest) = rest
        .split_once("] ")
        .ok_or_else(|| "record without closing timestamp bracket".to_string())?;
    let (worker_id, rest) = rest
        .split_once(COMPLETED_MARKER)
        .ok_or_else(|| "record without completion marker".to_string())?;
    let (id, description) = rest
        .split_once(": ")
        .ok_or_else(|| "record without order description".to_string())?;
    let id: u64 = id.parse().map_err(|e| format!("bad order id {id:?}: {e}"))?;
    let item = WorkItem::new(id, unescape_description(description)?).map_err(|e| e.to_string())?;

    Ok(Line::Record(CompletionRecord {
        timestamp: parse_ts(ts)?,
        worker_id: worker_id.to_string(),
        item,
    }))
}

// One record per line: line breaks and backslashes in a description are
// written as `\n`, `\r` and `\\`.
fn escape_description(description: &str) -> Cow<'_, str> {
    if !description.contains(['\\', '\n', '\r']) {
        return Cow::Borrowed(description);
    }
    let mut out = String::with_capacity(description.len() + 8);
    for c in description.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn unescape_description(escaped: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => return Err(format!("unknown escape \\{other} in description")),
            None => return Err("dangling backslash in description".to_string()),
        }
    }
    Ok(out)
}

fn parse_json_line(line: &str) -> std::result::Result<Line, String> {
    let entry: JsonEntry = serde_json::from_str(line).map_err(|e| e.to_string())?;
    Ok(match entry {
        JsonEntry::Header { timestamp } => Line::Header(timestamp),
        JsonEntry::Footer { timestamp } => Line::Footer(timestamp),
        JsonEntry::Completion {
            timestamp,
            worker_id,
            order_id,
            description,
        } => Line::Record(CompletionRecord {
            timestamp,
            worker_id,
            item: WorkItem::new(order_id, description).map_err(|e| e.to_string())?,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn item(id: u64, description: &str) -> WorkItem {
        WorkItem::new(id, description).unwrap()
    }

    fn contents(log: CompletionLog<Vec<u8>>) -> String {
        String::from_utf8(log.into_inner().unwrap()).unwrap()
    }

    /// Accepts `ok_writes` writes, then fails every write.
    struct FailingMedium {
        ok_writes: usize,
    }

    impl Write for FailingMedium {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.ok_writes == 0 {
                return Err(io::Error::other("disk full"));
            }
            self.ok_writes -= 1;
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogMedium for FailingMedium {
        fn sync(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn text_layout_has_header_records_footer() {
        let log = CompletionLog::from_writer(Vec::new(), LogFormat::Text).unwrap();
        log.append("Cocinero-1", &item(1, "Paella Valenciana")).unwrap();
        log.finalize().unwrap();

        let text = contents(log);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=== LOG DE PEDIDOS ===");
        assert!(lines[1].starts_with("Inicio: "));
        assert_eq!(lines[2], "");
        assert!(lines[3].ends_with("] Cocinero-1 completó Pedido #1: Paella Valenciana"));
        assert_eq!(lines[4], "");
        assert!(lines[5].starts_with("Fin: "));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn text_log_parses_back() {
        let log = CompletionLog::from_writer(Vec::new(), LogFormat::Text).unwrap();
        log.append("Cocinero-2", &item(4, "Pulpo a la Gallega")).unwrap();
        log.append("Cocinero-1", &item(2, "Gazpacho Andaluz")).unwrap();
        log.finalize().unwrap();

        let parsed = parse_log(&contents(log)).unwrap();
        assert_eq!(parsed.format, LogFormat::Text);
        assert!(parsed.is_complete(), "{:?}", parsed.issues());
        let ids: Vec<u64> = parsed.records.iter().map(|r| r.item.id()).collect();
        assert_eq!(ids, vec![4, 2]);
        assert_eq!(parsed.records[0].worker_id, "Cocinero-2");
        assert_eq!(parsed.records[0].item.description(), "Pulpo a la Gallega");
    }

    #[test]
    fn json_log_parses_back() {
        let log = CompletionLog::from_writer(Vec::new(), LogFormat::Json).unwrap();
        log.append("Cocinero-3", &item(9, "Crema Catalana")).unwrap();
        log.finalize().unwrap();

        let text = contents(log);
        assert!(text.lines().next().unwrap().contains(r#""kind":"header""#));

        let parsed = parse_log(&text).unwrap();
        assert_eq!(parsed.format, LogFormat::Json);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].item, item(9, "Crema Catalana"));
        assert!(parsed.is_complete());
    }

    #[test]
    fn header_and_footer_bracket_records() {
        let log = CompletionLog::from_writer(Vec::new(), LogFormat::Text).unwrap();
        let record = log.append("Cocinero-1", &item(1, "Marmitako")).unwrap();
        let finished = log.finalize().unwrap();

        assert!(log.started_at() <= record.timestamp);
        assert!(record.timestamp <= finished);
    }

    #[test]
    fn closed_log_rejects_appends_and_second_finalize() {
        let log = CompletionLog::from_writer(Vec::new(), LogFormat::Text).unwrap();
        log.finalize().unwrap();

        assert!(log.is_closed().unwrap());
        assert!(matches!(
            log.append("Cocinero-1", &item(1, "Migas")),
            Err(KitchenError::LogClosed)
        ));
        assert!(matches!(log.finalize(), Err(KitchenError::LogClosed)));
    }

    #[test]
    fn failures_name_their_stage() {
        let err = CompletionLog::from_writer(FailingMedium { ok_writes: 0 }, LogFormat::Text)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            KitchenError::LogWrite {
                stage: LogStage::Initialize,
                ..
            }
        ));

        let log = CompletionLog::from_writer(FailingMedium { ok_writes: 1 }, LogFormat::Text)
            .unwrap();
        let err = log.append("Cocinero-1", &item(1, "Pisto")).unwrap_err();
        assert!(matches!(
            err,
            KitchenError::LogWrite {
                stage: LogStage::Append,
                ..
            }
        ));
        assert_eq!(log.record_count().unwrap(), 0);

        let err = log.finalize().unwrap_err();
        assert!(matches!(
            err,
            KitchenError::LogWrite {
                stage: LogStage::Finalize,
                ..
            }
        ));
    }

    #[test]
    fn create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log_pedidos.txt");
        std::fs::write(&path, "stale content from a previous run\n").unwrap();

        let log = CompletionLog::create(&path, LogFormat::Text).unwrap();
        log.finalize().unwrap();

        let parsed = read_log(&path).unwrap();
        assert!(parsed.records.is_empty());
        assert!(parsed.is_complete());
    }

    #[test]
    fn create_in_missing_directory_fails_at_initialize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/log.txt");

        let err = CompletionLog::create(&path, LogFormat::Text).err().unwrap();
        assert!(matches!(
            err,
            KitchenError::LogWrite {
                stage: LogStage::Initialize,
                ..
            }
        ));
    }

    #[test]
    fn concurrent_appends_stay_well_formed() {
        let log = Arc::new(CompletionLog::from_writer(Vec::new(), LogFormat::Text).unwrap());

        let handles: Vec<_> = (1..=8u64)
            .map(|w| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for n in 0..50u64 {
                        let id = w * 1000 + n;
                        let desc = format!("{} from cook {w}", "x".repeat(200));
                        log.append(&format!("Cocinero-{w}"), &item(id, &desc)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        log.finalize().unwrap();

        let log = Arc::into_inner(log).unwrap();
        let parsed = parse_log(&contents(log)).unwrap();
        assert_eq!(parsed.records.len(), 400);
        assert!(parsed.is_complete(), "{:?}", parsed.issues());
        for record in &parsed.records {
            let cook = record.item.id() / 1000;
            assert_eq!(record.worker_id, format!("Cocinero-{cook}"));
            assert!(record.item.description().ends_with(&format!("from cook {cook}")));
        }
    }

    #[test]
    fn parse_reports_line_of_garbage() {
        let text = "=== LOG DE PEDIDOS ===\nInicio: 2026-10-15 10:00:00\n\ngarbage here\n";
        let err = parse_log(text).unwrap_err();
        assert!(matches!(err, KitchenError::MalformedLog { line: 4, .. }));
    }

    #[test]
    fn issues_flag_duplicates_and_missing_footer() {
        let text = "\
=== LOG DE PEDIDOS ===
Inicio: 2026-10-15 10:00:00

[2026-10-15 10:00:02] Cocinero-1 completó Pedido #1: Paella
[2026-10-15 10:00:02] Cocinero-2 completó Pedido #1: Paella
";
        let parsed = parse_log(text).unwrap();
        let issues = parsed.issues();
        assert!(issues.iter().any(|i| i.contains("missing footer")));
        assert!(issues.iter().any(|i| i.contains("duplicate record for order #1")));
    }

    #[test]
    fn clock_step_back_is_reported_not_rejected() {
        // Daylight-saving fallback between the header and the first record.
        let text = "\
=== LOG DE PEDIDOS ===
Inicio: 2026-10-25 02:59:58

[2026-10-25 02:00:01] Cocinero-1 completó Pedido #1: Paella

Fin: 2026-10-25 02:00:03
";
        let parsed = parse_log(text).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(
            parsed.issues(),
            vec!["order #1 completed before the header".to_string()]
        );
    }

    #[test]
    fn multiline_descriptions_stay_on_one_line() {
        let log = CompletionLog::from_writer(Vec::new(), LogFormat::Text).unwrap();
        log.append("Cocinero-1", &item(1, "Paella\nFin: 2020-01-01 00:00:00")).unwrap();
        log.append("Cocinero-2", &item(2, "Tapas\r\nsegunda línea")).unwrap();
        log.append("Cocinero-1", &item(3, r"Tortilla C:\n\fuego")).unwrap();
        log.finalize().unwrap();

        let text = contents(log);
        let record_lines = text.lines().filter(|l| l.starts_with('[')).count();
        assert_eq!(record_lines, 3);
        assert!(!text.lines().any(|l| l.starts_with("Fin: 2020")));

        let parsed = parse_log(&text).unwrap();
        assert!(parsed.is_complete(), "{:?}", parsed.issues());
        assert_ne!(parsed.finished_at, Some(parse_ts("2020-01-01 00:00:00").unwrap()));
        let descriptions: Vec<&str> = parsed.records.iter().map(|r| r.item.description()).collect();
        assert_eq!(
            descriptions,
            vec![
                "Paella\nFin: 2020-01-01 00:00:00",
                "Tapas\r\nsegunda línea",
                r"Tortilla C:\n\fuego",
            ]
        );
    }

    #[test]
    fn stray_backslash_is_malformed() {
        for text in [
            r"[2026-10-15 10:00:02] Cocinero-1 completó Pedido #5: Sopa \q",
            r"[2026-10-15 10:00:02] Cocinero-1 completó Pedido #5: Sopa \",
        ] {
            assert!(parse_text_line(text).is_err(), "{text}");
        }
        let Line::Record(record) =
            parse_text_line(r"[2026-10-15 10:00:02] Cocinero-1 completó Pedido #5: Sopa \\n").unwrap()
        else {
            panic!("expected a record line");
        };
        assert_eq!(record.item.description(), r"Sopa \n");
    }

    #[test]
    fn description_may_contain_separator() {
        let text = "[2026-10-15 10:00:02] Cocinero-1 completó Pedido #5: Menú: sopa y pan";
        let Line::Record(record) = parse_text_line(text).unwrap() else {
            panic!("expected a record line");
        };
        assert_eq!(record.item.id(), 5);
        assert_eq!(record.item.description(), "Menú: sopa y pan");
    }
}
