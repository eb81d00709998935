//! Durable per-model trial log
//!
//! One `;`-separated row per trial, appended and flushed as each trial
//! finishes, so a crash after N trials leaves N readable rows. Fields that
//! contain the delimiter, a quote or a line break are quoted with inner
//! quotes doubled. The matched and unmatched columns hold tool names
//! separated by `,`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::ElapsedMode;
use crate::error::{BenchError, Result};
use crate::map_persist_err;

pub const DELIMITER: char = ';';

const CUMULATIVE_COLUMN: &str = "cumulative_time_ms";
const PER_TRIAL_COLUMN: &str = "time_ms";
const NAME_SEPARATOR: char = ',';

/// One logged trial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialRow {
    pub trial_key: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Meaning depends on the log's [`ElapsedMode`]
    pub elapsed_ms: u64,
    pub match_percent: u32,
    pub matched: Vec<String>,
    pub unmatched: Vec<String>,
    pub diagnostic: String,
}

impl TrialRow {
    fn to_line(&self) -> String {
        let fields = [
            escape_field(&self.trial_key),
            self.input_tokens.to_string(),
            self.output_tokens.to_string(),
            self.elapsed_ms.to_string(),
            self.match_percent.to_string(),
            escape_field(&join_names(&self.matched)),
            escape_field(&join_names(&self.unmatched)),
            escape_field(&self.diagnostic),
        ];
        fields.join(&DELIMITER.to_string())
    }
}

pub fn header(mode: ElapsedMode) -> String {
    let elapsed = match mode {
        ElapsedMode::Cumulative => CUMULATIVE_COLUMN,
        ElapsedMode::PerTrial => PER_TRIAL_COLUMN,
    };
    [
        "trial_key",
        "input_tokens",
        "output_tokens",
        elapsed,
        "tool_called",
        "matched",
        "unmatched",
        "diagnostic",
    ]
    .join(&DELIMITER.to_string())
}

/// Append-only writer for one (model, catalog) log
pub struct TrialLog {
    path: PathBuf,
    writer: BufWriter<File>,
    rows: usize,
}

impl TrialLog {
    /// Replace any previous log at `path` with a fresh one holding only the header
    pub fn create(path: &Path, mode: ElapsedMode) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(map_persist_err!(parent))?;
        }

        if path.exists() {
            tracing::debug!(path = %path.display(), "removing stale log");
            fs::remove_file(path).map_err(map_persist_err!(path))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(map_persist_err!(path))?;

        let mut log = Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            rows: 0,
        };
        log.write_line(&header(mode))?;
        Ok(log)
    }

    pub fn append(&mut self, row: &TrialRow) -> Result<()> {
        self.write_line(&row.to_line())?;
        self.rows += 1;
        Ok(())
    }

    /// Rows appended so far, header excluded
    pub fn rows(&self) -> usize {
        self.rows
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line).map_err(map_persist_err!(&self.path))?;
        self.writer.flush().map_err(map_persist_err!(&self.path))
    }
}

/// Contents of a log read back from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedTrials {
    pub mode: ElapsedMode,
    pub rows: Vec<TrialRow>,
}

impl LoggedTrials {
    /// Elapsed time of each trial on its own, whatever the log's mode
    pub fn per_trial_elapsed_ms(&self) -> Vec<u64> {
        match self.mode {
            ElapsedMode::PerTrial => self.rows.iter().map(|r| r.elapsed_ms).collect(),
            ElapsedMode::Cumulative => {
                let mut previous = 0;
                self.rows
                    .iter()
                    .map(|r| {
                        let delta = r.elapsed_ms.saturating_sub(previous);
                        previous = r.elapsed_ms;
                        delta
                    })
                    .collect()
            }
        }
    }
}

pub fn read_log(path: &Path) -> Result<LoggedTrials> {
    if !path.exists() {
        return Err(BenchError::not_found("log", path.display()));
    }
    let content = fs::read_to_string(path)?;
    let mut records = split_records(&content).into_iter();

    let header = records
        .next()
        .ok_or_else(|| BenchError::invalid_value("log", format!("{} is empty", path.display())))?;
    let mode = match header.get(3).map(String::as_str) {
        Some(CUMULATIVE_COLUMN) => ElapsedMode::Cumulative,
        Some(PER_TRIAL_COLUMN) => ElapsedMode::PerTrial,
        _ => {
            return Err(BenchError::invalid_value(
                "log header",
                header.join(&DELIMITER.to_string()),
            ))
        }
    };

    let mut rows = Vec::new();
    for (i, fields) in records.enumerate() {
        rows.push(parse_row(i + 1, &fields)?);
    }

    Ok(LoggedTrials { mode, rows })
}

fn parse_row(line: usize, fields: &[String]) -> Result<TrialRow> {
    if fields.len() != 8 {
        return Err(BenchError::invalid_value(
            &format!("log row {}", line),
            format!("expected 8 fields, found {}", fields.len()),
        ));
    }

    fn number<T: std::str::FromStr>(line: usize, column: &str, value: &str) -> Result<T> {
        value.trim().parse().map_err(|_| {
            BenchError::invalid_value(&format!("log row {} {}", line, column), value)
        })
    }

    Ok(TrialRow {
        trial_key: fields[0].clone(),
        input_tokens: number(line, "input_tokens", &fields[1])?,
        output_tokens: number(line, "output_tokens", &fields[2])?,
        elapsed_ms: number(line, "elapsed", &fields[3])?,
        match_percent: number(line, "tool_called", &fields[4])?,
        matched: split_names(&fields[5]),
        unmatched: split_names(&fields[6]),
        diagnostic: fields[7].clone(),
    })
}

fn join_names(names: &[String]) -> String {
    names.join(&NAME_SEPARATOR.to_string())
}

fn split_names(field: &str) -> Vec<String> {
    field
        .split(NAME_SEPARATOR)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn escape_field(value: &str) -> String {
    if value.contains([DELIMITER, '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Split log text into records of unescaped fields
fn split_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            DELIMITER => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(key: &str, elapsed_ms: u64, diagnostic: &str) -> TrialRow {
        TrialRow {
            trial_key: key.to_string(),
            input_tokens: 10,
            output_tokens: 5,
            elapsed_ms,
            match_percent: 50,
            matched: vec!["get_weather".to_string()],
            unmatched: vec!["send_email".to_string()],
            diagnostic: diagnostic.to_string(),
        }
    }

    #[test]
    fn test_create_writes_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/log.csv");
        let log = TrialLog::create(&path, ElapsedMode::Cumulative).unwrap();
        assert_eq!(log.rows(), 0);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "trial_key;input_tokens;output_tokens;cumulative_time_ms;tool_called;matched;unmatched;diagnostic\n"
        );
    }

    #[test]
    fn test_rows_are_durable_as_appended() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let mut log = TrialLog::create(&path, ElapsedMode::PerTrial).unwrap();

        log.append(&row("addTwoNumbers", 100, "[ok]")).unwrap();
        // Readable before the writer is dropped
        let read = read_log(&path).unwrap();
        assert_eq!(read.rows.len(), 1);

        log.append(&row("getWeather", 300, "[ok]")).unwrap();
        let read = read_log(&path).unwrap();
        assert_eq!(read.mode, ElapsedMode::PerTrial);
        assert_eq!(read.rows.len(), 2);
        assert_eq!(read.rows[1].trial_key, "getWeather");
    }

    #[test]
    fn test_create_truncates_previous_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        {
            let mut log = TrialLog::create(&path, ElapsedMode::Cumulative).unwrap();
            log.append(&row("old", 1, "")).unwrap();
            log.append(&row("old2", 2, "")).unwrap();
        }

        let mut log = TrialLog::create(&path, ElapsedMode::Cumulative).unwrap();
        log.append(&row("new", 3, "")).unwrap();

        let read = read_log(&path).unwrap();
        assert_eq!(read.rows.len(), 1);
        assert_eq!(read.rows[0].trial_key, "new");
    }

    #[test]
    fn test_diagnostic_with_delimiters_survives() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let tricky = "a;b \"quoted\"\nsecond line";
        let mut log = TrialLog::create(&path, ElapsedMode::Cumulative).unwrap();
        log.append(&row("k", 5, tricky)).unwrap();
        log.append(&row("k2", 9, "")).unwrap();

        let read = read_log(&path).unwrap();
        assert_eq!(read.rows[0].diagnostic, tricky);
        assert_eq!(read.rows[1].diagnostic, "");
    }

    #[test]
    fn test_per_trial_elapsed_from_cumulative() {
        let logged = LoggedTrials {
            mode: ElapsedMode::Cumulative,
            rows: vec![row("a", 100, ""), row("b", 400, ""), row("c", 450, "")],
        };
        assert_eq!(logged.per_trial_elapsed_ms(), vec![100, 300, 50]);

        let logged = LoggedTrials {
            mode: ElapsedMode::PerTrial,
            rows: vec![row("a", 100, ""), row("b", 300, "")],
        };
        assert_eq!(logged.per_trial_elapsed_ms(), vec![100, 300]);
    }

    #[test]
    fn test_matched_and_unmatched_names_are_logged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let mut log = TrialLog::create(&path, ElapsedMode::Cumulative).unwrap();
        let mut full = row("addAndMail", 7, "");
        full.matched = vec!["add_two_numbers".to_string(), "send_email".to_string()];
        full.unmatched = Vec::new();
        log.append(&full).unwrap();
        log.append(&row("getWeatherSendEmail", 9, "")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[1], "addAndMail;10;5;7;50;add_two_numbers,send_email;;");
        assert_eq!(lines[2], "getWeatherSendEmail;10;5;9;50;get_weather;send_email;");

        let read = read_log(&path).unwrap();
        assert_eq!(read.rows[0].matched, vec!["add_two_numbers", "send_email"]);
        assert!(read.rows[0].unmatched.is_empty());
        assert_eq!(read.rows[1].unmatched, vec!["send_email"]);
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a;b"), "\"a;b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_read_rejects_unknown_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, "a;b;c;d\n").unwrap();
        assert!(matches!(
            read_log(&path).unwrap_err(),
            BenchError::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_read_rejects_short_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, format!("{}\nk;1;2\n", header(ElapsedMode::PerTrial))).unwrap();
        let err = read_log(&path).unwrap_err();
        assert!(err.to_string().contains("log row 1"));
    }
}
