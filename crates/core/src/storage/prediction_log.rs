use crate::domain::prediction::PredictionRecord;
use anyhow::Context;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

pub const HEADER: [&str; 10] = [
    "date",
    "spx",
    "es",
    "vix",
    "sentiment_score",
    "predicted_trend",
    "actual_trend",
    "actual_spx_close",
    "Match/Miss",
    "news",
];

pub const COL_DATE: &str = "date";
pub const COL_SPX: &str = "spx";
pub const COL_PREDICTED: &str = "predicted_trend";
pub const COL_ACTUAL_TREND: &str = "actual_trend";
pub const COL_ACTUAL_CLOSE: &str = "actual_spx_close";
pub const COL_MATCH: &str = "Match/Miss";

/// Record terminator of an existing log. Files written by older tooling end
/// rows with `\r\n`; rewrites and appends keep whatever the file already uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    /// Judged from the first line only.
    fn detect(first_line: &[u8]) -> Self {
        if first_line.ends_with(b"\r\n") {
            LineEnding::Crlf
        } else {
            LineEnding::Lf
        }
    }

    fn terminator(self) -> csv::Terminator {
        match self {
            LineEnding::Lf => csv::Terminator::Any(b'\n'),
            LineEnding::Crlf => csv::Terminator::CRLF,
        }
    }
}

/// The whole log held in memory as raw strings, so rows nobody touches are
/// written back exactly as they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub line_ending: LineEnding,
}

impl LogTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Adds `name` as a trailing column filled with `fill` if it is absent.
    pub fn ensure_column(&mut self, name: &str, fill: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        let idx = self.headers.len() - 1;
        for row in &mut self.rows {
            if row.len() < idx {
                row.resize(idx, String::new());
            }
            row.insert(idx, fill.to_string());
        }
        idx
    }

    pub fn get(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) {
        let r = &mut self.rows[row];
        if r.len() <= col {
            r.resize(col + 1, String::new());
        }
        r[col] = value.into();
    }
}

#[derive(Debug, Clone)]
pub struct PredictionLog {
    path: PathBuf,
}

impl PredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row; the header goes in first when the file is new or empty.
    pub fn append(&self, record: &PredictionRecord) -> anyhow::Result<()> {
        let needs_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(err) if err.kind() == io::ErrorKind::NotFound => true,
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to stat {}", self.path.display()))
            }
        };

        let line_ending = if needs_header {
            LineEnding::default()
        } else {
            self.line_ending()?
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .terminator(line_ending.terminator())
            .from_writer(file);

        if needs_header {
            writer.write_record(HEADER).context("failed to write log header")?;
        }
        writer
            .write_record(record.to_row())
            .context("failed to write prediction row")?;
        writer.flush().context("failed to flush prediction log")?;
        Ok(())
    }

    fn line_ending(&self) -> anyhow::Result<LineEnding> {
        let file = fs::File::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let mut first_line = Vec::new();
        BufReader::new(file)
            .read_until(b'\n', &mut first_line)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        Ok(LineEnding::detect(&first_line))
    }

    pub fn load(&self) -> anyhow::Result<LogTable> {
        let line_ending = self.line_ending()?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;

        let headers = reader
            .headers()
            .context("failed to read log header")?
            .iter()
            .map(String::from)
            .collect();

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("malformed log row {}", idx + 1))?;
            rows.push(record.iter().map(String::from).collect());
        }

        Ok(LogTable {
            headers,
            rows,
            line_ending,
        })
    }

    /// Rewrites the whole file via a sibling temp file renamed into place.
    pub fn save(&self, table: &LogTable) -> anyhow::Result<()> {
        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .terminator(table.line_ending.terminator())
                .from_path(&tmp)
                .with_context(|| format!("failed to create {}", tmp.display()))?;
            writer
                .write_record(&table.headers)
                .context("failed to write log header")?;
            for row in &table.rows {
                writer.write_record(row).context("failed to write log row")?;
            }
            writer.flush().context("failed to flush log rewrite")?;
        }

        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
