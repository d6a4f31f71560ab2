use crate::domain::prediction::{is_unset, MISSING_QUOTE};
use crate::domain::sentiment::Sentiment;
use crate::quotes::{fetch_or_none, Instrument, QuoteSource};
use crate::storage::prediction_log::{
    LogTable, PredictionLog, COL_ACTUAL_CLOSE, COL_ACTUAL_TREND, COL_DATE, COL_MATCH,
    COL_PREDICTED, COL_SPX,
};
use chrono::NaiveDate;

/// Binary outcome: the close either finished above the recorded open level or it did not.
pub fn realized_trend(open_level: f64, close: f64) -> Sentiment {
    if close > open_level {
        Sentiment::Bullish
    } else {
        Sentiment::Bearish
    }
}

/// Loose match: the realized label appears anywhere in the predicted label,
/// so "Bullish" matches "📈 Bullish (Confidence: 0.62)".
pub fn prediction_matches(predicted_label: &str, realized: Sentiment) -> bool {
    predicted_label
        .to_lowercase()
        .contains(&realized.label().to_lowercase())
}

/// Takes the first ten characters so both `2026-03-02` and `2026-03-02 00:00:00` parse.
fn row_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Adds any outcome column an older log may be missing.
pub fn ensure_outcome_columns(table: &mut LogTable) {
    for col in [COL_ACTUAL_CLOSE, COL_ACTUAL_TREND, COL_MATCH] {
        table.ensure_column(col, MISSING_QUOTE);
    }
}

/// Rows dated `today` whose realized trend is still unset.
pub fn pending_rows(table: &LogTable, today: NaiveDate) -> Vec<usize> {
    let (Some(date_col), Some(trend_col)) =
        (table.column(COL_DATE), table.column(COL_ACTUAL_TREND))
    else {
        return Vec::new();
    };

    (0..table.rows.len())
        .filter(|&idx| row_date(table.get(idx, date_col)) == Some(today))
        .filter(|&idx| is_unset(table.get(idx, trend_col)))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub updated: usize,
    pub unparseable_open: usize,
}

/// Fills the outcome columns of `rows` from one realized close. Other rows are not touched.
pub fn apply_close(table: &mut LogTable, rows: &[usize], close: f64) -> anyhow::Result<ReconcileSummary> {
    ensure_outcome_columns(table);
    let spx_col = table
        .column(COL_SPX)
        .ok_or_else(|| anyhow::anyhow!("prediction log has no {COL_SPX} column"))?;
    let predicted_col = table
        .column(COL_PREDICTED)
        .ok_or_else(|| anyhow::anyhow!("prediction log has no {COL_PREDICTED} column"))?;
    let close_col = table.ensure_column(COL_ACTUAL_CLOSE, MISSING_QUOTE);
    let trend_col = table.ensure_column(COL_ACTUAL_TREND, MISSING_QUOTE);
    let match_col = table.ensure_column(COL_MATCH, MISSING_QUOTE);

    let mut summary = ReconcileSummary::default();
    for &idx in rows {
        table.set(idx, close_col, close.to_string());

        let open_raw = table.get(idx, spx_col).trim().to_string();
        let Some(open_level) = open_raw.parse::<f64>().ok().filter(|v| v.is_finite()) else {
            summary.unparseable_open += 1;
            tracing::warn!(row = idx, spx = %open_raw, "recorded SPX level is not a number; leaving trend unset");
            continue;
        };

        let realized = realized_trend(open_level, close);
        let matched = prediction_matches(table.get(idx, predicted_col), realized);
        table.set(idx, trend_col, realized.label());
        table.set(idx, match_col, if matched { "1" } else { "0" });
        summary.updated += 1;
    }

    Ok(summary)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconcileOutcome {
    NothingPending,
    /// Pending rows exist but the close could not be fetched; nothing was written.
    CloseUnavailable { pending: usize },
    Updated { close: f64, summary: ReconcileSummary },
}

/// One reconciliation pass over the log for `today`.
///
/// The close is fetched only when there is something to update, and the file
/// is rewritten only after a close was obtained, so the pass can be repeated
/// later in the day.
pub async fn reconcile_log(
    log: &PredictionLog,
    today: NaiveDate,
    quotes: &dyn QuoteSource,
) -> anyhow::Result<ReconcileOutcome> {
    let mut table = log.load()?;
    ensure_outcome_columns(&mut table);

    let rows = pending_rows(&table, today);
    if rows.is_empty() {
        tracing::info!(%today, "no predictions awaiting an outcome");
        return Ok(ReconcileOutcome::NothingPending);
    }
    tracing::info!(%today, pending = rows.len(), "found predictions awaiting an outcome");

    let Some(close) = fetch_or_none(quotes, Instrument::Spx).await else {
        return Ok(ReconcileOutcome::CloseUnavailable { pending: rows.len() });
    };

    let summary = apply_close(&mut table, &rows, close)?;
    log.save(&table)?;
    tracing::info!(%today, close, updated = summary.updated, "prediction log reconciled");
    Ok(ReconcileOutcome::Updated { close, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::prediction_log::HEADER;

    fn row(date: &str, spx: &str, predicted: &str, trend: &str, close: &str, matched: &str) -> Vec<String> {
        vec![
            date.into(),
            spx.into(),
            "5010".into(),
            "14.1".into(),
            "3".into(),
            predicted.into(),
            trend.into(),
            close.into(),
            matched.into(),
            "news".into(),
        ]
    }

    fn table(rows: Vec<Vec<String>>) -> LogTable {
        LogTable {
            headers: HEADER.iter().map(|s| s.to_string()).collect(),
            rows,
            ..Default::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn bullish_call_and_higher_close_is_a_match() {
        let mut t = table(vec![row("2026-03-02", "5000", "📈 Bullish (Confidence: 0.70)", "nan", "nan", "nan")]);
        let rows = pending_rows(&t, today());
        assert_eq!(rows, vec![0]);
        let summary = apply_close(&mut t, &rows, 5050.0).unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(&t.rows[0][6..9], &["Bullish", "5050", "1"]);
    }

    #[test]
    fn bullish_call_and_lower_close_is_a_miss() {
        let mut t = table(vec![row("2026-03-02", "5000", "Bullish", "nan", "nan", "nan")]);
        let rows = pending_rows(&t, today());
        apply_close(&mut t, &rows, 4950.0).unwrap();
        assert_eq!(&t.rows[0][6..9], &["Bearish", "4950", "0"]);
    }

    #[test]
    fn equal_close_counts_as_bearish() {
        assert_eq!(realized_trend(5000.0, 5000.0), Sentiment::Bearish);
    }

    #[test]
    fn neutral_prediction_never_matches() {
        assert!(!prediction_matches("🔹 Neutral (Confidence: 0.50)", Sentiment::Bullish));
        assert!(!prediction_matches("🔹 Neutral (Confidence: 0.50)", Sentiment::Bearish));
        assert!(prediction_matches("📉 BEARISH (Confidence: 0.61)", Sentiment::Bearish));
    }

    #[test]
    fn only_todays_pending_rows_change() {
        let original = vec![
            row("2026-03-01", "4990", "Bullish", "nan", "nan", "nan"),
            row("2026-03-02", "5000", "Bearish", "Bullish", "5100", "0"),
            row("2026-03-02", "5000", "Bearish", "N/A", "nan", "nan"),
            row("2026-03-02 00:00:00", "5000", "Bullish", "", "", ""),
        ];
        let mut t = table(original.clone());
        let rows = pending_rows(&t, today());
        assert_eq!(rows, vec![2, 3]);
        apply_close(&mut t, &rows, 4900.0).unwrap();

        assert_eq!(t.rows[0], original[0]);
        assert_eq!(t.rows[1], original[1]);
        assert_eq!(&t.rows[2][6..9], &["Bearish", "4900", "1"]);
        assert_eq!(&t.rows[3][6..9], &["Bearish", "4900", "0"]);
    }

    #[test]
    fn unparseable_open_records_close_only() {
        let mut t = table(vec![row("2026-03-02", "N/A", "Bullish", "nan", "nan", "nan")]);
        let rows = pending_rows(&t, today());
        let summary = apply_close(&mut t, &rows, 5050.0).unwrap();
        assert_eq!(summary, ReconcileSummary { updated: 0, unparseable_open: 1 });
        assert_eq!(&t.rows[0][6..9], &["nan", "5050", "nan"]);
    }

    #[test]
    fn legacy_log_without_outcome_columns() {
        let mut t = LogTable {
            headers: vec!["date".into(), "spx".into(), "predicted_trend".into()],
            rows: vec![vec!["2026-03-02".into(), "5000".into(), "Bullish".into()]],
            ..Default::default()
        };
        assert!(pending_rows(&t, today()).is_empty());
        ensure_outcome_columns(&mut t);
        let rows = pending_rows(&t, today());
        assert_eq!(rows, vec![0]);
        apply_close(&mut t, &rows, 5001.0).unwrap();
        let trend = t.column(COL_ACTUAL_TREND).unwrap();
        assert_eq!(t.get(0, trend), "Bullish");
    }

    mod run {
        use super::*;
        use crate::domain::prediction::{MarketQuotes, PredictionRecord};
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct FixedClose {
            close: Option<f64>,
            calls: AtomicUsize,
        }

        impl FixedClose {
            fn new(close: Option<f64>) -> Self {
                Self {
                    close,
                    calls: AtomicUsize::new(0),
                }
            }
        }

        #[async_trait::async_trait]
        impl QuoteSource for FixedClose {
            async fn fetch_quote(&self, instrument: Instrument) -> anyhow::Result<f64> {
                assert_eq!(instrument, Instrument::Spx);
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.close.ok_or_else(|| anyhow::anyhow!("page did not render"))
            }
        }

        fn pending(day: u32, spx: f64, predicted: &str) -> PredictionRecord {
            PredictionRecord::pending(
                NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
                MarketQuotes {
                    spx: Some(spx),
                    es: None,
                    vix: None,
                },
                3,
                predicted.to_string(),
                "📈 Stocks rally - https://x.test — risk-on".to_string(),
            )
        }

        #[tokio::test]
        async fn updates_today_and_leaves_other_lines_identical() {
            let dir = tempfile::tempdir().unwrap();
            let log = PredictionLog::new(dir.path().join("log.csv"));
            log.append(&pending(1, 4990.0, "📈 Bullish (Confidence: 0.60)")).unwrap();
            log.append(&pending(2, 5000.0, "📈 Bullish (Confidence: 0.60)")).unwrap();
            let before = std::fs::read_to_string(log.path()).unwrap();

            let source = FixedClose::new(Some(5050.0));
            let outcome = reconcile_log(&log, today(), &source).await.unwrap();
            assert!(matches!(outcome, ReconcileOutcome::Updated { summary, .. } if summary.updated == 1));

            let after = std::fs::read_to_string(log.path()).unwrap();
            let before_lines: Vec<_> = before.lines().collect();
            let after_lines: Vec<_> = after.lines().collect();
            assert_eq!(after_lines.len(), 3);
            assert_eq!(after_lines[0], before_lines[0]);
            assert_eq!(after_lines[1], before_lines[1]);
            assert!(after_lines[2].contains(",Bullish,5050,1,"));

            // Second pass finds nothing and does not fetch again.
            let outcome = reconcile_log(&log, today(), &source).await.unwrap();
            assert_eq!(outcome, ReconcileOutcome::NothingPending);
            assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn failed_close_fetch_writes_nothing() {
            let dir = tempfile::tempdir().unwrap();
            let log = PredictionLog::new(dir.path().join("log.csv"));
            log.append(&pending(2, 5000.0, "📉 Bearish (Confidence: 0.55)")).unwrap();
            let before = std::fs::read(log.path()).unwrap();

            let outcome = reconcile_log(&log, today(), &FixedClose::new(None)).await.unwrap();
            assert_eq!(outcome, ReconcileOutcome::CloseUnavailable { pending: 1 });
            assert_eq!(std::fs::read(log.path()).unwrap(), before);
        }

        #[tokio::test]
        async fn missing_log_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let log = PredictionLog::new(dir.path().join("absent.csv"));
            assert!(reconcile_log(&log, today(), &FixedClose::new(Some(1.0))).await.is_err());
        }
    }
}
