//! Offline evaluation over a JSONL file of labelled questions.
//!
//! Each line: `{"context": "...", "question": "...", "expected": {"decision": "..."}}`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::analyst::PolicyAnalyst;
use crate::error::AnalystError;
use crate::progress::Progress;

/// Keys compared by default.
pub const DEFAULT_KEYS: &[&str] = &["decision"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRow {
    pub context: String,
    pub question: String,
    pub expected: Value,
}

/// Parses JSONL rows; blank lines are skipped.
///
/// # Errors
/// [`AnalystError::EvalRow`] with the 1-based line number of a malformed row.
pub fn read_eval<R: BufRead>(reader: R) -> Result<Vec<EvalRow>, AnalystError> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|source| AnalystError::EvalRow {
            line: idx + 1,
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_eval(path: impl AsRef<Path>) -> Result<Vec<EvalRow>, AnalystError> {
    let file = File::open(path.as_ref())?;
    read_eval(BufReader::new(file))
}

/// `true` when every key has the same value in both (absent equals absent).
pub fn exact_match(predicted: &Value, expected: &Value, keys: &[&str]) -> bool {
    keys.iter().all(|k| predicted.get(k) == expected.get(k))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalOutcome {
    pub question: String,
    pub predicted: Value,
    pub correct: bool,
}

impl EvalOutcome {
    /// Displayable decision, or `None` for error rows.
    pub fn predicted_decision(&self) -> Option<&str> {
        self.predicted.get("decision").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvalReport {
    pub outcomes: Vec<EvalOutcome>,
    pub correct: usize,
    pub total: usize,
}

impl EvalReport {
    /// Fraction of correct rows; `None` when there were no rows.
    pub fn accuracy(&self) -> Option<f64> {
        (self.total > 0).then(|| self.correct as f64 / self.total as f64)
    }
}

/// Runs every row through [`PolicyAnalyst::analyze`] in order.
///
/// A failing row yields an `{"error": ...}` prediction and counts as
/// incorrect; later rows still run.
pub async fn run_eval(
    analyst: &PolicyAnalyst,
    rows: &[EvalRow],
    keys: &[&str],
    progress: &dyn Progress,
) -> EvalReport {
    progress.set_total(rows.len() as u64);
    let mut report = EvalReport {
        total: rows.len(),
        ..EvalReport::default()
    };

    for row in rows {
        let predicted = analyst.analyze(&row.context, &row.question).await;
        let correct = exact_match(&predicted, &row.expected, keys);
        if correct {
            report.correct += 1;
        }
        progress.step(&row.question);
        report.outcomes.push(EvalOutcome {
            question: row.question.clone(),
            predicted,
            correct,
        });
    }

    progress.finish("evaluation done");
    info!(correct = report.correct, total = report.total, "evaluation finished");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::AnalystConfig;
    use crate::progress::NoopProgress;
    use crate::testing::Canned;
    use llm_service::{LlmModelConfig, LlmProvider};
    use serde_json::json;
    use std::sync::Arc;

    fn analyst(reply: &str, api_key: Option<&str>) -> PolicyAnalyst {
        let cfg = AnalystConfig::new(LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-1.5-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com".into(),
            api_key: api_key.map(str::to_string),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        });
        PolicyAnalyst::with_generator(cfg, Arc::new(Canned::new(reply)))
    }

    const ROWS: &str = r#"{"context":"Covers surgery.","question":"Surgery?","expected":{"decision":"Approved"}}

{"context":"Dental excluded.","question":"Dental?","expected":{"decision":"Rejected"}}
"#;

    #[test]
    fn rows_parse_and_skip_blank_lines() {
        let rows = read_eval(ROWS.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].question, "Dental?");
    }

    #[test]
    fn malformed_row_reports_its_line() {
        let input = "{\"context\":\"a\",\"question\":\"b\",\"expected\":{}}\nnot json\n";
        match read_eval(input.as_bytes()).unwrap_err() {
            AnalystError::EvalRow { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn exact_match_on_selected_keys() {
        let pred = json!({"decision": "Approved", "justification": "x"});
        let expected = json!({"decision": "Approved", "justification": "y"});
        assert!(exact_match(&pred, &expected, DEFAULT_KEYS));
        assert!(!exact_match(&pred, &expected, &["decision", "justification"]));
        assert!(exact_match(&json!({}), &json!({}), DEFAULT_KEYS));
        assert!(!exact_match(&json!({"error": "e"}), &expected, DEFAULT_KEYS));
    }

    #[tokio::test]
    async fn report_counts_correct_rows() {
        let rows = read_eval(ROWS.as_bytes()).unwrap();
        let a = analyst(r#"{"decision":"Approved","justification":"ok","relevant_clauses":[]}"#, Some("k"));
        let report = run_eval(&a, &rows, DEFAULT_KEYS, &NoopProgress).await;

        assert_eq!((report.correct, report.total), (1, 2));
        assert_eq!(report.accuracy(), Some(0.5));
        assert!(report.outcomes[0].correct);
        assert_eq!(report.outcomes[1].predicted_decision(), Some("Approved"));
    }

    #[tokio::test]
    async fn failing_rows_count_as_incorrect() {
        let rows = read_eval(ROWS.as_bytes()).unwrap();
        let a = analyst("unused", None);
        let report = run_eval(&a, &rows, DEFAULT_KEYS, &NoopProgress).await;

        assert_eq!(report.correct, 0);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcomes.iter().all(|o| o.predicted_decision().is_none()));
    }

    #[tokio::test]
    async fn empty_file_has_no_accuracy() {
        let a = analyst("unused", Some("k"));
        let report = run_eval(&a, &[], DEFAULT_KEYS, &NoopProgress).await;
        assert_eq!(report.accuracy(), None);
    }
}
