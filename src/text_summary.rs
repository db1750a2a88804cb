//! Text summary builder for CLI output.
//!
//! Formats one completed result set as human-readable lines for text mode.

use crate::model::ResultSet;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a completed analysis.
pub(crate) fn build_text_summary(result: &ResultSet) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!(
        "Analyzed {} document(s) at {}",
        result.outcomes.len(),
        result.timestamp_utc
    ));

    let name_width = result
        .outcomes
        .iter()
        .map(|o| o.document.len())
        .max()
        .unwrap_or(0);
    for outcome in &result.outcomes {
        let mut line = format!(
            "  {:name_width$}  {:<11}  {:>3} page(s)  signatures: {}",
            outcome.document,
            outcome.status.as_str(),
            outcome.num_pages,
            outcome.flagged_pages_label(),
        );
        if let Some(message) = outcome.message.as_deref() {
            line.push_str(&format!("  ({message})"));
        }
        lines.push(line);
    }

    lines.push(format!(
        "Classification: {:.2} s  Transfer: {:.2} s  Total: {:.2} s",
        result.classification_secs,
        result.transfer_secs(),
        result.total_secs
    ));

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnalysisResponse;
    use std::time::Duration;

    fn sample() -> ResultSet {
        let resp: AnalysisResponse = serde_json::from_str(
            r#"{
                "results": [
                    {"document": "a.pdf", "status": "OK", "num_pages": 3, "positive": [1, 2]},
                    {"document": "b.pdf", "status": "OK", "num_pages": 1, "positive": []}
                ],
                "csv": "x\n",
                "classification_duration": 1.2
            }"#,
        )
        .unwrap();
        ResultSet::from_response(resp, "x\n".into(), Duration::from_secs_f64(3.5))
    }

    #[test]
    fn summary_names_every_document() {
        let summary = build_text_summary(&sample());
        assert!(summary.lines.iter().any(|l| l.contains("a.pdf")));
        assert!(summary.lines.iter().any(|l| l.contains("b.pdf")));
    }

    #[test]
    fn clean_documents_get_an_explicit_no_signature_line() {
        let summary = build_text_summary(&sample());
        let b_line = summary
            .lines
            .iter()
            .find(|l| l.contains("b.pdf"))
            .expect("b.pdf line");
        assert!(b_line.contains("none (no signatures)"));
    }

    #[test]
    fn timing_line_reports_all_three_durations() {
        let summary = build_text_summary(&sample());
        let timing = summary.lines.last().unwrap();
        assert!(timing.contains("Classification: 1.20 s"));
        assert!(timing.contains("Transfer: 2.30 s"));
        assert!(timing.contains("Total: 3.50 s"));
    }
}
