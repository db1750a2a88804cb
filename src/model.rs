use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::client::AnalysisError;
use crate::view::RequestId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub endpoint: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
}

/// Page identifier reported by the service. Normally a 1-based page number,
/// but labelled pages are tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageId {
    Number(u64),
    Label(String),
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageId::Number(n) => write!(f, "{n}"),
            PageId::Label(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    Success,
    Failure,
    Unsupported,
}

impl OutcomeStatus {
    /// Map the service's status string onto the closed domain enum.
    pub fn from_wire(status: &str) -> Self {
        match status {
            "OK" => OutcomeStatus::Success,
            "ERROR" => OutcomeStatus::Failure,
            _ => OutcomeStatus::Unsupported,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Success => "ok",
            OutcomeStatus::Failure => "failed",
            OutcomeStatus::Unsupported => "unsupported",
        }
    }
}

/// Per-document analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub document: String,
    pub status: OutcomeStatus,
    pub num_pages: u32,
    /// Pages where a signature was detected. Empty means "no signatures",
    /// which is a definite answer, not an unknown.
    pub positive: Vec<PageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnalysisOutcome {
    /// Human-readable rendering of the flagged pages; an empty list renders
    /// as an explicit "no signatures" rather than a blank.
    pub fn flagged_pages_label(&self) -> String {
        if self.positive.is_empty() {
            "none (no signatures)".to_string()
        } else {
            self.positive
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

/// Raw per-document entry as the service reports it. `num_pages` is signed
/// because the service sends -1 for documents it could not open.
#[derive(Debug, Clone, Deserialize)]
pub struct WireOutcome {
    pub document: String,
    pub status: String,
    pub num_pages: i64,
    #[serde(default)]
    pub positive: Vec<PageId>,
    #[serde(default)]
    pub message: String,
}

/// Response body of one analysis round trip.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisResponse {
    pub results: Vec<WireOutcome>,
    pub csv: String,
    pub classification_duration: f64,
    #[serde(default)]
    pub num_files: Option<u64>,
}

/// The full outcome of one completed analysis. Replaced wholesale on each
/// successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub timestamp_utc: String,
    pub outcomes: Vec<AnalysisOutcome>,
    /// Delimited-text rendering of the outcomes, exported verbatim.
    pub export_text: String,
    /// Seconds the service spent classifying, as reported.
    pub classification_secs: f64,
    /// Seconds observed end-to-end by this client.
    pub total_secs: f64,
}

impl ResultSet {
    pub fn from_response(resp: AnalysisResponse, export_text: String, total: Duration) -> Self {
        let outcomes = resp
            .results
            .into_iter()
            .map(|w| AnalysisOutcome {
                status: OutcomeStatus::from_wire(&w.status),
                // -1 marks an unreadable document; the domain count is non-negative.
                num_pages: u32::try_from(w.num_pages).unwrap_or(0),
                positive: w.positive,
                message: (!w.message.is_empty()).then_some(w.message),
                document: w.document,
            })
            .collect();

        Self {
            timestamp_utc: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            outcomes,
            export_text,
            classification_secs: resp.classification_duration,
            total_secs: total.as_secs_f64(),
        }
    }

    /// Time spent outside the classifier (transfer plus overhead). When the
    /// service reports a classification duration longer than the observed
    /// total, the remainder goes negative and is reported as-is; clamping
    /// would hide the unreliable measurement.
    pub fn transfer_secs(&self) -> f64 {
        self.total_secs - self.classification_secs
    }
}

/// Events emitted by the orchestrator and consumed by presentation layers.
#[derive(Debug)]
pub enum AnalysisEvent {
    Started {
        request_id: RequestId,
    },
    Completed {
        request_id: RequestId,
        // Box to keep AnalysisEvent small; ResultSet carries the full export text.
        result: Box<ResultSet>,
    },
    Failed {
        request_id: RequestId,
        error: AnalysisError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE_RESPONSE: &str = r#"{
        "results": [
            {"document": "a.pdf", "status": "OK", "num_pages": 3, "positive": [1, 2], "message": ""},
            {"document": "b.pdf", "status": "OK", "num_pages": 1, "positive": [], "message": ""},
            {"document": "c.pdf", "status": "ERROR", "num_pages": -1, "positive": [], "message": "unable to open"}
        ],
        "csv": "document,page,label\na.pdf,1,True\na.pdf,2,True\n",
        "classification_duration": 1.2,
        "num_files": 3
    }"#;

    fn parse_sample() -> AnalysisResponse {
        serde_json::from_str(SAMPLE_RESPONSE).expect("sample response must parse")
    }

    #[test]
    fn response_parses_into_domain_outcomes() {
        let resp = parse_sample();
        let csv = resp.csv.clone();
        let rs = ResultSet::from_response(resp, csv, Duration::from_secs_f64(3.5));

        assert_eq!(rs.outcomes.len(), 3);
        assert_eq!(rs.outcomes[0].status, OutcomeStatus::Success);
        assert_eq!(rs.outcomes[0].num_pages, 3);
        assert_eq!(
            rs.outcomes[0].positive,
            vec![PageId::Number(1), PageId::Number(2)]
        );
        assert_eq!(rs.outcomes[0].message, None);
    }

    #[test]
    fn negative_page_count_clamps_to_zero() {
        let rs = ResultSet::from_response(parse_sample(), String::new(), Duration::from_secs(1));
        assert_eq!(rs.outcomes[2].status, OutcomeStatus::Failure);
        assert_eq!(rs.outcomes[2].num_pages, 0);
        assert_eq!(rs.outcomes[2].message.as_deref(), Some("unable to open"));
    }

    #[test]
    fn empty_flagged_list_renders_explicitly() {
        let rs = ResultSet::from_response(parse_sample(), String::new(), Duration::from_secs(1));
        assert_eq!(rs.outcomes[1].flagged_pages_label(), "none (no signatures)");
        assert_eq!(rs.outcomes[0].flagged_pages_label(), "1, 2");
    }

    #[test]
    fn transfer_time_is_the_remainder() {
        let rs =
            ResultSet::from_response(parse_sample(), String::new(), Duration::from_secs_f64(3.5));
        assert!((rs.transfer_secs() - 2.3).abs() < 1e-9);
    }

    #[test]
    fn violated_timing_invariant_is_not_clamped() {
        let rs =
            ResultSet::from_response(parse_sample(), String::new(), Duration::from_secs_f64(0.5));
        assert!((rs.transfer_secs() - (-0.7)).abs() < 1e-9);
        assert!((rs.classification_secs - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_status_maps_to_unsupported() {
        assert_eq!(OutcomeStatus::from_wire("OK"), OutcomeStatus::Success);
        assert_eq!(OutcomeStatus::from_wire("ERROR"), OutcomeStatus::Failure);
        assert_eq!(
            OutcomeStatus::from_wire("SKIPPED"),
            OutcomeStatus::Unsupported
        );
    }

    #[test]
    fn page_ids_accept_numbers_and_labels() {
        let ids: Vec<PageId> = serde_json::from_str(r#"[1, "ii", 4]"#).unwrap();
        assert_eq!(
            ids,
            vec![
                PageId::Number(1),
                PageId::Label("ii".into()),
                PageId::Number(4)
            ]
        );
        assert_eq!(ids[1].to_string(), "ii");
    }
}
