use crate::model::ResultSet;

/// Holds the result set of the most recent completed analysis. Populated
/// exactly once per successful submission and read-only to presentation
/// layers; contents persist until the next successful analysis.
#[derive(Debug, Default)]
pub struct ResultStore {
    current: Option<ResultSet>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any prior contents wholesale.
    pub fn replace(&mut self, result: ResultSet) {
        self.current = Some(result);
    }

    pub fn current(&self) -> Option<&ResultSet> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisResponse, ResultSet};
    use std::time::Duration;

    fn result_with_csv(csv: &str) -> ResultSet {
        let resp: AnalysisResponse = serde_json::from_str(&format!(
            r#"{{"results": [], "csv": {csv:?}, "classification_duration": 0.1}}"#
        ))
        .unwrap();
        let text = resp.csv.clone();
        ResultSet::from_response(resp, text, Duration::from_millis(200))
    }

    #[test]
    fn starts_empty() {
        assert!(ResultStore::new().current().is_none());
    }

    #[test]
    fn replace_swaps_the_whole_result_set() {
        let mut store = ResultStore::new();
        store.replace(result_with_csv("first\n"));
        store.replace(result_with_csv("second\n"));
        assert_eq!(store.current().unwrap().export_text, "second\n");
    }
}
