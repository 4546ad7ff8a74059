use serde::{Deserialize, Serialize};

/// Data file shown when no algorithm run is selected
pub const DEFAULT_DATA_FILE: &str = "report.json";

/// Which algorithm run the user is looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmSelection {
    pub selected_algorithm: Option<String>,
    pub convergence_threshold: Option<String>,
    pub is_data_loaded: bool,
}

impl AlgorithmSelection {
    pub fn set_selection(&mut self, algorithm: impl Into<String>, threshold: impl Into<String>) {
        self.selected_algorithm = Some(algorithm.into());
        self.convergence_threshold = Some(threshold.into());
        self.is_data_loaded = true;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Result file for the current selection
    pub fn data_file_name(&self) -> String {
        match (&self.selected_algorithm, &self.convergence_threshold) {
            (Some(algorithm), Some(threshold)) if !algorithm.is_empty() && !threshold.is_empty() => {
                format!("{}__{}_allocate_result.json", algorithm, threshold)
            }
            _ => DEFAULT_DATA_FILE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_file_name_default() {
        let selection = AlgorithmSelection::default();
        assert_eq!(selection.data_file_name(), "report.json");
        assert!(!selection.is_data_loaded);
    }

    #[test]
    fn test_data_file_name_for_selection() {
        let mut selection = AlgorithmSelection::default();
        selection.set_selection("louvain", "0.01");
        assert!(selection.is_data_loaded);
        assert_eq!(selection.data_file_name(), "louvain__0.01_allocate_result.json");
    }

    #[test]
    fn test_data_file_name_partial_selection() {
        let selection = AlgorithmSelection {
            selected_algorithm: Some("louvain".to_string()),
            convergence_threshold: None,
            is_data_loaded: false,
        };
        assert_eq!(selection.data_file_name(), DEFAULT_DATA_FILE);
    }

    #[test]
    fn test_reset() {
        let mut selection = AlgorithmSelection::default();
        selection.set_selection("pagerank", "0.5");
        selection.reset();
        assert_eq!(selection, AlgorithmSelection::default());
    }
}
