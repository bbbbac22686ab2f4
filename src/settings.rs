use crate::compiler_messages::compiler_errors::CompilerError;
use crate::return_config_error;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "ownership.toml";

// Rough guess at how many distinct identifiers a routine batch interns.
pub const MINIMUM_STRING_TABLE_CAPACITY: usize = 64;

// Longest strictly ascending chain through the lattice, counted in steps from
// "absent" (absent -> UniqueFree -> UniqueBorrowed -> SharedBorrowed -> Moved).
// A block's incoming binding for a path can change at most this many times.
pub const LATTICE_ASCENT_STEPS: usize = 4;

// Expected statements per block, used to pre-size per-point state tables.
pub const STATEMENTS_PER_BLOCK_HINT: usize = 8;

/// Knobs for a single analysis run.
///
/// Every field has a default, so an empty `ownership.toml` (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Analyse independent routines on the rayon pool.
    pub parallel_routines: bool,

    /// Per-routine cap on worklist iterations. The computed convergence
    /// ceiling still applies when this is larger.
    pub max_worklist_iterations: Option<usize>,

    /// Wall-clock budget for a whole run, in milliseconds.
    pub deadline_ms: Option<u64>,

    /// Keep the environment after every statement, not just block boundaries.
    pub record_statement_states: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parallel_routines: true,
            max_worklist_iterations: None,
            deadline_ms: None,
            record_statement_states: true,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, CompilerError> {
        let config = match toml::from_str::<AnalysisConfig>(source) {
            Ok(config) => config,
            Err(error) => {
                return_config_error!(
                    format!("Could not parse ownership analysis config: {error}"),
                    {
                        CompilationStage => "Configuration",
                        PrimarySuggestion => "Valid keys are parallel_routines, max_worklist_iterations, deadline_ms and record_statement_states",
                    }
                );
            }
        };

        if config.max_worklist_iterations == Some(0) {
            return_config_error!(
                "max_worklist_iterations must be at least 1",
                {
                    CompilationStage => "Configuration",
                    ConfigKey => "max_worklist_iterations",
                }
            );
        }

        Ok(config)
    }

    /// Load the config file at `path`.
    /// A directory is searched for `ownership.toml`; a missing file there means defaults.
    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        let file_path = if path.is_dir() {
            let candidate = path.join(CONFIG_FILE_NAME);
            if !candidate.exists() {
                return Ok(Self::default());
            }
            candidate
        } else {
            path.to_path_buf()
        };

        let source = std::fs::read_to_string(&file_path).map_err(|error| {
            CompilerError::file_error(
                &file_path,
                format!("Could not read '{}': {error}", file_path.display()),
            )
        })?;

        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler_messages::compiler_errors::ErrorType;
    use std::fs;

    #[test]
    fn empty_config_uses_defaults() {
        let config = AnalysisConfig::from_toml_str("").expect("empty config is valid");
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn config_keys_override_defaults() {
        let config = AnalysisConfig::from_toml_str(
            "parallel_routines = false\nmax_worklist_iterations = 50\ndeadline_ms = 250\n",
        )
        .expect("config should parse");

        assert!(!config.parallel_routines);
        assert_eq!(config.max_worklist_iterations, Some(50));
        assert_eq!(config.deadline_ms, Some(250));
        assert!(config.record_statement_states);
    }

    #[test]
    fn unknown_keys_are_config_errors() {
        let error = AnalysisConfig::from_toml_str("widening = true\n")
            .expect_err("unknown key should be rejected");
        assert_eq!(error.error_type, ErrorType::Config);
    }

    #[test]
    fn zero_iteration_cap_is_rejected() {
        let error = AnalysisConfig::from_toml_str("max_worklist_iterations = 0\n")
            .expect_err("zero cap should be rejected");
        assert_eq!(error.error_type, ErrorType::Config);
    }

    #[test]
    fn directory_without_config_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = AnalysisConfig::load(dir.path()).expect("missing file means defaults");
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn directory_config_file_is_loaded() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "record_statement_states = false\n",
        )
        .expect("write config");

        let config = AnalysisConfig::load(dir.path()).expect("config should load");
        assert!(!config.record_statement_states);
    }

    #[test]
    fn unreadable_explicit_path_is_a_file_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = AnalysisConfig::load(&dir.path().join("missing.toml"))
            .expect_err("missing explicit file should fail");
        assert_eq!(error.error_type, ErrorType::File);
    }
}
