pub mod average;
pub mod clean;
pub mod compute;
pub mod config;
pub mod predict;

use crate::cli::SequenceInput;
use crate::error::{CliError, Result};
use ppdg::config::Settings;
use std::path::Path;
use tracing::info;

/// Loads settings from the given file, or falls back to the defaults.
pub fn load_settings(config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(path) => {
            info!("Reading settings from {}", path.display());
            Ok(Settings::load(path)?)
        }
        None => Ok(Settings::default()),
    }
}

/// Resolves the sequence argument, inline or from a file.
pub fn read_sequence(input: &SequenceInput) -> Result<String> {
    if let Some(sequence) = &input.sequence {
        return Ok(sequence.trim().to_string());
    }
    if let Some(path) = &input.sequence_file {
        let raw = std::fs::read_to_string(path)?;
        let sequence = raw.trim().to_string();
        if sequence.is_empty() {
            return Err(CliError::Argument(format!(
                "sequence file '{}' is empty",
                path.display()
            )));
        }
        return Ok(sequence);
    }
    Err(CliError::Argument(
        "either --sequence or --sequence-file is required".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_sequence_is_trimmed() {
        let input = SequenceInput {
            sequence: Some(" AAAA/CCCC \n".to_string()),
            sequence_file: None,
        };
        assert_eq!(read_sequence(&input).unwrap(), "AAAA/CCCC");
    }

    #[test]
    fn sequence_file_is_read_and_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seq.txt");
        std::fs::write(&path, "AAAA/CCCC\n").unwrap();

        let input = SequenceInput {
            sequence: None,
            sequence_file: Some(path),
        };
        assert_eq!(read_sequence(&input).unwrap(), "AAAA/CCCC");
    }

    #[test]
    fn empty_sequence_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seq.txt");
        std::fs::write(&path, "\n").unwrap();

        let input = SequenceInput {
            sequence: None,
            sequence_file: Some(path),
        };
        assert!(matches!(
            read_sequence(&input),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn missing_settings_file_propagates() {
        let err = load_settings(Some(Path::new("/nonexistent/ppdg.ini"))).unwrap_err();
        assert!(matches!(err, CliError::Settings(_)));
    }
}
