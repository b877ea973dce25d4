//! `key=value` step outputs
//!
//! Lines are appended to the output file when one is configured (normally
//! `$GITHUB_OUTPUT`) and printed to stdout otherwise.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::{ErrorCode, Result, StepGuardError};

/// Render outputs as `key=value` lines; newlines in values are flattened
pub fn format_outputs(outputs: &[(&str, String)]) -> String {
    outputs
        .iter()
        .map(|(key, value)| format!("{}={}\n", key, value.replace(['\r', '\n'], " ")))
        .collect()
}

pub fn write_outputs(path: Option<&Path>, outputs: &[(&str, String)]) -> Result<()> {
    let rendered = format_outputs(outputs);
    match path {
        Some(path) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| output_error(path, e))?;
            file.write_all(rendered.as_bytes())
                .map_err(|e| output_error(path, e))
        }
        None => {
            print!("{}", rendered);
            Ok(())
        }
    }
}

fn output_error(path: &Path, err: std::io::Error) -> StepGuardError {
    StepGuardError::other_with_code(
        ErrorCode::OTHER_OUTPUT,
        format!("cannot write outputs to '{}'", path.display()),
    )
    .with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_outputs() {
        let rendered = format_outputs(&[
            ("success", "true".to_string()),
            ("error-message", "line one\nline two".to_string()),
        ]);
        assert_eq!(rendered, "success=true\nerror-message=line one line two\n");
    }

    #[test]
    fn test_write_outputs_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("github_output");
        std::fs::write(&path, "existing=1\n").unwrap();

        write_outputs(Some(&path), &[("attempts", "2".to_string())]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "existing=1\nattempts=2\n");
    }

    #[test]
    fn test_write_outputs_unwritable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("out");
        let err = write_outputs(Some(&path), &[("valid", "true".to_string())]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::OTHER_OUTPUT);
    }
}
