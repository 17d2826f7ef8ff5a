use thiserror::Error;

/// Errors that make a single probe produce no result
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to launch probe `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Probe {}: {}", describe_status(.status), .diagnostic.trim_end())]
    Failure {
        status: Option<i32>,
        diagnostic: String,
    },
}

impl ProbeError {
    /// Diagnostic text captured from the probe's error stream, if any
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ProbeError::Launch { .. } => None,
            ProbeError::Failure { diagnostic, .. } => Some(diagnostic),
        }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_includes_status_and_diagnostic() {
        let err = ProbeError::Failure {
            status: Some(2),
            diagnostic: "ping: unknown host nowhere.invalid".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("status 2"));
        assert!(text.contains("unknown host"));
        assert_eq!(err.diagnostic(), Some("ping: unknown host nowhere.invalid"));
    }

    #[test]
    fn test_signal_failure_display() {
        let err = ProbeError::Failure {
            status: None,
            diagnostic: String::new(),
        };
        assert!(err.to_string().contains("signal"));
    }
}
