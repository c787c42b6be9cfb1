//! External command error types

use thiserror::Error;

/// Failure of a wrapped external program (`git`, `git-annex`)
#[derive(Error, Debug)]
pub enum CommandError {
    /// The program could not be started at all
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully
    #[error("Command '{program} {}' failed{}: {}", .args.join(" "), format_status(.status), .stderr.trim())]
    Failed {
        program: String,
        args: Vec<String>,
        status: Option<i32>,
        stderr: String,
    },

    /// The program succeeded but printed something we cannot interpret
    #[error("Unexpected output from '{program}': {message}")]
    UnexpectedOutput { program: String, message: String },
}

impl CommandError {
    /// Create a spawn error
    pub fn spawn(program: &str, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.to_string(),
            source,
        }
    }

    /// Create a failed command error
    pub fn failed(program: &str, args: &[String], status: Option<i32>, stderr: &str) -> Self {
        Self::Failed {
            program: program.to_string(),
            args: args.to_vec(),
            status,
            stderr: stderr.to_string(),
        }
    }

    /// Create an unexpected output error
    pub fn unexpected_output(program: &str, message: impl Into<String>) -> Self {
        Self::UnexpectedOutput {
            program: program.to_string(),
            message: message.into(),
        }
    }
}

fn format_status(status: &Option<i32>) -> String {
    match *status {
        Some(code) => format!(" with exit code {code}"),
        None => " (terminated by signal)".to_string(),
    }
}
