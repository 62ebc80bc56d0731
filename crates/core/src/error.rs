//! Errors surfaced to the embedding application.
//!
//! Registration problems are programmer mistakes and fail loudly at
//! registration time. User-input problems never show up here; those go
//! through the message registry instead.

use thiserror::Error;

/// A structural problem detected while building the command tree.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("command name must not be empty")]
    EmptyCommandName,

    #[error("command '{command}' is already registered")]
    DuplicateCommand { command: String },

    #[error("command '{parent}' already has a child named '{child}'")]
    DuplicateChild { parent: String, child: String },

    #[error("command '{command}': parameter '{parameter}' declared twice")]
    DuplicateParameter { command: String, parameter: String },

    #[error("command '{command}': parameter '{parameter}' follows a limitless parameter")]
    ParameterAfterLimitless { command: String, parameter: String },

    #[error("command '{command}': required parameter '{parameter}' follows an optional one")]
    RequiredAfterOptional { command: String, parameter: String },

    #[error("command '{command}': no argument resolver registered for type '{type_name}'")]
    UnknownArgumentType { command: String, type_name: String },

    #[error("parent command '{command}': argument '{parameter}' must consume a single token")]
    ParentArgumentNotSingleToken { command: String, parameter: String },

    #[error("command '{command}': no requirement registered under key '{key}'")]
    UnresolvedRequirement { command: String, key: String },

    #[error("command '{command}': no flag list registered under key '{key}'")]
    UnknownFlagGroup { command: String, key: String },

    #[error("command '{command}': no named-argument list registered under key '{key}'")]
    UnknownNamedGroup { command: String, key: String },

    #[error("command '{command}': keyed parameter '{parameter}' declares no flags or named arguments")]
    EmptyKeyedParameter { command: String, parameter: String },

    #[error("command '{command}': invalid separator '{separator}' for parameter '{parameter}'")]
    InvalidSeparator {
        command: String,
        parameter: String,
        separator: String,
        #[source]
        source: regex::Error,
    },
}

/// A command target returned an error. Parsing and validation failures are
/// messages, not errors; only target failures propagate.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("command '{command}' failed")]
    Target {
        command: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_errors_name_the_command() {
        let error = RegistrationError::RequiredAfterOptional {
            command: "give".into(),
            parameter: "amount".into(),
        };
        assert!(error.to_string().contains("give"));
        assert!(error.to_string().contains("amount"));
    }

    #[test]
    fn execution_error_keeps_the_source() {
        use std::error::Error as _;

        let error = ExecutionError::Target {
            command: "give".into(),
            source: anyhow::anyhow!("storage offline"),
        };
        assert_eq!(error.source().unwrap().to_string(), "storage offline");
    }
}
