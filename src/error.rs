// Error type shared by every module of the library. The binary maps each
// variant to an exit code so scripts can tell "log in again" apart from
// "pick a context" and from everything else.

use std::io;

/// Exit status for a run that failed for a reason not listed below.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status used when the session is missing, expired or rejected.
pub const EXIT_NEEDS_LOGIN: i32 = 3;
/// Exit status used when no usable child/preschool/year context exists.
pub const EXIT_NEEDS_CONTEXT: i32 = 4;
/// Exit status for transport failures (timeouts, refused connections).
pub const EXIT_NETWORK: i32 = 5;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("no session found; run `kidsview-cli login` first")]
    NotLoggedIn,

    #[error("unsupported authentication challenge: {0}")]
    Challenge(String),

    #[error(
        "{options} {level} options are available and no prompt is possible; \
         pass --ctx-child/--ctx-preschool/--ctx-year or run `kidsview-cli context` interactively"
    )]
    AmbiguousContext { level: String, options: usize },

    #[error("this account has no children assigned to any preschool")]
    NoContext,

    #[error("context is incomplete, missing: {0}")]
    IncompleteContext(String),

    #[error("GraphQL error: {}", .messages.join("; "))]
    GraphQL {
        messages: Vec<String>,
        data: Option<serde_json::Value>,
        /// The response exactly as the server sent it.
        envelope: serde_json::Value,
    },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Auth(_) | Error::NotLoggedIn | Error::Challenge(_) => EXIT_NEEDS_LOGIN,
            Error::AmbiguousContext { .. } | Error::NoContext | Error::IncompleteContext(_) => {
                EXIT_NEEDS_CONTEXT
            }
            Error::Network(_) => EXIT_NETWORK,
            _ => EXIT_FAILURE,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::UnexpectedResponse(err.to_string())
        } else {
            Error::Network(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_separate_login_context_and_general_failures() {
        assert_eq!(Error::NotLoggedIn.exit_code(), EXIT_NEEDS_LOGIN);
        assert_eq!(Error::Auth("revoked".into()).exit_code(), EXIT_NEEDS_LOGIN);
        assert_eq!(Error::Challenge("SMS_MFA".into()).exit_code(), EXIT_NEEDS_LOGIN);
        assert_eq!(Error::NoContext.exit_code(), EXIT_NEEDS_CONTEXT);
        assert_eq!(
            Error::AmbiguousContext {
                level: "preschool".into(),
                options: 2
            }
            .exit_code(),
            EXIT_NEEDS_CONTEXT
        );
        assert_eq!(Error::Config("bad".into()).exit_code(), EXIT_FAILURE);
        assert_eq!(
            Error::GraphQL {
                messages: vec!["nope".into()],
                data: None,
                envelope: serde_json::Value::Null,
            }
            .exit_code(),
            EXIT_FAILURE
        );
    }

    #[test]
    fn graphql_error_lists_server_messages() {
        let err = Error::GraphQL {
            messages: vec!["first".into(), "second".into()],
            data: None,
            envelope: serde_json::Value::Null,
        };
        assert_eq!(err.to_string(), "GraphQL error: first; second");
    }
}
