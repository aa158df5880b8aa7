//! Error taxonomy for a submission.
//!
//! Every failure of a submission is terminal for that submission and is
//! reported through the single error banner of the [`ResultsView`]. The
//! variants map onto the kinds of failure a user can run into:
//!
//! | Variant | Kind |
//! |---------|------|
//! | [`NoFileSelected`](LookbookError::NoFileSelected) | local validation, the user must pick a file |
//! | [`Server`](LookbookError::Server) | the similarity endpoint reported an error |
//! | [`Transport`](LookbookError::Transport) | network failure talking to the endpoint |
//! | [`Decode`](LookbookError::Decode) / [`MissingField`](LookbookError::MissingField) | unexpected payload |
//! | [`Io`](LookbookError::Io) | the selected image could not be read |
//!
//! A catalog miss is not an error; the card degrades instead (see
//! [`render`](crate::render)).
//!
//! [`ResultsView`]: crate::view::ResultsView

use std::path::PathBuf;

/// Banner text used when an error carries no message of its own.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

#[derive(Debug, thiserror::Error)]
pub enum LookbookError {
    #[error("Please select an image")]
    NoFileSelected,

    /// Message taken verbatim from the `error` field of the upload response.
    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("response is missing {0}")]
    MissingField(&'static str),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LookbookError {
    /// Text shown in the error banner.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

pub type Result<T> = std::result::Result<T, LookbookError>;
