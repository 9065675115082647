//! Per-module lookup failures.
//!
//! These never abort a run: they are captured in [`Outcome::Failed`](crate::models::Outcome)
//! and reported next to the module they belong to. Run-level failures
//! (config, manifest, report sinks) use `anyhow` instead.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Transport-level failure talking to a license source.
    #[error("network error: {0}")]
    Network(String),

    #[error("unauthorized: check the GITHUB_TOKEN value")]
    Unauthorized,

    #[error("rate limited by {0}; set GITHUB_TOKEN to raise the limit")]
    RateLimited(String),

    #[error("unexpected HTTP status {status} from {url}")]
    Http { status: u16, url: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    /// The classifier produced an id that the SPDX registry does not know.
    #[error("error looking up license {0:?}: not a known SPDX identifier")]
    UnknownLicenseId(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LookupError::Decode(err.to_string())
        } else {
            LookupError::Network(err.to_string())
        }
    }
}
