//! Blocking HTTP clients for the two remote verifiers: the signup sequencer
//! and the developer portal.

use thiserror::Error;

pub mod dev_portal;
pub mod sequencer;

pub use dev_portal::DevPortalClient;
pub use sequencer::{InclusionProofStatus, SequencerClient};

/// A request that never produced a usable response.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// The remote answered with a non-success status. The body is kept
    /// verbatim; both services put their diagnostics there.
    #[error("{endpoint} rejected the request with status {status}: {body}")]
    Rejected {
        endpoint: String,
        status: reqwest::StatusCode,
        body: String,
    },
}

/// A proof that reached a verifier and was not accepted.
#[derive(Error, Debug)]
pub enum VerificationFailure {
    #[error("proof failed local verification")]
    Local,
    #[error("sequencer rejected the proof: {0}")]
    Sequencer(String),
    #[error("developer portal rejected the proof: {0}")]
    DevPortal(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
