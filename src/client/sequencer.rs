//! Client for the signup sequencer: identity insertion, inclusion proofs and
//! remote proof verification.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};

use super::{TransportError, VerificationFailure};
use crate::field::field_to_hex;
use crate::merkle::InclusionProofResponse;
use crate::protocol::FullProofRecord;
use crate::util::u256_to_hex;
use crate::Field;

/// Outcome of an inclusion proof request.
///
/// A `202 Accepted` means the commitment is known but not yet merged into the
/// tree. That is the normal state right after insertion, not a failure; the
/// caller decides whether to poll again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InclusionProofStatus {
    Ready(InclusionProofResponse),
    Pending,
}

pub struct SequencerClient {
    base_url: String,
    auth_token: Option<String>,
    group_id: Option<u64>,
    client: Client,
}

impl SequencerClient {
    #[must_use]
    pub fn new(base_url: &str, auth_token: Option<String>, group_id: Option<u64>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            auth_token,
            group_id,
            client: Client::new(),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url)
    }

    /// `[commitment]`, or `[group_id, commitment]` for sequencers that
    /// multiplex several groups.
    fn commitment_body(&self, commitment: Field) -> Value {
        let commitment = field_to_hex(commitment);
        match self.group_id {
            Some(group_id) => json!([group_id, commitment]),
            None => json!([commitment]),
        }
    }

    fn post(&self, endpoint: &str, body: &Value) -> Result<reqwest::blocking::Response, TransportError> {
        let mut request = self.client.post(endpoint).json(body);
        if let Some(token) = &self.auth_token {
            request = request.header("Authorization", format!("Basic {token}"));
        }
        request.send().map_err(|source| TransportError::Http {
            endpoint: endpoint.to_owned(),
            source,
        })
    }

    /// Register an identity commitment with the sequencer.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the request fails or is rejected.
    pub fn insert_identity(&self, commitment: Field) -> Result<(), TransportError> {
        let endpoint = self.endpoint("insertIdentity");
        let response = self.post(&endpoint, &self.commitment_body(commitment))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Rejected {
                endpoint,
                status,
                body: response.text().unwrap_or_default(),
            })
        }
    }

    /// Fetch the Merkle inclusion proof for a previously inserted commitment.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the request fails, is rejected, or the
    /// response body cannot be parsed.
    pub fn inclusion_proof(&self, commitment: Field) -> Result<InclusionProofStatus, TransportError> {
        let endpoint = self.endpoint("inclusionProof");
        let response = self.post(&endpoint, &self.commitment_body(commitment))?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            return Ok(InclusionProofStatus::Pending);
        }
        if !status.is_success() {
            return Err(TransportError::Rejected {
                endpoint,
                status,
                body: response.text().unwrap_or_default(),
            });
        }

        let record: InclusionProofResponse =
            response.json().map_err(|source| TransportError::Http {
                endpoint,
                source,
            })?;
        Ok(InclusionProofStatus::Ready(record))
    }

    /// Submit a proof record for verification against the sequencer's tree.
    ///
    /// # Errors
    ///
    /// Returns a [`VerificationFailure`] if the sequencer does not accept the
    /// proof.
    pub fn verify_proof(&self, record: &FullProofRecord) -> Result<(), VerificationFailure> {
        let endpoint = self.endpoint("verifySemaphoreProof");
        let body = json!({
            "root": field_to_hex(record.merkle_root),
            "nullifierHash": field_to_hex(record.nullifier_hash),
            "signalHash": field_to_hex(record.signal_hash),
            "externalNullifierHash": field_to_hex(record.external_nullifier_hash),
            "proof": nested_proof(&record.proof),
        });
        let response = self.post(&endpoint, &body)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(VerificationFailure::Sequencer(
                response.text().unwrap_or_default(),
            ))
        }
    }
}

/// Reshape the flat proof into the `[[a], [[b0], [b1]], [c]]` nesting the
/// sequencer expects, keeping the flat (already swapped) scalar order.
fn nested_proof(flat: &[ethers_core::types::U256; 8]) -> Value {
    let words = flat.iter().copied().map(u256_to_hex).collect::<Vec<_>>();
    json!([
        [words[0], words[1]],
        [[words[2], words[3]], [words[4], words[5]]],
        [words[6], words[7]],
    ])
}
