//! Client for the developer portal's proof verification endpoint.

use reqwest::blocking::Client;
use serde_json::json;

use super::{TransportError, VerificationFailure};
use crate::field::field_to_hex;
use crate::packed_proof::PackedProof;
use crate::protocol::{FullProofRecord, Proof};

pub struct DevPortalClient {
    base_url: String,
    client: Client,
}

impl DevPortalClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client: Client::new(),
        }
    }

    /// Verify a proof record through `POST /api/v1/verify/{app_id}`.
    ///
    /// The portal takes the proof in packed calldata form and the raw action
    /// and signal strings; it recomputes their hashes on its side.
    ///
    /// # Errors
    ///
    /// Returns a [`VerificationFailure`] if the portal does not accept the
    /// proof, including the response body when it gives one.
    pub fn verify(
        &self,
        app_id: &str,
        record: &FullProofRecord,
        credential_type: &str,
        action: &str,
        signal: &str,
    ) -> Result<(), VerificationFailure> {
        let endpoint = format!("{}/api/v1/verify/{app_id}", self.base_url);
        let packed = PackedProof::from(Proof::unpack(record.proof));
        let body = json!({
            "nullifier_hash": field_to_hex(record.nullifier_hash),
            "proof": packed.to_string(),
            "merkle_root": field_to_hex(record.merkle_root),
            "credential_type": credential_type,
            "action": action,
            "signal": signal,
        });

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .map_err(|source| TransportError::Http { endpoint, source })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(VerificationFailure::DevPortal(
                response.text().unwrap_or_default(),
            ))
        }
    }
}
