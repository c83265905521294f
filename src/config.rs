//! Explicit run configuration. Everything a pipeline run needs is collected
//! up front; no module reads the environment on its own.

use crate::circuit::CircuitArtifacts;

pub const DEFAULT_SEQUENCER_URL: &str = "https://signup-batching.stage-crypto.worldcoin.dev";
pub const DEFAULT_DEV_PORTAL_URL: &str = "https://developer.worldcoin.org";
pub const DEFAULT_CREDENTIAL_TYPE: &str = "orb";

#[derive(Clone, Debug)]
pub struct Config {
    pub sequencer_url: String,
    pub dev_portal_url: String,
    /// Credential part of the sequencer's `Authorization: Basic` header.
    pub auth_token: Option<String>,
    /// Developer portal app id, e.g. `app_staging_...`.
    pub app_id: String,
    pub action: String,
    pub credential_type: String,
    /// Set only for sequencers that multiplex several Semaphore groups.
    pub group_id: Option<u64>,
    pub artifacts: CircuitArtifacts,
}
