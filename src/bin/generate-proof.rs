//! Run the whole debugging pipeline: fetch the inclusion proof for an
//! identity, produce a Groth16 membership proof and check it locally and
//! against both remote verifiers.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{bail, eyre, WrapErr as _};
use color_eyre::Result;
use world_id_debugger::circuit::{Circuit, CircuitArtifacts};
use world_id_debugger::client::{DevPortalClient, InclusionProofStatus, SequencerClient};
use world_id_debugger::config::{
    Config, DEFAULT_CREDENTIAL_TYPE, DEFAULT_DEV_PORTAL_URL, DEFAULT_SEQUENCER_URL,
};
use world_id_debugger::identity::Identity;
use world_id_debugger::merkle::MerkleProof;
use world_id_debugger::packed_proof::PackedProof;
use world_id_debugger::protocol::{
    generate_external_nullifier, generate_proof_record, Proof,
};
use world_id_debugger::{encode_field, field_to_hex, EncodingMode, Field};

#[derive(Parser, Debug)]
#[command(about = "Generate a World ID proof and verify it everywhere")]
struct Args {
    /// Derive the identity from this seed.
    #[clap(long, conflicts_with_all = ["trapdoor", "nullifier"])]
    seed: Option<String>,

    /// Identity trapdoor, if the identity was generated elsewhere.
    #[clap(long, requires = "nullifier")]
    trapdoor: Option<Field>,

    /// Identity nullifier, if the identity was generated elsewhere.
    #[clap(long, requires = "trapdoor")]
    nullifier: Option<Field>,

    /// The signal to commit to, e.g. a wallet address.
    #[clap(long, default_value = "0x0000000000000000000000000000000000000000")]
    signal: String,

    /// How to turn the signal into a field element: plain, bytes or string.
    /// Detected from the signal shape when not given.
    #[clap(long)]
    signal_encoding: Option<String>,

    #[clap(long, env = "APP_ID")]
    app_id: String,

    #[clap(long, env = "ACTION", default_value = "")]
    action: String,

    #[clap(long, env = "CREDENTIAL_TYPE", default_value = DEFAULT_CREDENTIAL_TYPE)]
    credential_type: String,

    #[clap(long, env = "SEQUENCER_URL", default_value = DEFAULT_SEQUENCER_URL)]
    sequencer_url: String,

    #[clap(long, env = "DEV_PORTAL_URL", default_value = DEFAULT_DEV_PORTAL_URL)]
    dev_portal_url: String,

    /// Credential part of the sequencer's `Authorization: Basic` header.
    #[clap(long, env = "SEQUENCER_AUTH_TOKEN")]
    auth_token: Option<String>,

    /// Group to query, for sequencers that host more than one.
    #[clap(long, env = "GROUP_ID")]
    group_id: Option<u64>,

    /// Path to the witness generator wasm.
    #[clap(long, env = "SEMAPHORE_WASM", default_value = "semaphore/semaphore.wasm")]
    wasm: PathBuf,

    /// Path to the Groth16 proving key.
    #[clap(long, env = "SEMAPHORE_ZKEY", default_value = "semaphore/semaphore.zkey")]
    zkey: PathBuf,

    /// Skip the remote verifiers; still verifies locally.
    #[clap(long)]
    no_verify: bool,
}

impl Args {
    fn identity(&self) -> Result<Identity> {
        match (&self.seed, self.trapdoor, self.nullifier) {
            (Some(seed), ..) => Ok(Identity::from_seed(seed)),
            (None, Some(trapdoor), Some(nullifier)) => {
                Ok(Identity::from_parts(trapdoor, nullifier))
            }
            _ => bail!("no identity provided, pass --seed or --trapdoor and --nullifier"),
        }
    }

    fn signal_encoding(&self) -> Result<EncodingMode> {
        match self.signal_encoding.as_deref() {
            None => Ok(EncodingMode::detect(&self.signal)),
            Some("plain") => Ok(EncodingMode::PlainField),
            Some("bytes") => Ok(EncodingMode::HashedBytes),
            Some("string") => Ok(EncodingMode::HashedString),
            Some(other) => bail!("unknown signal encoding `{other}`"),
        }
    }

    fn config(&self) -> Config {
        Config {
            sequencer_url: self.sequencer_url.clone(),
            dev_portal_url: self.dev_portal_url.clone(),
            auth_token: self.auth_token.clone(),
            app_id: self.app_id.clone(),
            action: self.action.clone(),
            credential_type: self.credential_type.clone(),
            group_id: self.group_id,
            artifacts: CircuitArtifacts {
                wasm: self.wasm.clone(),
                zkey: self.zkey.clone(),
            },
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let config = args.config();

    let identity = args.identity()?;
    let commitment = identity.commitment();
    println!(
        "ℹ️ retrieved idComm, fetching inclusion proof: {}",
        field_to_hex(commitment)
    );

    let sequencer = SequencerClient::new(
        &config.sequencer_url,
        config.auth_token.clone(),
        config.group_id,
    );
    let inclusion = match sequencer
        .inclusion_proof(commitment)
        .wrap_err("could not fetch inclusion proof")?
    {
        InclusionProofStatus::Ready(inclusion) => inclusion,
        InclusionProofStatus::Pending => {
            println!("🤔 inclusion proof not ready yet, try again in a few seconds");
            return Ok(());
        }
    };
    println!("ℹ️ inclusion proof fetched, continuing...");

    let merkle_proof = MerkleProof::from_inclusion_record(&inclusion.proof)
        .wrap_err("sequencer returned a malformed inclusion proof")?;

    let signal_hash = encode_field(args.signal_encoding()?, &args.signal)
        .wrap_err("could not encode the signal")?
        .hash();
    let external_nullifier = generate_external_nullifier(&config.app_id, &config.action).hash();

    let circuit = Circuit::load(&config.artifacts).wrap_err("could not load circuit artifacts")?;
    let record = generate_proof_record(
        &circuit,
        &identity,
        &merkle_proof,
        external_nullifier,
        signal_hash,
    )?;

    if record.merkle_root != inclusion.root {
        bail!(
            "prover returned root {} but the sequencer reported {}",
            field_to_hex(record.merkle_root),
            field_to_hex(inclusion.root)
        );
    }

    let packed = PackedProof::from(Proof::unpack(record.proof));
    println!("🔑 proof generated!");
    println!("{}", serde_json::to_string_pretty(&record)?);
    println!("ℹ️ packed proof: {packed}");

    if circuit.verify(&record)? {
        println!("☑️  proof verified locally!");
    } else {
        return Err(eyre!("unable to verify proof locally"));
    }

    if args.no_verify {
        return Ok(());
    }

    sequencer
        .verify_proof(&record)
        .wrap_err("proof verification with the sequencer failed, something is wrong")?;
    println!("✅ proof verified with the sequencer!");

    let dev_portal = DevPortalClient::new(&config.dev_portal_url);
    dev_portal
        .verify(
            &config.app_id,
            &record,
            &config.credential_type,
            &config.action,
            &args.signal,
        )
        .wrap_err("proof verification with the Dev Portal failed")?;
    println!("✅ proof verified with the Dev Portal!");

    Ok(())
}
