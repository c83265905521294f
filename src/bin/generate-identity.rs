//! Create a Semaphore identity and register its commitment with the signup
//! sequencer.

use clap::Parser;
use color_eyre::eyre::WrapErr as _;
use color_eyre::Result;
use rand::RngCore as _;
use world_id_debugger::client::SequencerClient;
use world_id_debugger::config::DEFAULT_SEQUENCER_URL;
use world_id_debugger::field_to_hex;
use world_id_debugger::identity::Identity;

#[derive(Parser, Debug)]
#[command(about = "Generate a Semaphore identity and insert it into the group")]
struct Args {
    /// Derive the identity from this seed instead of fresh randomness.
    #[clap(long)]
    seed: Option<String>,

    /// Only print the identity, do not register it with the sequencer.
    #[clap(long)]
    no_insert: bool,

    #[clap(long, env = "SEQUENCER_URL", default_value = DEFAULT_SEQUENCER_URL)]
    sequencer_url: String,

    /// Credential part of the sequencer's `Authorization: Basic` header.
    #[clap(long, env = "SEQUENCER_AUTH_TOKEN")]
    auth_token: Option<String>,

    /// Group to insert into, for sequencers that host more than one.
    #[clap(long, env = "GROUP_ID")]
    group_id: Option<u64>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let identity = match &args.seed {
        Some(seed) => Identity::from_seed(seed),
        None => {
            let mut secret = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut secret);
            Identity::from_secret(&secret)
        }
    };

    println!(
        "ℹ️ encoded identity commitment: {}",
        field_to_hex(identity.commitment())
    );

    if !args.no_insert {
        let client = SequencerClient::new(&args.sequencer_url, args.auth_token, args.group_id);
        client
            .insert_identity(identity.commitment())
            .wrap_err("identity commitment not inserted")?;
        println!("✅ identity commitment inserted!");
    }

    println!("ℹ️ identity trapdoor:  {}", field_to_hex(identity.trapdoor));
    println!("ℹ️ identity nullifier: {}", field_to_hex(identity.nullifier));

    Ok(())
}
