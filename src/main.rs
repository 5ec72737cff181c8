//! Runs one greeting end to end inside a single process: a greeter node
//! invites a fresh invitee, which connects over an in-memory stream and
//! gets admitted.
//!
//! Usage: `spacegreet [config.toml]`

use std::sync::Arc;

use log::error;
use tracing::info;

use sg_app::{InMemoryControlLog, NoopObserver};
use sg_core::hints::{HintSet, KeyHint};
use sg_core::keys::{AdmittedKey, KeyKind};
use spacegreet::{
    init_tracing_subscriber, load_config, ChannelPeer, GreeterConfig, GreeterNode, InviteeDriver,
    KeyPair, SpaceId, StreamGreetingTransport,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = init_tracing_subscriber() {
        eprintln!("Failed to initialize tracing: {err}");
    }

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(path)?,
        None => GreeterConfig::defaults(),
    };

    let greeter = Arc::new(KeyPair::generate());
    let space = KeyPair::generate();
    let space_id = SpaceId::new(space.public_key());
    let control_log = Arc::new(InMemoryControlLog::new());
    let hints = HintSet::new(vec![
        KeyHint::new(greeter.public_key(), KeyKind::Identity),
        KeyHint::new(KeyPair::generate().public_key(), KeyKind::Device),
        KeyHint::new(KeyPair::generate().public_key(), KeyKind::Feed),
    ]);

    let node = GreeterNode::start(
        config,
        greeter.clone(),
        control_log.clone(),
        Arc::new(NoopObserver),
    );
    let (descriptor, pin) = node.invite(space_id, Arc::new(hints)).await?;
    println!(
        "invitation {} for space {} (PIN {}), expires {}",
        descriptor.invitation_id,
        descriptor.space_id,
        pin.expose_str(),
        descriptor.expires_at
    );

    let (client, server) = tokio::io::duplex(64 * 1024);
    let connection = node.serve(
        ChannelPeer::anonymous().bound_to(descriptor.invitation_id.clone()),
        server,
    );

    let identity = KeyPair::generate();
    let device = KeyPair::generate();
    let mut driver =
        InviteeDriver::for_descriptor(StreamGreetingTransport::new(client), &descriptor);
    let admission = match driver
        .greet(
            &pin,
            &identity,
            vec![
                AdmittedKey::new(identity.public_key(), KeyKind::Identity),
                AdmittedKey::new(device.public_key(), KeyKind::Device),
            ],
        )
        .await
    {
        Ok(admission) => admission,
        Err(err) => {
            error!("greeting failed: {err}");
            return Err(err.into());
        }
    };
    drop(driver);
    connection.await??;

    info!(hints = admission.hints.len(), "invitee admitted");
    for hint in admission.hints.hints() {
        println!("hint {:?} {}", hint.kind, hint.public_key);
    }
    for envelope in control_log.entries().await {
        println!(
            "control log: greeter {} admitted {} credential(s) into {}",
            envelope.greeter_key,
            envelope.credentials.len(),
            envelope.space_id
        );
    }
    Ok(())
}
