use std::error::Error;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use matchsync::{ClientMessage, Navigator, Settings, SyncClient, SyncEvent};

/// A basic example showing how to connect, keep the local session state in
/// sync, and drive screen navigation from it.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // See the crate's connection and reconciliation logs while the example
    // runs.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Step 1: Pick an identity and read the endpoints from the environment
    // (MATCHSYNC_API_BASE_URL, MATCHSYNC_WS_URL, ...).
    let user_id = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(2);
    let settings = Settings::from_env();
    let client = SyncClient::new(user_id, settings);

    // Step 2: Subscribe to events before starting the connection manager.
    let mut events = client.event_receiver();
    client.start().await;

    // Step 3: Keep the user on the screen the session state maps to. A real
    // application would hand its router here instead of println.
    let _navigator = client.spawn_navigator(Navigator::new(
        "/lobbies",
        Box::new(|path| println!("navigate to {path}")),
    ));

    // Step 4: React to the event stream until the connection gives out.
    loop {
        match events.recv().await {
            Ok(SyncEvent::Connected) => {
                println!("connected, joining the matching pool");
                client.send(ClientMessage::join_pool()).await?;
            }
            Ok(SyncEvent::Reconciled(snapshot)) => {
                println!(
                    "session restored: match={:?} status={:?}",
                    snapshot.match_id, snapshot.status
                );
            }
            Ok(SyncEvent::ReconcileFailed) => {
                println!("restore failed, session state reset");
            }
            Ok(SyncEvent::Disconnected { attempt }) => {
                println!("connection lost, retry {attempt} scheduled");
            }
            Ok(SyncEvent::ConnectionAbandoned) => {
                println!("retries exhausted, giving up");
                break;
            }
            Err(_) => break,
        }
    }

    client.stop().await?;
    Ok(())
}
