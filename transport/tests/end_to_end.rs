use std::io::IsTerminal;
use std::time::Duration;

use eyre::WrapErr;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use transport::testing::SimulatorStub;
use transport::{Bank, Client, ClientEvent, Command, ConnectionState, Update};

async fn get_random_tcp_port() -> eyre::Result<u16> {
    for _ in 0..50 {
        match TcpListener::bind("127.0.0.1:0").await {
            Ok(listener) => {
                let addr = listener.local_addr().unwrap();
                let port = addr.port();
                return Ok(port);
            }
            Err(e) => {
                tracing::warn!(%e, "binding");
            }
        }
    }

    eyre::bail!("could not get free port");
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<ClientEvent>) -> ClientEvent {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for client event")
        .expect("event channel closed")
}

#[tokio::test]
async fn commands_queued_while_connecting_flush_in_order() -> eyre::Result<()> {
    let port = get_random_tcp_port().await.wrap_err("getting free port")?;
    let addr = format!("127.0.0.1:{port}");

    // Nothing is listening yet, so the client stays in Connecting and the
    // dial loop retries in the background.
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let client = Client::connect(addr.clone(), events_tx);

    client.send(Command::Reset).wrap_err("queueing reset")?;
    client.send(Command::Stop).wrap_err("queueing stop")?;
    assert_eq!(client.state(), ConnectionState::Connecting);

    // Bring the simulator up and let a retry find it.
    let listener = TcpListener::bind(&addr).await.wrap_err("binding")?;
    let (stream, _) = listener.accept().await.wrap_err("accepting")?;
    let mut stub = SimulatorStub::new(stream);

    assert_eq!(next_event(&mut events_rx).await, ClientEvent::Connected);

    // The queue drains in send order.
    assert_eq!(stub.recv_command().await, Some(json!(["reset"])));
    assert_eq!(stub.recv_command().await, Some(json!(["stop"])));

    Ok(())
}

#[tokio::test]
async fn updates_flow_until_the_simulator_goes_away() -> eyre::Result<()> {
    let port = get_random_tcp_port().await.wrap_err("getting free port")?;
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await.wrap_err("binding")?;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let client = Client::connect(addr, events_tx);

    let (stream, _) = listener.accept().await.wrap_err("accepting")?;
    let mut stub = SimulatorStub::new(stream);

    assert_eq!(next_event(&mut events_rx).await, ClientEvent::Connected);

    stub.push_batch(vec![json!(["banking", "IRQ"]), json!(["r0", "0000002a"])])
        .await;

    let ClientEvent::Batch(batch) = next_event(&mut events_rx).await else {
        panic!("expected a batch");
    };
    assert_eq!(
        batch,
        vec![
            Update::Banking(Bank::Irq),
            Update::Field {
                id: "r0".to_string(),
                value: "0000002a".to_string(),
            },
        ]
    );

    // The simulator going away is terminal.
    drop(stub);
    assert!(matches!(
        next_event(&mut events_rx).await,
        ClientEvent::ConnectionLost { .. }
    ));

    let mut state = client.state_changes();
    state
        .wait_for(|state| *state == ConnectionState::Closed)
        .await
        .wrap_err("waiting for closed state")?;
    assert!(client.send(Command::Reset).is_err());

    Ok(())
}

#[tokio::test]
async fn garbage_body_does_not_end_the_session() -> eyre::Result<()> {
    let port = get_random_tcp_port().await.wrap_err("getting free port")?;
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await.wrap_err("binding")?;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let _client = Client::connect(addr, events_tx);

    let (stream, _) = listener.accept().await.wrap_err("accepting")?;
    let mut stub = SimulatorStub::new(stream);

    assert_eq!(next_event(&mut events_rx).await, ClientEvent::Connected);

    // A frame whose body is not a batch is dropped, not fatal.
    stub.push_raw(json!("not a batch")).await;
    stub.push_batch(vec![json!(["nextline", 7])]).await;

    assert_eq!(
        next_event(&mut events_rx).await,
        ClientEvent::Batch(vec![Update::NextLine(7)])
    );

    Ok(())
}

#[ctor::ctor]
fn init() {
    let in_ci = std::env::var("CI")
        .map(|val| val == "true")
        .unwrap_or(false);

    if std::io::stderr().is_terminal() || in_ci {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .json()
            .try_init();
    }

    let _ = color_eyre::install();
}
