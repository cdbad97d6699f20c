//! Integration tests for the stream connector against a real unix-socket
//! event source speaking newline-delimited JSON.

#![cfg(unix)]

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::UnixListener;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use dockwatch::{BackoffPolicy, Connector, Endpoint, JitterPolicy, RawEvent};

fn fast_backoff() -> BackoffPolicy {
    BackoffPolicy {
        first: Duration::from_millis(10),
        max: Duration::from_millis(50),
        factor: 2.0,
        jitter: JitterPolicy::None,
    }
}

fn socket_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("events.sock")
}

fn actor_id(raw: &RawEvent) -> String {
    raw.str_field(&["id"]).unwrap_or("<missing>").to_string()
}

async fn recv_event(
    rx: &mut tokio::sync::mpsc::Receiver<RawEvent>,
    within: Duration,
) -> Option<RawEvent> {
    timeout(within, rx.recv()).await.expect("receive timed out")
}

#[tokio::test]
async fn yields_events_in_order_and_skips_malformed_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir);
    let listener = UnixListener::bind(&path).unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream
            .write_all(
                b"{\"Type\":\"container\",\"Action\":\"start\",\"id\":\"c1\"}\n\
                  not json at all\n\
                  \n\
                  {\"Type\":\"container\",\"Action\":\"die\",\"id\":\"c2\"}\n",
            )
            .await
            .unwrap();
        stream.flush().await.unwrap();
        // hold the connection open so the connector keeps reading
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    let token = CancellationToken::new();
    let connector = Connector::new(Endpoint::Unix(path), None, fast_backoff(), token.clone());
    let mut rx = connector.watch();

    let first = recv_event(&mut rx, Duration::from_secs(2)).await.unwrap();
    assert_eq!(actor_id(&first), "c1");

    // the malformed frame and the blank line are skipped, not surfaced
    let second = recv_event(&mut rx, Duration::from_secs(2)).await.unwrap();
    assert_eq!(actor_id(&second), "c2");

    token.cancel();
    assert!(recv_event(&mut rx, Duration::from_secs(2)).await.is_none());
}

#[tokio::test]
async fn reconnects_after_peer_drops_the_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir);
    let listener = UnixListener::bind(&path).unwrap();

    tokio::spawn(async move {
        let (mut first, _) = listener.accept().await.unwrap();
        first
            .write_all(b"{\"Type\":\"container\",\"Action\":\"start\",\"id\":\"before\"}\n")
            .await
            .unwrap();
        first.flush().await.unwrap();
        drop(first);

        let (mut second, _) = listener.accept().await.unwrap();
        second
            .write_all(b"{\"Type\":\"container\",\"Action\":\"start\",\"id\":\"after\"}\n")
            .await
            .unwrap();
        second.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    let token = CancellationToken::new();
    let connector = Connector::new(Endpoint::Unix(path), None, fast_backoff(), token.clone());
    let mut rx = connector.watch();

    let before = recv_event(&mut rx, Duration::from_secs(2)).await.unwrap();
    assert_eq!(actor_id(&before), "before");

    // the peer dropped the first connection; the connector reconnects on its
    // own and resumes the sequence without surfacing an error
    let after = recv_event(&mut rx, Duration::from_secs(5)).await.unwrap();
    assert_eq!(actor_id(&after), "after");

    token.cancel();
}

#[tokio::test]
async fn survives_connect_failures_until_the_source_appears() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir);

    let token = CancellationToken::new();
    let connector = Connector::new(
        Endpoint::Unix(path.clone()),
        None,
        fast_backoff(),
        token.clone(),
    );
    let mut rx = connector.watch();

    // let a few connect attempts fail before binding the socket
    tokio::time::sleep(Duration::from_millis(80)).await;
    let listener = UnixListener::bind(&path).unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream
            .write_all(b"{\"Type\":\"container\",\"Action\":\"start\",\"id\":\"late\"}\n")
            .await
            .unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    let event = recv_event(&mut rx, Duration::from_secs(5)).await.unwrap();
    assert_eq!(actor_id(&event), "late");

    token.cancel();
}

#[tokio::test]
async fn shutdown_during_backoff_sleep_ends_the_sequence_promptly() {
    let dir = tempfile::tempdir().unwrap();
    // nothing ever listens here: the connector lives in its backoff loop
    let path = socket_path(&dir);

    let token = CancellationToken::new();
    let connector = Connector::new(
        Endpoint::Unix(path),
        None,
        BackoffPolicy {
            first: Duration::from_secs(60),
            max: Duration::from_secs(60),
            factor: 2.0,
            jitter: JitterPolicy::None,
        },
        token.clone(),
    );
    let mut rx = connector.watch();

    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();

    // the 60s sleep is interrupted well within the test timeout
    assert!(timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("shutdown did not interrupt the backoff sleep")
        .is_none());
}

#[tokio::test]
async fn shutdown_while_blocked_on_read_ends_the_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir);
    let listener = UnixListener::bind(&path).unwrap();

    tokio::spawn(async move {
        // accept and then stay silent: the connector blocks on read
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    let token = CancellationToken::new();
    let connector = Connector::new(Endpoint::Unix(path), None, fast_backoff(), token.clone());
    let mut rx = connector.watch();

    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    assert!(timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("shutdown did not interrupt the blocked read")
        .is_none());
}

#[tokio::test]
async fn dropping_the_receiver_stops_the_watch() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir);
    let listener = UnixListener::bind(&path).unwrap();

    let writer = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        for i in 0.. {
            let line = format!("{{\"Type\":\"container\",\"Action\":\"start\",\"id\":\"c{i}\"}}\n");
            if stream.write_all(line.as_bytes()).await.is_err() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    });

    let token = CancellationToken::new();
    let connector = Connector::new(Endpoint::Unix(path), None, fast_backoff(), token);
    let mut rx = connector.watch();

    assert!(recv_event(&mut rx, Duration::from_secs(2)).await.is_some());
    drop(rx);

    // the connector notices the hang-up and releases the connection, which
    // the writer observes as a failed write
    assert!(timeout(Duration::from_secs(5), writer)
        .await
        .expect("writer never observed the hang-up")
        .unwrap());
}
