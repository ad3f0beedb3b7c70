#![allow(missing_docs)]
use std::net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener};

use rand::{Rng, distr::Alphanumeric, rng};
use tokio::{
    io::AsyncReadExt,
    net::TcpStream,
    time::{Duration, Instant, sleep},
};

const WAIT_FOR_SECS: u64 = 5; // The default time to wait in `wait_for_tcp`
const WAIT_FOR_PAUSE_MILLIS: u64 = 5; // The pause between retries

/// Allocates an ephemeral loopback address for a test server.
pub fn next_addr() -> SocketAddr {
    let listener =
        StdTcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("failed to bind ephemeral port");
    listener
        .local_addr()
        .expect("failed to read bound local address")
}

pub fn trace_init() {
    crate::trace::test_init();
}

pub fn random_string(len: usize) -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn random_lines(len: usize) -> impl Iterator<Item = String> {
    std::iter::repeat_with(move || random_string(len))
}

/// Retries connecting until `addr` accepts, or panics after a deadline.
pub async fn wait_for_tcp(addr: SocketAddr) {
    let deadline = Instant::now() + Duration::from_secs(WAIT_FOR_SECS);
    loop {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        if Instant::now() >= deadline {
            panic!("timed out waiting for {addr} to accept connections");
        }
        sleep(Duration::from_millis(WAIT_FOR_PAUSE_MILLIS)).await;
    }
}

/// Reads exactly `len` bytes from the stream.
pub async fn recv_exact(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    stream
        .read_exact(&mut buf)
        .await
        .expect("peer closed before sending the expected bytes");
    buf
}
