use std::{net::SocketAddr, sync::Arc, time::Duration};

use ringline::{
    config::{DEFAULT_RECV_BUFFER_SIZE, LISTEN_BACKLOG},
    device::Device,
    server::Server,
    test_util::{random_lines, recv_exact, trace_init, wait_for_tcp},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    task::JoinHandle,
    time::timeout,
};
use tokio_util::sync::CancellationToken;

async fn start_server(device: Arc<Device>) -> (SocketAddr, CancellationToken, JoinHandle<()>) {
    trace_init();
    let server = Server::bind(
        device,
        "127.0.0.1:0".parse().unwrap(),
        LISTEN_BACKLOG,
        DEFAULT_RECV_BUFFER_SIZE,
    )
    .expect("failed to bind test server");
    let addr = server.local_addr().expect("no local address");

    let shutdown = CancellationToken::new();
    let task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            server.run(shutdown).await.expect("server failed");
        }
    });
    wait_for_tcp(addr).await;
    (addr, shutdown, task)
}

async fn send(stream: &mut TcpStream, bytes: &[u8]) {
    stream.write_all(bytes).await.unwrap();
    stream.flush().await.unwrap();
}

#[tokio::test]
async fn echoes_the_log_on_newline() {
    let (addr, _shutdown, _task) = start_server(Arc::new(Device::new())).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    send(&mut stream, b"hello\n").await;
    assert_eq!(recv_exact(&mut stream, 6).await, b"hello\n");
}

#[tokio::test]
async fn echo_covers_commands_from_other_clients() {
    let device = Arc::new(Device::new());
    let (addr, _shutdown, _task) = start_server(Arc::clone(&device)).await;

    let mut first = TcpStream::connect(addr).await.unwrap();
    send(&mut first, b"one\n").await;
    assert_eq!(recv_exact(&mut first, 4).await, b"one\n");

    let mut second = TcpStream::connect(addr).await.unwrap();
    send(&mut second, b"two\n").await;
    assert_eq!(recv_exact(&mut second, 8).await, b"one\ntwo\n");
}

#[tokio::test]
async fn partial_command_is_completed_by_a_later_chunk() {
    let (addr, _shutdown, _task) = start_server(Arc::new(Device::new())).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    send(&mut stream, b"ab").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    send(&mut stream, b"cd\n").await;
    assert_eq!(recv_exact(&mut stream, 5).await, b"abcd\n");
}

#[tokio::test]
async fn partial_command_is_completed_by_another_client() {
    let (addr, _shutdown, _task) = start_server(Arc::new(Device::new())).await;

    let mut quiet = TcpStream::connect(addr).await.unwrap();
    send(&mut quiet, b"AB").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut talker = TcpStream::connect(addr).await.unwrap();
    send(&mut talker, b"complete\n").await;
    assert_eq!(recv_exact(&mut talker, 11).await, b"ABcomplete\n");
}

#[tokio::test]
async fn no_newline_means_no_reply() {
    let (addr, _shutdown, _task) = start_server(Arc::new(Device::new())).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    send(&mut stream, b"never finished").await;

    let mut byte = [0u8; 1];
    let read = timeout(Duration::from_millis(200), stream.read(&mut byte)).await;
    assert!(read.is_err(), "unexpected reply to an unterminated command");
}

#[tokio::test]
async fn each_newline_echoes_the_bounded_window() {
    let (addr, _shutdown, _task) = start_server(Arc::new(Device::new())).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut stored: Vec<String> = Vec::new();
    for line in random_lines(32).take(15) {
        let command = format!("{line}\n");
        send(&mut stream, command.as_bytes()).await;

        stored.push(command);
        if stored.len() > 10 {
            stored.remove(0);
        }
        let expected = stored.concat();
        let reply = recv_exact(&mut stream, expected.len()).await;
        assert_eq!(reply, expected.as_bytes());
    }
}

#[tokio::test]
async fn seek_directive_replies_from_the_new_cursor() {
    let (addr, _shutdown, _task) = start_server(Arc::new(Device::new())).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    send(&mut stream, b"one\n").await;
    recv_exact(&mut stream, 4).await;
    send(&mut stream, b"two\n").await;
    recv_exact(&mut stream, 8).await;
    send(&mut stream, b"three\n").await;
    recv_exact(&mut stream, 14).await;

    send(&mut stream, b"AESDCHAR_IOCSEEKTO:1,1\n").await;
    assert_eq!(recv_exact(&mut stream, 9).await, b"wo\nthree\n");

    // The directive itself was not stored.
    send(&mut stream, b"done\n").await;
    assert_eq!(
        recv_exact(&mut stream, 19).await,
        b"one\ntwo\nthree\ndone\n"
    );
}

#[tokio::test]
async fn malformed_directive_is_stored_as_data() {
    let (addr, _shutdown, _task) = start_server(Arc::new(Device::new())).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let bogus = b"AESDCHAR_IOCSEEKTO:one,two\n";
    send(&mut stream, bogus).await;
    assert_eq!(recv_exact(&mut stream, bogus.len()).await, bogus);
}

#[tokio::test]
async fn out_of_range_directive_gets_no_reply_and_is_not_stored() {
    let (addr, _shutdown, _task) = start_server(Arc::new(Device::new())).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    send(&mut stream, b"one\n").await;
    recv_exact(&mut stream, 4).await;

    send(&mut stream, b"AESDCHAR_IOCSEEKTO:5,0\n").await;
    // Keep the directive and the next command in separate received
    // chunks.
    tokio::time::sleep(Duration::from_millis(50)).await;
    send(&mut stream, b"two\n").await;
    // The next bytes on the wire are the echo for "two\n" alone.
    assert_eq!(recv_exact(&mut stream, 8).await, b"one\ntwo\n");
}
