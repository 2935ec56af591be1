//! In-process RESP responder for tests that need a live socket but no Redis.
//!
//! Understands just enough of the protocol for pool bookkeeping: `PING`
//! (bare or with a message), `GET`, `INCR` and `DECR`. Any other command
//! is answered with `+OK`. A `GET` of [`DROP_KEY`] closes the socket
//! mid-command, and [`FakeRedis::fail_next_pings`] makes bare `PING`s do the
//! same.

use redkit_config::AppConfig;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Key whose `GET` makes the server drop the connection.
pub const DROP_KEY: &str = "drop-connection";

/// Value returned for every other `GET`.
pub const GET_VALUE: &str = "v";

#[derive(Default)]
struct State {
    commands: Mutex<Vec<String>>,
    ping_failures: AtomicUsize,
    connections: AtomicUsize,
}

impl State {
    /// Returns the reply, or `None` to close the socket.
    fn reply(&self, args: &[String]) -> Option<String> {
        let name = args.first()?.to_ascii_uppercase();
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.clone());

        match name.as_str() {
            "PING" => match args.get(1) {
                Some(message) => Some(bulk(message)),
                None if self.take_ping_failure() => None,
                None => Some("+PONG\r\n".to_string()),
            },
            "GET" if args.get(1).is_some_and(|key| key == DROP_KEY) => None,
            "GET" => Some(bulk(GET_VALUE)),
            "INCR" => Some(":1\r\n".to_string()),
            "DECR" => Some(":-1\r\n".to_string()),
            _ => Some("+OK\r\n".to_string()),
        }
    }

    fn take_ping_failure(&self) -> bool {
        self.ping_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// A fake Redis listening on an ephemeral local port.
pub struct FakeRedis {
    addr: SocketAddr,
    state: Arc<State>,
    task: JoinHandle<()>,
}

impl FakeRedis {
    /// Binds `127.0.0.1:0` and starts accepting connections.
    pub async fn start() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(State::default());
        let task = tokio::spawn(serve(listener, Arc::clone(&state)));
        Ok(Self { addr, state, task })
    }

    /// A configuration pointing at this server with short timeouts.
    #[must_use]
    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.redis.host = self.addr.ip().to_string();
        config.redis.port = self.addr.port();
        config.redis.timeout_ms = 1000;
        config.pool.max_wait_ms = 1000;
        config
    }

    /// Makes the next `n` bare `PING`s close their connection.
    pub fn fail_next_pings(&self, n: usize) {
        self.state.ping_failures.store(n, Ordering::SeqCst);
    }

    /// Upper-cased names of every command received so far.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.state
            .commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of connections accepted so far.
    #[must_use]
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }
}

impl Drop for FakeRedis {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(listener: TcpListener, state: Arc<State>) {
    while let Ok((stream, _)) = listener.accept().await {
        state.connections.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(handle(stream, Arc::clone(&state)));
    }
}

async fn handle(stream: TcpStream, state: Arc<State>) {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    while let Ok(Some(args)) = read_command(&mut reader).await {
        let Some(reply) = state.reply(&args) else {
            return;
        };
        if write.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}

async fn read_command<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<Option<Vec<String>>> {
    let Some(header) = read_line(reader).await? else {
        return Ok(None);
    };
    let count = parse_len(&header, '*')?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let line = read_line(reader)
            .await?
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        let len = parse_len(&line, '$')?;

        let mut buf = vec![0; len + 2];
        reader.read_exact(&mut buf).await?;
        buf.truncate(len);
        args.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(Some(args))
}

async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end().to_string()))
}

fn parse_len(line: &str, marker: char) -> io::Result<usize> {
    line.strip_prefix(marker)
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("unexpected frame: {line}")))
}

fn bulk(value: &str) -> String {
    format!("${}\r\n{}\r\n", value.len(), value)
}
