// ABOUTME: Reconnecting duplex TCP link (spec component C1)
// ABOUTME: Owns the socket exclusively; reader/writer access it only through read()/write()

use std::net::{Shutdown, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use socket2::{Domain, Socket, SockRef, TcpKeepalive, Type};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{Result, TransportError};
use crate::primitives::MutexCell;

/// Which side of the TCP handshake this link performs.
#[derive(Clone, Debug)]
pub enum Role {
    /// Initiate the connection to a fixed peer, retrying on failure.
    Client { host: String, port: u16 },
    /// Listen for a single peer, replacing it if a new one connects.
    Server { bind_addr: SocketAddr },
}

/// One of `Disconnected`, `Connecting`, `Connected`. Reads and writes only
/// succeed while `Connected`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

const KEEPALIVE_IDLE: Duration = Duration::from_secs(1);
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);
const KEEPALIVE_RETRIES: u32 = 3;
const IDLE_POLL: Duration = Duration::from_millis(250);

/// A single connection to a fixed peer that transparently re-establishes
/// itself on loss. The socket is exclusively owned here; readers and
/// writers never see a `TcpStream` directly, only `read()`/`write()`.
pub struct DuplexLink {
    role: Role,
    retry_timeout: Duration,
    running: MutexCell<bool>,
    state: Mutex<ConnectionState>,
    stream: Mutex<Option<Arc<TcpStream>>>,
    notify: Notify,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DuplexLink {
    pub fn new(role: Role, retry_timeout: Duration) -> Self {
        Self {
            role,
            retry_timeout,
            running: MutexCell::new(false),
            state: Mutex::new(ConnectionState::Disconnected),
            stream: Mutex::new(None),
            notify: Notify::new(),
            task: Mutex::new(None),
        }
    }

    /// Spawn the reconnect task. Calling this twice without an intervening
    /// `stop()` is a programmer error.
    pub fn start(self: &Arc<Self>) {
        if self.running.get() {
            panic!("DuplexLink::start called while already running");
        }
        self.running.set(true);
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.reconnect_loop().await });
        *self.task.lock().unwrap() = Some(handle);
    }

    /// Idempotent. Closes the socket, unblocking any pending read/write
    /// with `NoConnection`, and joins the reconnect task.
    pub async fn stop(&self) {
        if !self.running.get() {
            return;
        }
        self.running.set(false);
        self.mark_disconnected();
        let handle = self.task.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.state.lock().unwrap() == ConnectionState::Connected
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    /// Read up to `max` bytes. Blocks until some data arrives or the link
    /// is not currently connected, in which case `NoConnection` is raised
    /// immediately — callers are expected to retry after a short sleep.
    ///
    /// The stream handle stays reachable through `self.stream` for the
    /// whole read, not just the lock acquisition: `stop()` closes the same
    /// socket this is blocked on, which is what actually unblocks it.
    pub async fn read(&self, max: usize) -> Result<Vec<u8>> {
        if !self.running.get() {
            return Err(TransportError::Stopped);
        }
        let stream = self.stream.lock().unwrap().clone();
        let Some(stream) = stream else {
            return Err(TransportError::NoConnection);
        };

        let mut buf = vec![0u8; max.max(1)];
        match (&*stream).read(&mut buf).await {
            Ok(0) => {
                self.mark_disconnected();
                Err(TransportError::NoConnection)
            }
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e) => {
                warn!("link read error: {e}");
                self.mark_disconnected();
                Err(TransportError::NoConnection)
            }
        }
    }

    /// Write all of `data`. Raises `NoConnection` immediately if not
    /// currently connected, or if the write fails partway.
    pub async fn write(&self, data: &[u8]) -> Result<()> {
        if !self.running.get() {
            return Err(TransportError::Stopped);
        }
        let stream = self.stream.lock().unwrap().clone();
        let Some(stream) = stream else {
            return Err(TransportError::NoConnection);
        };

        match (&*stream).write_all(data).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("link write error: {e}");
                self.mark_disconnected();
                Err(TransportError::NoConnection)
            }
        }
    }

    /// Closes the socket, which unblocks any read or write currently
    /// parked on it with an error — the same mechanism `stop()` relies on
    /// to return promptly instead of waiting for the peer.
    fn mark_disconnected(&self) {
        let mut state = self.state.lock().unwrap();
        if *state != ConnectionState::Disconnected {
            info!("link disconnected");
        }
        *state = ConnectionState::Disconnected;
        drop(state);
        if let Some(stream) = self.stream.lock().unwrap().take() {
            let _ = SockRef::from(&*stream).shutdown(Shutdown::Both);
        }
        self.notify.notify_waiters();
    }

    fn adopt_stream(&self, stream: TcpStream) {
        *self.stream.lock().unwrap() = Some(Arc::new(stream));
        *self.state.lock().unwrap() = ConnectionState::Connected;
        self.notify.notify_waiters();
    }

    async fn reconnect_loop(self: Arc<Self>) {
        while self.running.get() {
            *self.state.lock().unwrap() = ConnectionState::Connecting;

            let stream = match &self.role {
                Role::Client { host, port } => self.connect_client(host, *port).await,
                Role::Server { bind_addr } => self.accept_server(*bind_addr).await,
            };

            match stream {
                Some(stream) => self.adopt_stream(stream),
                None => {
                    tokio::time::sleep(self.retry_timeout).await;
                    continue;
                }
            }

            while self.running.get() && self.is_connected() {
                tokio::select! {
                    _ = self.notify.notified() => {}
                    _ = tokio::time::sleep(IDLE_POLL) => {}
                }
            }
        }
        *self.state.lock().unwrap() = ConnectionState::Disconnected;
    }

    async fn connect_client(&self, host: &str, port: u16) -> Option<TcpStream> {
        info!("connecting to {host}:{port}");
        match TcpStream::connect((host, port)).await {
            Ok(stream) => {
                info!("connected to {host}:{port}");
                Some(stream)
            }
            Err(e) => {
                warn!("connect to {host}:{port} failed: {e}");
                None
            }
        }
    }

    async fn accept_server(&self, bind_addr: SocketAddr) -> Option<TcpStream> {
        let listener = match bind_with_backlog(bind_addr, 1) {
            Ok(listener) => listener,
            Err(e) => {
                warn!("bind {bind_addr} failed: {e}");
                return None;
            }
        };
        info!("listening on {bind_addr}");
        loop {
            tokio::select! {
                result = listener.accept() => {
                    return match result {
                        Ok((stream, peer)) => {
                            info!("accepted connection from {peer}");
                            if let Err(e) = apply_keepalive(&stream) {
                                warn!("failed to set keepalive: {e}");
                            }
                            Some(stream)
                        }
                        Err(e) => {
                            warn!("accept failed: {e}");
                            None
                        }
                    };
                }
                _ = tokio::time::sleep(IDLE_POLL) => {
                    if !self.running.get() {
                        return None;
                    }
                }
            }
        }
    }
}

fn bind_with_backlog(addr: SocketAddr, backlog: i32) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    TcpListener::from_std(socket.into())
}

fn apply_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    let socket = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(KEEPALIVE_IDLE)
        .with_interval(KEEPALIVE_INTERVAL)
        .with_retries(KEEPALIVE_RETRIES);
    socket.set_tcp_keepalive(&keepalive)
}
