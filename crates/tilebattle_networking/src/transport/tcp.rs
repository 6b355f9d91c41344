//! # TCP Transport
//!
//! Length-prefixed frames over a TCP stream.
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────────┐
//! │ Length (4, BE u32)   │ Frame (Length bytes)         │
//! └──────────────────────┴──────────────────────────────┘
//! ```
//!
//! Each link owns one reader thread that turns the stream into
//! [`LinkEvent`]s. Writes happen on the caller's thread under a lock.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use tilebattle_shared::MAX_FRAME_SIZE;

use super::{Link, LinkEvent, Transport};
use crate::error::{NetError, NetResult};

/// Size of the length prefix.
const HEADER_SIZE: usize = 4;

/// Outbound half of a TCP link.
pub struct TcpTransport {
    writer: Mutex<TcpStream>,
    peer: SocketAddr,
    closed: Arc<AtomicBool>,
}

impl Transport for TcpTransport {
    fn send(&self, frame: &[u8]) -> NetResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(NetError::Disconnected);
        }
        let mut writer = self.writer.lock();
        write_frame(&mut *writer, frame)
    }

    fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::info!("Closing link to {}", self.peer);
        // Also wakes our reader thread, which reports Closed
        if let Err(e) = self.writer.lock().shutdown(Shutdown::Both) {
            tracing::debug!("Shutdown of {} failed: {}", self.peer, e);
        }
    }

    fn peer(&self) -> String {
        self.peer.to_string()
    }
}

/// Listening side of a TCP link.
pub struct TcpHost {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpHost {
    /// Binds a listener.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Transport`] if the address cannot be bound.
    pub fn listen(addr: impl ToSocketAddrs) -> NetResult<Self> {
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Hosting on {}", local_addr);
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address actually bound (useful with port 0).
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Blocks until a guest connects.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Transport`] if accepting fails.
    pub fn accept(&self) -> NetResult<Link> {
        self.listener.set_nonblocking(false)?;
        let (stream, addr) = self.listener.accept()?;
        tracing::info!("Guest connected from {}", addr);
        link_from_stream(stream)
    }

    /// Accepts a waiting guest without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Transport`] if accepting fails.
    pub fn try_accept(&self) -> NetResult<Option<Link>> {
        self.listener.set_nonblocking(true)?;
        match self.listener.accept() {
            Ok((stream, addr)) => {
                stream.set_nonblocking(false)?;
                tracing::info!("Guest connected from {}", addr);
                link_from_stream(stream).map(Some)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Resolves `host:port` to the first matching address.
///
/// # Errors
///
/// Returns [`NetError::ConnectFailure`] if the name does not resolve.
pub fn resolve(host: &str, port: u16) -> NetResult<SocketAddr> {
    let failure = |reason: String| NetError::ConnectFailure {
        addr: format!("{host}:{port}"),
        reason,
    };
    (host, port)
        .to_socket_addrs()
        .map_err(|e| failure(e.to_string()))?
        .next()
        .ok_or_else(|| failure("no address found".into()))
}

/// Dials a host, giving up after `timeout`.
///
/// # Errors
///
/// Returns [`NetError::ConnectFailure`] if the host is unreachable or the
/// attempt times out.
pub fn connect(addr: SocketAddr, timeout: Duration) -> NetResult<Link> {
    let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|e| {
        tracing::warn!("Failed to connect to {}: {}", addr, e);
        NetError::ConnectFailure {
            addr: addr.to_string(),
            reason: e.to_string(),
        }
    })?;
    tracing::info!("Connected to host {}", addr);
    link_from_stream(stream)
}

/// Wraps a connected stream and starts its reader thread.
fn link_from_stream(stream: TcpStream) -> NetResult<Link> {
    stream.set_nodelay(true)?;
    let peer = stream.peer_addr()?;
    let reader = stream.try_clone()?;
    let closed = Arc::new(AtomicBool::new(false));
    let (tx, rx) = unbounded();

    spawn_reader(reader, tx, Arc::clone(&closed), peer)?;

    let transport = TcpTransport {
        writer: Mutex::new(stream),
        peer,
        closed,
    };
    Ok(Link::new(Arc::new(transport), rx))
}

fn spawn_reader(
    mut stream: TcpStream,
    tx: Sender<LinkEvent>,
    closed: Arc<AtomicBool>,
    peer: SocketAddr,
) -> NetResult<()> {
    thread::Builder::new()
        .name(format!("tilebattle-reader-{peer}"))
        .spawn(move || loop {
            match read_frame(&mut stream) {
                Ok(Some(frame)) => {
                    if tx.send(LinkEvent::Frame(frame)).is_err() {
                        // Nobody is listening any more
                        break;
                    }
                }
                Ok(None) => {
                    tracing::debug!("Stream from {} ended", peer);
                    let _ = tx.send(LinkEvent::Closed);
                    break;
                }
                Err(e) => {
                    let event = if closed.load(Ordering::Acquire) {
                        LinkEvent::Closed
                    } else {
                        tracing::warn!("Read from {} failed: {}", peer, e);
                        LinkEvent::Error(e)
                    };
                    let _ = tx.send(event);
                    break;
                }
            }
        })?;
    Ok(())
}

/// Reads one frame. `Ok(None)` means the stream ended cleanly.
///
/// # Errors
///
/// Returns [`NetError::Transport`] on I/O failure or an oversized frame.
pub fn read_frame(reader: &mut impl Read) -> NetResult<Option<Vec<u8>>> {
    let mut header = [0u8; HEADER_SIZE];
    let mut filled = 0;
    while filled < HEADER_SIZE {
        match reader.read(&mut header[filled..]) {
            // Clean close only on a frame boundary
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(NetError::Transport(format!(
                    "stream closed after {filled} of {HEADER_SIZE} header bytes"
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(NetError::Transport(format!(
            "frame of {len} bytes exceeds limit of {MAX_FRAME_SIZE}"
        )));
    }

    let mut frame = vec![0u8; len];
    reader.read_exact(&mut frame)?;
    Ok(Some(frame))
}

/// Writes one frame with its length prefix.
///
/// # Errors
///
/// Returns [`NetError::Transport`] on I/O failure or an oversized frame.
pub fn write_frame(writer: &mut impl Write, frame: &[u8]) -> NetResult<()> {
    let len = u32::try_from(frame.len())
        .ok()
        .filter(|&len| len as usize <= MAX_FRAME_SIZE)
        .ok_or_else(|| {
            NetError::Transport(format!(
                "frame of {} bytes exceeds limit of {MAX_FRAME_SIZE}",
                frame.len()
            ))
        })?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + frame.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(frame);
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}
