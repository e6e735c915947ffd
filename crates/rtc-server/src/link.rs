//! The best-effort viewer channel.
//!
//! At most one viewer at a time; a new connection replaces the old reference
//! without forcibly closing it (last-writer-wins).  All I/O on the link is
//! fire-and-forget: `send` reports success as a `bool` the caller may
//! ignore, `try_recv` never blocks, and no error on this channel is ever
//! allowed to reach the tick loop.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{info, warn};

const ACCEPT_POLL: Duration = Duration::from_millis(100);
const RECV_BUF: usize = 4_096;

// ── ViewerLink ────────────────────────────────────────────────────────────────

/// Shared handle to the current viewer connection, if any.
#[derive(Clone, Default)]
pub struct ViewerLink {
    conn: Arc<Mutex<Option<TcpStream>>>,
    /// Commands already read off the socket but not yet handed out; one TCP
    /// read can coalesce several newline-separated commands.
    pending: Arc<Mutex<VecDeque<String>>>,
}

impl ViewerLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `stream` as the current viewer, replacing any previous one.
    /// Commands queued from the old viewer are dropped.
    pub fn attach(&self, stream: TcpStream) {
        // Non-blocking so tick-loop reads never stall the simulation.
        if let Err(e) = stream.set_nonblocking(true) {
            warn!("could not make viewer socket non-blocking: {e}");
        }
        if let Ok(mut queue) = self.pending.lock() {
            queue.clear();
        }
        if let Ok(mut guard) = self.conn.lock() {
            *guard = Some(stream);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Write `bytes` to the viewer.  `false` means no viewer or a failed
    /// write; the caller is free to ignore it.
    pub fn send(&self, bytes: &[u8]) -> bool {
        let Ok(mut guard) = self.conn.lock() else {
            return false;
        };
        match guard.as_mut() {
            Some(stream) => stream.write_all(bytes).is_ok(),
            None => false,
        }
    }

    /// Non-blocking read of one command, if the viewer sent one.  A read
    /// that coalesced several newline-separated commands hands back the
    /// first and queues the rest for subsequent calls.  A closed connection
    /// drops the reference; errors yield `None`.
    pub fn try_recv(&self) -> Option<String> {
        if let Ok(mut queue) = self.pending.lock() {
            if let Some(command) = queue.pop_front() {
                return Some(command);
            }
        }

        let mut guard = self.conn.lock().ok()?;
        let stream = guard.as_mut()?;

        let mut buf = [0u8; RECV_BUF];
        match stream.read(&mut buf) {
            Ok(0) => {
                info!("viewer disconnected");
                *guard = None;
                None
            }
            Ok(n) => {
                let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                let mut commands = text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string);
                let first = commands.next();
                if let Ok(mut queue) = self.pending.lock() {
                    queue.extend(commands);
                }
                first
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(_) => None,
        }
    }

    /// Drop the current connection and any queued commands.
    pub fn close(&self) {
        if let Ok(mut guard) = self.conn.lock() {
            *guard = None;
        }
        if let Ok(mut queue) = self.pending.lock() {
            queue.clear();
        }
    }
}

// ── Acceptor thread ───────────────────────────────────────────────────────────

/// Spawn the accept loop: each accepted connection becomes the viewer.
///
/// Returns the join handle and the bound address (useful with port 0).
/// The loop polls so it can observe `stop` between accepts.
pub fn spawn_acceptor(
    listen_addr: &str,
    link: ViewerLink,
    stop: Arc<AtomicBool>,
) -> std::io::Result<(JoinHandle<()>, SocketAddr)> {
    let listener = TcpListener::bind(listen_addr)?;
    let local_addr = listener.local_addr()?;
    listener.set_nonblocking(true)?;
    info!("listening for viewer on {local_addr}");

    let handle = std::thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    info!("viewer connected from {peer}");
                    link.attach(stream);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    warn!("accept failed: {e}");
                    std::thread::sleep(ACCEPT_POLL);
                }
            }
        }
    });

    Ok((handle, local_addr))
}
