//! Background delivery of inbound link events.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, select, Sender};

use super::PeerSync;
use crate::error::NetResult;

/// Owner of a running relay thread.
///
/// Dropping the handle (or calling [`RelayHandle::stop`]) signals the thread
/// to exit. Only `stop` waits for it.
pub struct RelayHandle {
    cancel: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RelayHandle {
    /// Signals the thread and waits for it to exit.
    pub fn stop(mut self) {
        self.cancel.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("Relay thread panicked");
            }
        }
    }

    /// True once the thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for RelayHandle {
    fn drop(&mut self) {
        // Disconnecting the channel is the signal
        self.cancel.take();
    }
}

pub(super) fn spawn(sync: Arc<PeerSync>) -> NetResult<RelayHandle> {
    let (cancel_tx, cancel_rx) = bounded::<()>(1);
    let inbound = sync.inbound.clone();

    let thread = thread::Builder::new()
        .name("tilebattle-relay".into())
        .spawn(move || {
            tracing::debug!("Relay started for {}", sync.peer_addr());
            loop {
                select! {
                    recv(inbound) -> event => match event {
                        Ok(event) => {
                            if !sync.handle_link_event(event) {
                                break;
                            }
                        }
                        Err(_) => break,
                    },
                    recv(cancel_rx) -> _ => break,
                }
            }
            tracing::debug!("Relay stopped for {}", sync.peer_addr());
        })?;

    Ok(RelayHandle {
        cancel: Some(cancel_tx),
        thread: Some(thread),
    })
}
