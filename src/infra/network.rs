//! Network pump implementations backed by in-process channels.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::debug;

use crate::runtime::NetworkPoller;

/// A network pump that never has traffic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNetwork;

impl NetworkPoller for NullNetwork {
    fn poll(&mut self) {}

    fn terminate(&mut self) {}
}

/// A network pump fed by in-process channels.
///
/// Inbound frames pushed through [`ChannelNetwork::inbound_sender`] are
/// handed to the frame handler on the next poll; outbound frames queued
/// through [`ChannelNetwork::outbound_sender`] are flushed on the next poll
/// and kept for inspection. Useful for tests and local loopback transports.
pub struct ChannelNetwork {
    inbound_tx: Sender<Vec<u8>>,
    inbound_rx: Receiver<Vec<u8>>,
    outbound_tx: Sender<Vec<u8>>,
    outbound_rx: Receiver<Vec<u8>>,
    on_frame: Box<dyn FnMut(Vec<u8>) + Send>,
    flushed: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ChannelNetwork {
    /// Creates a pump delivering inbound frames to `on_frame`.
    pub fn new(on_frame: impl FnMut(Vec<u8>) + Send + 'static) -> Self {
        let (inbound_tx, inbound_rx) = unbounded();
        let (outbound_tx, outbound_rx) = unbounded();
        Self {
            inbound_tx,
            inbound_rx,
            outbound_tx,
            outbound_rx,
            on_frame: Box::new(on_frame),
            flushed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sender for injecting inbound frames.
    #[must_use]
    pub fn inbound_sender(&self) -> Sender<Vec<u8>> {
        self.inbound_tx.clone()
    }

    /// Sender for queueing outbound frames.
    #[must_use]
    pub fn outbound_sender(&self) -> Sender<Vec<u8>> {
        self.outbound_tx.clone()
    }

    /// All frames flushed so far, shared with the pump.
    #[must_use]
    pub fn flushed(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.flushed)
    }
}

impl NetworkPoller for ChannelNetwork {
    fn poll(&mut self) {
        while let Ok(frame) = self.inbound_rx.try_recv() {
            (self.on_frame)(frame);
        }
        while let Ok(frame) = self.outbound_rx.try_recv() {
            self.flushed.lock().push(frame);
        }
    }

    fn terminate(&mut self) {
        let dropped = self.inbound_rx.try_iter().count() + self.outbound_rx.try_iter().count();
        if dropped > 0 {
            debug!(dropped, "channel network dropped frames at terminate");
        }
    }
}

impl std::fmt::Debug for ChannelNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelNetwork")
            .field("inbound_pending", &self.inbound_rx.len())
            .field("outbound_pending", &self.outbound_rx.len())
            .finish_non_exhaustive()
    }
}
