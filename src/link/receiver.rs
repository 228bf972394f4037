//! Receive loop: connection lifecycle and inbound frame dispatch
//!
//! One long-lived thread owns the channel's read side. While
//! disconnected it sleeps a fixed interval and retries the connector
//! (no backoff, the fixed period is a deliberate simplicity choice);
//! while connected it performs one bounded read per iteration. Read
//! timeouts are not disconnects. The liveness flag is checked at loop
//! top and after every sleep, so shutdown latency is bounded by one
//! sleep period or one read timeout.

use super::{AckOutcome, GameEvent, Link};
use crate::protocol::{Frame, Message, MAX_FRAME_LEN};
use crate::transport::{Connector, Transport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Long-lived receive task for the server link
pub struct ReceiveLoop {
    link: Arc<Link>,
    connector: Box<dyn Connector>,
    running: Arc<AtomicBool>,
    reconnect_interval: Duration,
    /// Read side of the current channel; `None` while disconnected
    reader: Option<Box<dyn Transport>>,
    /// Optional game-event channel to the surrounding game logic
    events: Option<crossbeam_channel::Sender<GameEvent>>,
}

impl ReceiveLoop {
    /// Create a receive loop for `link`, initially disconnected
    pub fn new(
        link: Arc<Link>,
        connector: Box<dyn Connector>,
        running: Arc<AtomicBool>,
        reconnect_interval: Duration,
    ) -> Self {
        Self {
            link,
            connector,
            running,
            reconnect_interval,
            reader: None,
            events: None,
        }
    }

    /// Forward decoded game events on `sender` (best effort: a full or
    /// closed channel is logged, never blocks the loop)
    pub fn with_events(mut self, sender: crossbeam_channel::Sender<GameEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Spawn the loop on a dedicated named thread
    pub fn spawn(self) -> crate::error::Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("link-receiver".to_string())
            .spawn(move || self.run())?;
        Ok(handle)
    }

    /// Run the loop on the current thread until the running flag clears
    pub fn run(mut self) {
        log::info!("Link receiver started");
        let mut buf = [0u8; MAX_FRAME_LEN];

        while self.running.load(Ordering::Relaxed) {
            let Some(reader) = self.reader.as_mut() else {
                thread::sleep(self.reconnect_interval);
                if !self.running.load(Ordering::Relaxed) {
                    break; // quit without a final attempt
                }
                self.try_connect();
                continue;
            };

            match reader.read_frame(&mut buf) {
                Ok(0) => {} // read timeout, loop again
                Ok(n) => self.handle_frame(&buf[..n]),
                Err(e) => {
                    log::warn!("Server connection lost: {}", e);
                    self.disconnect();
                }
            }
        }

        self.disconnect();
        log::info!("Link receiver stopped");
    }

    /// One connection attempt; failure just waits for the next cycle
    fn try_connect(&mut self) {
        match self.connector.connect() {
            Ok((reader, writer)) => {
                self.reader = Some(reader);
                self.link.attach_writer(writer);
                log::info!("Connected to server");
            }
            Err(e) => {
                log::warn!("Connection attempt failed: {}", e);
            }
        }
    }

    /// Tear down both channel handles and mark the link disconnected
    fn disconnect(&mut self) {
        self.reader = None;
        self.link.detach_writer();
    }

    /// Validate, decode and dispatch one inbound frame.
    ///
    /// Frames that are malformed, from a foreign sender or addressed to
    /// someone else are dropped and logged. The sender/destination check
    /// is the protocol's only anti-spoofing measure; it keeps other
    /// robots' traffic out but is no authentication.
    fn handle_frame(&mut self, bytes: &[u8]) {
        let frame = match Frame::decode(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("Ignoring frame: {}", e);
                return;
            }
        };
        if frame.src != self.link.peer_id() {
            log::debug!("Ignoring frame from foreign sender {}", frame.src);
            return;
        }
        if frame.dst != self.link.local_id() {
            log::debug!("Ignoring frame addressed to {}", frame.dst);
            return;
        }

        match frame.message {
            Message::Ack { acked_id, status } => {
                match self.link.observe_ack(acked_id, status) {
                    AckOutcome::Advanced => log::trace!("Ack {}", acked_id),
                    AckOutcome::Stale => {
                        log::warn!("Stale ack {} behind watermark", acked_id)
                    }
                    AckOutcome::Unsent => {
                        log::warn!("Ack {} of a message not sent yet", acked_id)
                    }
                    AckOutcome::Gap { lost } => log::warn!(
                        "{} message(s) presumed lost, ack jumped to {}",
                        lost,
                        acked_id
                    ),
                    AckOutcome::Misunderstood => log::warn!(
                        "Server reported message {} misunderstood (status {})",
                        acked_id,
                        status
                    ),
                }
            }
            Message::Start => {
                log::info!("Game start sent by server");
                self.dispatch(GameEvent::Start);
            }
            Message::Stop => {
                log::info!("Game stop sent by server");
                self.dispatch(GameEvent::Stop);
            }
            Message::Kick => {
                log::error!("Kicked by server");
                self.dispatch(GameEvent::Kick);
            }
            other => {
                log::debug!("Ignoring unexpected {:?} from server", other.msg_type());
            }
        }
    }

    fn dispatch(&self, event: GameEvent) {
        if let Some(sender) = &self.events {
            if let Err(e) = sender.try_send(event) {
                log::debug!("Game event {:?} not delivered: {}", event, e);
            }
        }
    }
}
