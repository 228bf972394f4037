//! Server link: shared state and send operations
//!
//! [`Link`] owns everything the send side shares: the channel's write
//! handle, the sequence counter and the ack watermark, all behind one
//! mutex so that increment-encode-write is a single atomic unit and
//! concurrent senders can never collide on an id. The receive loop
//! ([`ReceiveLoop`]) is the only component that attaches and detaches
//! the write handle as the connection comes and goes.

mod receiver;
mod tracker;

pub use receiver::ReceiveLoop;
pub use tracker::{AckOutcome, AckTracker, TrackerStats};

use crate::config::LinkConfig;
use crate::core::Position;
use crate::error::{Error, Result};
use crate::map::ArenaMap;
use crate::protocol::{Frame, Message, ObstacleAction};
use crate::transport::{TcpConnector, Transport};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Connection state of the server link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No channel established; the receive loop is retrying
    Disconnected,
    /// Channel established, sends will be attempted
    Connected,
}

/// Game-state event decoded from a server frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Game start
    Start,
    /// Game stop
    Stop,
    /// Robot kicked from the game
    Kick,
}

/// Write side shared by all senders; serialized under one mutex
struct TxShared {
    /// Present only while connected
    writer: Option<Box<dyn Transport>>,
    tracker: AckTracker,
}

/// Shared link state: write handle, sequence counter, ack watermark.
///
/// Cheap to share via `Arc`; all send operations are `&self`.
pub struct Link {
    tx: Mutex<TxShared>,
    connected: AtomicBool,
    /// Our team id, stamped as frame source
    local_id: u8,
    /// Server team id, stamped as frame destination
    peer_id: u8,
}

impl Link {
    /// Create a disconnected link with the configured identities
    pub fn new(config: &LinkConfig) -> Arc<Self> {
        Arc::new(Self {
            tx: Mutex::new(TxShared {
                writer: None,
                tracker: AckTracker::new(),
            }),
            connected: AtomicBool::new(false),
            local_id: config.team_id,
            peer_id: config.server_team_id,
        })
    }

    /// Our own team id
    #[inline]
    pub fn local_id(&self) -> u8 {
        self.local_id
    }

    /// The server's team id
    #[inline]
    pub fn peer_id(&self) -> u8 {
        self.peer_id
    }

    /// Current connection state
    pub fn state(&self) -> LinkState {
        if self.connected.load(Ordering::Relaxed) {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        }
    }

    /// True while a channel is established
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Report the robot's current position. Best effort: no ack wait.
    pub fn send_position(&self, position: Position) -> Result<u16> {
        self.send(Message::Position { position })
    }

    /// Report an obstacle released at `position`
    pub fn drop_obstacle(&self, position: Position) -> Result<u16> {
        self.send(Message::Obstacle {
            action: ObstacleAction::Drop,
            position,
        })
    }

    /// Report an obstacle collected from `position`
    pub fn pick_up_obstacle(&self, position: Position) -> Result<u16> {
        self.send(Message::Obstacle {
            action: ObstacleAction::PickUp,
            position,
        })
    }

    /// Report one observed map cell with its colour sample
    pub fn send_map_point(&self, position: Position, r: u8, g: u8, b: u8) -> Result<u16> {
        self.send(Message::MapData { position, r, g, b })
    }

    /// Report every known cell of the arena map, one MAPDATA frame per
    /// cell using the classification's reporting colour. Returns the
    /// number of frames sent; stops at the first send failure.
    pub fn publish_map(&self, map: &ArenaMap) -> Result<usize> {
        let mut sent = 0;
        for (coord, kind) in map.iter_known() {
            let (r, g, b) = kind.report_color();
            self.send_map_point(map.to_position(coord), r, g, b)?;
            sent += 1;
        }
        log::debug!("Published {} map cells", sent);
        Ok(sent)
    }

    /// Highest sequence id acknowledged by the server
    pub fn ack_watermark(&self) -> u16 {
        self.tx.lock().tracker.watermark()
    }

    /// Last sequence id assigned to an outbound frame
    pub fn last_sent_id(&self) -> u16 {
        self.tx.lock().tracker.last_sent()
    }

    /// Ack-tracking diagnostic counters
    pub fn tracker_stats(&self) -> TrackerStats {
        self.tx.lock().tracker.stats()
    }

    /// Encode and write one frame under the shared lock.
    ///
    /// Fails fast with [`Error::NotConnected`] while the link is down;
    /// the sequence id is only consumed once a writer is present.
    fn send(&self, message: Message) -> Result<u16> {
        let mut tx = self.tx.lock();
        let TxShared { writer, tracker } = &mut *tx;
        let Some(writer) = writer.as_mut() else {
            return Err(Error::NotConnected);
        };

        let id = tracker.next_id();
        let frame = Frame {
            id,
            src: self.local_id,
            dst: self.peer_id,
            message,
        };
        writer.write_frame(&frame.encode())?;
        log::trace!("Sent {:?} as id {}", frame.message.msg_type(), id);
        Ok(id)
    }

    /// Install the write handle of a freshly established channel.
    /// Receive loop only.
    pub(crate) fn attach_writer(&self, writer: Box<dyn Transport>) {
        self.tx.lock().writer = Some(writer);
        self.connected.store(true, Ordering::Relaxed);
    }

    /// Drop the write handle after a disconnect. Receive loop only.
    pub(crate) fn detach_writer(&self) {
        self.tx.lock().writer = None;
        self.connected.store(false, Ordering::Relaxed);
    }

    /// Feed one validated ack into the tracker. Receive loop only.
    pub(crate) fn observe_ack(&self, acked: u16, status: u8) -> AckOutcome {
        self.tx.lock().tracker.observe_ack(acked, status)
    }
}

/// Set up the link and spawn its receive loop over TCP.
///
/// Convenience for startup sequencing: the returned [`Link`] can be
/// handed to any number of sender threads; the join handle belongs to
/// the receive loop, which exits once `running` is cleared.
pub fn init_link(
    config: &LinkConfig,
    running: Arc<AtomicBool>,
) -> Result<(Arc<Link>, JoinHandle<()>)> {
    let link = Link::new(config);
    let connector = TcpConnector::new(config.server_addr.clone(), config.read_timeout());
    let handle = ReceiveLoop::new(
        Arc::clone(&link),
        Box::new(connector),
        running,
        config.reconnect_interval(),
    )
    .spawn()?;
    Ok((link, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::protocol::MsgType;
    use crate::transport::mock::MockTransport;
    use std::thread;

    fn connected_link() -> (Arc<Link>, MockTransport) {
        let link = Link::new(&AppConfig::small_arena_defaults().link);
        let transport = MockTransport::new();
        link.attach_writer(Box::new(transport.clone()));
        (link, transport)
    }

    #[test]
    fn test_send_while_disconnected_fails_fast() {
        let link = Link::new(&AppConfig::small_arena_defaults().link);
        assert!(matches!(
            link.send_position(Position::new(0, 0)),
            Err(Error::NotConnected)
        ));
        // Id not consumed by the failed send
        assert_eq!(link.last_sent_id(), 0);
    }

    #[test]
    fn test_send_stamps_identity_and_id() {
        let (link, transport) = connected_link();
        let id = link.send_position(Position::new(10, -20)).unwrap();
        assert_eq!(id, 1);

        let written = transport.written();
        assert_eq!(written.len(), 1);
        let frame = Frame::decode(&written[0]).unwrap();
        assert_eq!(frame.id, 1);
        assert_eq!(frame.src, link.local_id());
        assert_eq!(frame.dst, link.peer_id());
        assert_eq!(frame.message.msg_type(), MsgType::Position);
    }

    #[test]
    fn test_concurrent_sends_use_distinct_ids() {
        let (link, transport) = connected_link();
        let threads = 8;
        let per_thread = 25;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let link = Arc::clone(&link);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        link.send_position(Position::new(i as i16, i as i16)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut ids: Vec<u16> = transport
            .written()
            .iter()
            .map(|bytes| Frame::decode(bytes).unwrap().id)
            .collect();
        ids.sort_unstable();
        let expected: Vec<u16> = (1..=(threads * per_thread) as u16).collect();
        assert_eq!(ids, expected);
        assert_eq!(link.last_sent_id(), (threads * per_thread) as u16);
    }

    #[test]
    fn test_obstacle_actions() {
        let (link, transport) = connected_link();
        link.drop_obstacle(Position::new(1, 2)).unwrap();
        link.pick_up_obstacle(Position::new(3, 4)).unwrap();

        let written = transport.written();
        let drop = Frame::decode(&written[0]).unwrap();
        let pickup = Frame::decode(&written[1]).unwrap();
        assert_eq!(
            drop.message,
            Message::Obstacle {
                action: ObstacleAction::Drop,
                position: Position::new(1, 2)
            }
        );
        assert_eq!(
            pickup.message,
            Message::Obstacle {
                action: ObstacleAction::PickUp,
                position: Position::new(3, 4)
            }
        );
    }

    #[test]
    fn test_publish_map_sends_known_cells() {
        use crate::core::CellKind;

        let (link, transport) = connected_link();
        let mut map = ArenaMap::small_arena();
        map.set_cell(Position::new(0, 0), CellKind::Obstacle).unwrap();
        map.set_cell(Position::new(100, 200), CellKind::Target)
            .unwrap();

        let sent = link.publish_map(&map).unwrap();
        assert_eq!(sent, 2);
        let written = transport.written();
        assert_eq!(written.len(), 2);
        for bytes in written {
            let frame = Frame::decode(&bytes).unwrap();
            assert_eq!(frame.message.msg_type(), MsgType::MapData);
        }
    }

    #[test]
    fn test_write_error_surfaces_to_sender() {
        let (link, transport) = connected_link();
        transport.set_write_fails(true);
        assert!(matches!(
            link.send_position(Position::new(0, 0)),
            Err(Error::Write(_))
        ));
        // Link state is still the receive loop's call
        assert!(link.is_connected());
    }
}
