//! Frame encoding and decoding
//!
//! Frame format: `[ID_LO] [ID_HI] [SRC] [DST] [TYPE] [PAYLOAD 0-7 bytes]`
//!
//! - `ID`: 16-bit sequence id, assigned by the sender, 1-based
//! - `SRC` / `DST`: team identifiers of sender and destination
//! - `TYPE`: one of the [`MsgType`] codes
//! - `PAYLOAD`: fixed length per type, see the table on [`MsgType`]
//!
//! Every 16-bit field on the wire (sequence id, coordinates, acked id)
//! is little-endian. All packing goes through one pair of helpers per
//! field width so the ordering cannot drift between header and payload.
//!
//! There is no length prefix at this level: the payload length is fixed
//! by the type code. Byte-stream transports add their own framing (see
//! `transport::tcp`).

use crate::core::Position;
use crate::error::{Error, Result};

/// Fixed header length in bytes
pub const HEADER_LEN: usize = 5;
/// Longest frame (MAPDATA: header + 7 payload bytes)
pub const MAX_FRAME_LEN: usize = 12;

/// Sequence id offset in the header (2 bytes)
const OFFSET_ID: usize = 0;
/// Source team id offset
const OFFSET_SRC: usize = 2;
/// Destination team id offset
const OFFSET_DST: usize = 3;
/// Type code offset
const OFFSET_TYPE: usize = 4;

/// Message type codes
///
/// | code | type     | payload                            |
/// |------|----------|------------------------------------|
/// | 0    | ACK      | acked id (u16), status (u8)        |
/// | 1    | START    | none                               |
/// | 2    | STOP     | none                               |
/// | 3    | KICK     | none                               |
/// | 4    | POSITION | x (i16), y (i16)                   |
/// | 5    | OBSTACLE | action (u8), x (i16), y (i16)      |
/// | 6    | MAPDATA  | x (i16), y (i16), r, g, b          |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgType {
    /// Server acknowledgment of a robot frame
    Ack = 0,
    /// Game start signal from the server
    Start = 1,
    /// Game stop signal from the server
    Stop = 2,
    /// Robot disqualified by the server
    Kick = 3,
    /// Robot position report
    Position = 4,
    /// Obstacle drop / pickup event
    Obstacle = 5,
    /// One observed map cell with its colour sample
    MapData = 6,
}

impl MsgType {
    /// Convert from the wire byte
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(MsgType::Ack),
            1 => Some(MsgType::Start),
            2 => Some(MsgType::Stop),
            3 => Some(MsgType::Kick),
            4 => Some(MsgType::Position),
            5 => Some(MsgType::Obstacle),
            6 => Some(MsgType::MapData),
            _ => None,
        }
    }

    /// Fixed payload length for this type
    pub fn payload_len(self) -> usize {
        match self {
            MsgType::Ack => 3,
            MsgType::Start | MsgType::Stop | MsgType::Kick => 0,
            MsgType::Position => 4,
            MsgType::Obstacle => 5,
            MsgType::MapData => 7,
        }
    }
}

/// Obstacle event direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ObstacleAction {
    /// Obstacle released at the position
    Drop = 0,
    /// Obstacle collected from the position
    PickUp = 1,
}

/// Decoded message body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Server acknowledgment: which id was received and a status byte
    /// (0 = understood, anything else = rejected by the server)
    Ack {
        /// Sequence id being acknowledged
        acked_id: u16,
        /// Server status byte, 0 on success
        status: u8,
    },
    /// Game start
    Start,
    /// Game stop
    Stop,
    /// Robot kicked from the game
    Kick,
    /// Current robot position
    Position {
        /// Reported position
        position: Position,
    },
    /// Obstacle dropped or picked up
    Obstacle {
        /// Drop or pickup
        action: ObstacleAction,
        /// Where the event happened
        position: Position,
    },
    /// One map cell report with colour sample
    MapData {
        /// Cell position
        position: Position,
        /// Red component
        r: u8,
        /// Green component
        g: u8,
        /// Blue component
        b: u8,
    },
}

impl Message {
    /// Type code for this message
    pub fn msg_type(&self) -> MsgType {
        match self {
            Message::Ack { .. } => MsgType::Ack,
            Message::Start => MsgType::Start,
            Message::Stop => MsgType::Stop,
            Message::Kick => MsgType::Kick,
            Message::Position { .. } => MsgType::Position,
            Message::Obstacle { .. } => MsgType::Obstacle,
            Message::MapData { .. } => MsgType::MapData,
        }
    }
}

/// One complete protocol frame: header fields plus message body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Sequence id (1-based, assigned by the sender)
    pub id: u16,
    /// Sender team id
    pub src: u8,
    /// Destination team id
    pub dst: u8,
    /// Message body
    pub message: Message,
}

/// Append a 16-bit unsigned field, little-endian
#[inline]
fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Read a 16-bit unsigned field, little-endian
#[inline]
fn get_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// Append a 16-bit signed field, little-endian
#[inline]
fn put_i16(buf: &mut Vec<u8>, value: i16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Read a 16-bit signed field, little-endian
#[inline]
fn get_i16(bytes: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

impl Frame {
    /// Encode to wire bytes
    pub fn encode(&self) -> Vec<u8> {
        let msg_type = self.message.msg_type();
        let mut buf = Vec::with_capacity(HEADER_LEN + msg_type.payload_len());

        put_u16(&mut buf, self.id);
        buf.push(self.src);
        buf.push(self.dst);
        buf.push(msg_type as u8);

        match self.message {
            Message::Ack { acked_id, status } => {
                put_u16(&mut buf, acked_id);
                buf.push(status);
            }
            Message::Start | Message::Stop | Message::Kick => {}
            Message::Position { position } => {
                put_i16(&mut buf, position.x);
                put_i16(&mut buf, position.y);
            }
            Message::Obstacle { action, position } => {
                buf.push(action as u8);
                put_i16(&mut buf, position.x);
                put_i16(&mut buf, position.y);
            }
            Message::MapData { position, r, g, b } => {
                put_i16(&mut buf, position.x);
                put_i16(&mut buf, position.y);
                buf.push(r);
                buf.push(g);
                buf.push(b);
            }
        }

        buf
    }

    /// Decode from wire bytes
    ///
    /// Rejects frames shorter than the header, unknown type codes, and
    /// payloads whose length does not match the type. Sender and
    /// destination identity is the receive loop's concern, not ours.
    pub fn decode(bytes: &[u8]) -> Result<Frame> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::MalformedFrame(format!(
                "{} bytes, header needs {}",
                bytes.len(),
                HEADER_LEN
            )));
        }

        let msg_type = MsgType::from_u8(bytes[OFFSET_TYPE]).ok_or_else(|| {
            Error::MalformedFrame(format!("unknown type code {:#04x}", bytes[OFFSET_TYPE]))
        })?;

        let payload = &bytes[HEADER_LEN..];
        if payload.len() != msg_type.payload_len() {
            return Err(Error::MalformedFrame(format!(
                "{:?} payload is {} bytes, expected {}",
                msg_type,
                payload.len(),
                msg_type.payload_len()
            )));
        }

        let message = match msg_type {
            MsgType::Ack => Message::Ack {
                acked_id: get_u16(payload, 0),
                status: payload[2],
            },
            MsgType::Start => Message::Start,
            MsgType::Stop => Message::Stop,
            MsgType::Kick => Message::Kick,
            MsgType::Position => Message::Position {
                position: Position::new(get_i16(payload, 0), get_i16(payload, 2)),
            },
            MsgType::Obstacle => {
                let action = match payload[0] {
                    0 => ObstacleAction::Drop,
                    1 => ObstacleAction::PickUp,
                    other => {
                        return Err(Error::MalformedFrame(format!(
                            "obstacle action {:#04x}",
                            other
                        )))
                    }
                };
                Message::Obstacle {
                    action,
                    position: Position::new(get_i16(payload, 1), get_i16(payload, 3)),
                }
            }
            MsgType::MapData => Message::MapData {
                position: Position::new(get_i16(payload, 0), get_i16(payload, 2)),
                r: payload[4],
                g: payload[5],
                b: payload[6],
            },
        };

        Ok(Frame {
            id: get_u16(bytes, OFFSET_ID),
            src: bytes[OFFSET_SRC],
            dst: bytes[OFFSET_DST],
            message,
        })
    }
}
