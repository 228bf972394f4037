//! Wire protocol for the scoring server link

mod frame;

pub use frame::{Frame, Message, MsgType, ObstacleAction, HEADER_LEN, MAX_FRAME_LEN};
