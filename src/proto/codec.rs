use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::command::Command;
use super::ProtoError;
use crate::rawframe::{RawFrame, FRAME_LEN};

/// Codec for the fixed size answer of the meter.
///
/// A frame is complete when exactly [`FRAME_LEN`] bytes are buffered.
/// The meter sends nothing unsolicited, so any surplus byte means the
/// line delivered garbage and the whole exchange is spoiled.
#[derive(Debug, Default)]
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = RawFrame;
    type Error = ProtoError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < FRAME_LEN {
            return Ok(None);
        }
        if src.len() > FRAME_LEN {
            return Err(ProtoError::ShortRead {
                received: src.len(),
            });
        }
        let data = src.split_to(FRAME_LEN);
        RawFrame::try_from(&data[..]).map(Some)
    }
}

impl Encoder<Command> for FrameCodec {
    type Error = ProtoError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.put_u8(item.byte());
        Ok(())
    }
}
