//! Length-delimited framing.
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ Payload (variable)       │
//! │ Big-endian u32   │ type byte + fields       │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! Because every frame carries its length, a payload that fails to decode
//! can be dropped on its own without losing the position in the stream.

use crate::messages::Message;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use nettable_codec::{uleb128_len, CodecError, CodecResult, Decode, Encode, Value, WireEncoder};

/// Size of the length prefix.
pub const FRAME_HEADER_LEN: usize = 4;

/// Maximum payload size accepted by [`FrameDecoder`].
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Appends one framed message to `dst`.
///
/// # Errors
///
/// Returns [`CodecError::SizeLimitExceeded`] when the payload is larger
/// than [`MAX_FRAME_LEN`]; `dst` is left untouched.
pub fn encode_frame(message: &Message, dst: &mut BytesMut) -> CodecResult<()> {
    let mut encoder = WireEncoder::with_capacity(32);
    message.encode_to(&mut encoder);
    let payload = encoder.into_bytes();
    if payload.len() > MAX_FRAME_LEN {
        return Err(CodecError::SizeLimitExceeded {
            claimed: payload.len() as u64,
            max_allowed: MAX_FRAME_LEN as u64,
        });
    }
    dst.reserve(FRAME_HEADER_LEN + payload.len());
    #[allow(clippy::cast_possible_truncation)]
    dst.put_u32(payload.len() as u32);
    dst.put_slice(&payload);
    Ok(())
}

/// Frames a batch of messages into a single buffer.
///
/// # Errors
///
/// Fails if any message exceeds [`MAX_FRAME_LEN`].
pub fn encode_frames<'a>(
    messages: impl IntoIterator<Item = &'a Message>,
) -> CodecResult<BytesMut> {
    let mut dst = BytesMut::new();
    for message in messages {
        encode_frame(message, &mut dst)?;
    }
    Ok(dst)
}

/// Payload length of an `EntryAssign` carrying `key` and `value`, the
/// largest message an entry produces.
pub fn entry_frame_len(key: &str, value: &Value) -> usize {
    // type byte, key, sequence number, flags, value
    1 + uleb128_len(key.len() as u64) + key.len() + 2 + 1 + value.encoded_len()
}

/// Decodes one frame payload into a message.
///
/// # Errors
///
/// Returns the codec error for a malformed payload. The frame is consumed
/// either way, so the caller can log the error and continue.
pub fn decode_payload(payload: &[u8]) -> CodecResult<Message> {
    Message::decode(payload)
}

/// Incremental frame splitter for a byte stream.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
        }
    }

    /// Mutable access to the read buffer, for `read_buf`-style I/O.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    /// Appends bytes received from the stream.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of buffered bytes not yet returned as frames.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Splits off the next complete frame payload.
    ///
    /// Returns `Ok(None)` when more bytes are needed.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::SizeLimitExceeded`] when a header claims more
    /// than [`MAX_FRAME_LEN`]. The stream cannot be resynchronized after
    /// that; the connection must be dropped.
    pub fn next_frame(&mut self) -> CodecResult<Option<Bytes>> {
        if self.buffer.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }
        let len = u32::from_be_bytes([
            self.buffer[0],
            self.buffer[1],
            self.buffer[2],
            self.buffer[3],
        ]) as usize;
        if len > MAX_FRAME_LEN {
            return Err(CodecError::SizeLimitExceeded {
                claimed: len as u64,
                max_allowed: MAX_FRAME_LEN as u64,
            });
        }
        if self.buffer.len() < FRAME_HEADER_LEN + len {
            self.buffer.reserve(FRAME_HEADER_LEN + len - self.buffer.len());
            return Ok(None);
        }
        self.buffer.advance(FRAME_HEADER_LEN);
        Ok(Some(self.buffer.split_to(len).freeze()))
    }
}
