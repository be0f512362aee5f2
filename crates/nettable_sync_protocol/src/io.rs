//! Framed message I/O over async byte streams.

use crate::frame::{encode_frames, FrameDecoder};
use crate::messages::Message;
use bytes::Bytes;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Reads frame payloads from a stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    decoder: FrameDecoder,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wraps a read half.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            decoder: FrameDecoder::new(),
        }
    }

    /// Reads the next frame payload. Returns `Ok(None)` on a clean end of
    /// stream.
    ///
    /// Cancel safe: a partially received frame stays buffered.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the stream, `UnexpectedEof` when the
    /// stream ends inside a frame, or `InvalidData` for an oversized frame.
    pub async fn read_frame(&mut self) -> io::Result<Option<Bytes>> {
        loop {
            match self.decoder.next_frame() {
                Ok(Some(frame)) => return Ok(Some(frame)),
                Ok(None) => {}
                Err(err) => return Err(io::Error::new(io::ErrorKind::InvalidData, err)),
            }
            let read = self.inner.read_buf(self.decoder.buffer_mut()).await?;
            if read == 0 {
                if self.decoder.buffered() == 0 {
                    return Ok(None);
                }
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed inside a frame",
                ));
            }
        }
    }
}

/// Writes framed messages to a stream.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Wraps a write half.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Frames `messages` into one buffer and writes it.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from the stream, or `InvalidData` without
    /// writing anything when a message is too large to frame.
    pub async fn write_messages(&mut self, messages: &[Message]) -> io::Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let buf = encode_frames(messages)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        self.inner.write_all(&buf).await?;
        self.inner.flush().await
    }

    /// Shuts down the write side.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from the stream.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.inner.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::decode_payload;

    #[tokio::test]
    async fn messages_cross_a_duplex_pipe() {
        let (client, server) = tokio::io::duplex(64);
        let mut writer = FrameWriter::new(client);
        let mut reader = FrameReader::new(server);

        let sent = vec![
            Message::client_hello("a-rather-long-identity-to-span-chunks"),
            Message::KeepAlive,
            Message::clear_entries(),
        ];
        let expected = sent.clone();
        let write = tokio::spawn(async move {
            writer.write_messages(&sent).await.unwrap();
            writer.shutdown().await.unwrap();
        });

        let mut received = Vec::new();
        while let Some(frame) = reader.read_frame().await.unwrap() {
            received.push(decode_payload(&frame).unwrap());
        }
        write.await.unwrap();
        assert_eq!(received, expected);
    }

    #[tokio::test]
    async fn eof_inside_frame_is_an_error() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(server);
        client.write_all(&[0, 0, 0, 9, 1]).await.unwrap();
        drop(client);
        let err = reader.read_frame().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
