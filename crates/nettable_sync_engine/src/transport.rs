//! Framed TCP transport.

use crate::error::{SyncError, SyncResult};
use bytes::Bytes;
use nettable_sync_protocol::{decode_payload, FrameReader, FrameWriter, Message};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// A connected socket speaking framed messages.
pub(crate) struct Transport {
    reader: FrameReader<OwnedReadHalf>,
    writer: FrameWriter<OwnedWriteHalf>,
    write_timeout: Duration,
    last_write: Instant,
    peer: SocketAddr,
}

impl Transport {
    /// Opens a TCP connection to `host:port`.
    pub(crate) async fn connect(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        write_timeout: Duration,
    ) -> SyncResult<Self> {
        let stream = timeout(connect_timeout, TcpStream::connect((host, port))).await??;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        let (read, write) = stream.into_split();
        Ok(Self {
            reader: FrameReader::new(read),
            writer: FrameWriter::new(write),
            write_timeout,
            last_write: Instant::now(),
            peer,
        })
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Time since the last successful write.
    pub(crate) fn idle_for(&self) -> Duration {
        self.last_write.elapsed()
    }

    /// Writes a batch of messages, bounded by the write timeout.
    pub(crate) async fn send(&mut self, messages: &[Message]) -> SyncResult<()> {
        if messages.is_empty() {
            return Ok(());
        }
        timeout(self.write_timeout, self.writer.write_messages(messages)).await??;
        self.last_write = Instant::now();
        Ok(())
    }

    /// Reads the next frame payload without decoding it.
    pub(crate) async fn recv_frame(&mut self) -> SyncResult<Bytes> {
        match self.reader.read_frame().await? {
            Some(frame) => Ok(frame),
            None => Err(SyncError::ConnectionLost("closed by peer".into())),
        }
    }

    /// Reads and decodes the next message.
    pub(crate) async fn recv_message(&mut self) -> SyncResult<Message> {
        let frame = self.recv_frame().await?;
        Ok(decode_payload(&frame)?)
    }

    /// Shuts the socket down, bounded by the write timeout.
    pub(crate) async fn close(mut self) {
        let _ = timeout(self.write_timeout, self.writer.shutdown()).await;
    }
}
