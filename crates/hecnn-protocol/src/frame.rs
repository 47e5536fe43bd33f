// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Frame codec: 8-byte LE control code + 8-byte LE payload length + payload,
//! per spec.md §4.10. The original framed each field as its own
//! `std::ostream`/`std::istream` operator pair over a raw socket; here the
//! same shape rides `tokio`'s `AsyncRead`/`AsyncWrite` so the dispatch loop
//! can be a single `async` task per connection instead of one OS thread.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtocolError, ProtocolResult};

const HEADER_LEN: usize = 16;

/// Payload length cap, well above any realistic ciphertext blob for this
/// system's parameter sizes, guarding against a corrupt or hostile length
/// field causing an unbounded allocation.
pub const MAX_PAYLOAD_LEN: u64 = 512 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Frame {
    pub control_code: u64,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(control_code: u64, payload: Vec<u8>) -> Self {
        Self { control_code, payload }
    }

    pub async fn write<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> ProtocolResult<()> {
        let mut header = [0u8; HEADER_LEN];
        header[0..8].copy_from_slice(&self.control_code.to_le_bytes());
        header[8..16].copy_from_slice(&(self.payload.len() as u64).to_le_bytes());
        writer.write_all(&header).await.map_err(|_| ProtocolError::ConnectionClosed)?;
        writer.write_all(&self.payload).await.map_err(|_| ProtocolError::ConnectionClosed)?;
        writer.flush().await.map_err(|_| ProtocolError::ConnectionClosed)?;
        Ok(())
    }

    pub async fn read<R: AsyncRead + Unpin>(reader: &mut R) -> ProtocolResult<Self> {
        let mut header = [0u8; HEADER_LEN];
        reader.read_exact(&mut header).await.map_err(|_| ProtocolError::ConnectionClosed)?;
        let control_code = u64::from_le_bytes(header[0..8].try_into().unwrap());
        let payload_len = u64::from_le_bytes(header[8..16].try_into().unwrap());
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::PayloadTooLarge {
                declared: payload_len,
                limit: MAX_PAYLOAD_LEN,
            });
        }
        let mut payload = vec![0u8; payload_len as usize];
        reader.read_exact(&mut payload).await.map_err(|_| ProtocolError::ConnectionClosed)?;
        Ok(Self { control_code, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frame_round_trips_through_a_duplex_pipe() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let frame = Frame::new(crate::codes::SUBMIT_QUERY, vec![1, 2, 3, 4]);
        frame.write(&mut client).await.unwrap();

        let read = Frame::read(&mut server).await.unwrap();
        assert_eq!(read.control_code, crate::codes::SUBMIT_QUERY);
        assert_eq!(read.payload, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn oversized_length_is_rejected_before_allocating() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let mut header = [0u8; HEADER_LEN];
        header[0..8].copy_from_slice(&crate::codes::SUBMIT_QUERY.to_le_bytes());
        header[8..16].copy_from_slice(&(MAX_PAYLOAD_LEN + 1).to_le_bytes());
        client.write_all(&header).await.unwrap();

        let result = Frame::read(&mut server).await;
        assert!(matches!(result, Err(ProtocolError::PayloadTooLarge { .. })));
    }

    #[tokio::test]
    async fn eof_mid_header_is_connection_closed() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&[1, 2, 3]).await.unwrap();
        drop(client);

        let result = Frame::read(&mut server).await;
        assert!(matches!(result, Err(ProtocolError::ConnectionClosed)));
    }
}
