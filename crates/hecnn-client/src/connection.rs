// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Client-side connection: the mirror of `hecnn-server::dispatch` for the
//! three request shapes spec.md §4.10 names from the client's side —
//! register keys, submit a query, poll a result — grounded in
//! `examples/original_source/ppcnn/ppcnn_client/ppcnn_client.cpp`'s
//! `Client::request_registerkey`/`request_query`/`request_result`.

use hecnn_model::{KeyBundle, Query, QueryId, QueryResult};
use hecnn_protocol::{codes, payloads, Frame, ProtocolError};
use thiserror::Error;
use tokio::net::TcpStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connecting to server: {0}")]
    Connect(#[source] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("server reported an error: {0}")]
    Server(ProtocolError),

    #[error("server sent an unexpected reply (control code 0x{0:x})")]
    UnexpectedReply(u64),
}

pub struct ClientConnection {
    stream: TcpStream,
}

impl ClientConnection {
    pub async fn connect(host: &str, port: u16) -> Result<Self, ClientError> {
        let stream = TcpStream::connect((host, port)).await.map_err(ClientError::Connect)?;
        Ok(Self { stream })
    }

    /// `REGISTER_KEYS` (`0x401`): a one-way data frame, no reply expected —
    /// per spec.md §4.10's direction column.
    pub async fn register_keys(&mut self, bundle: &KeyBundle) -> Result<(), ClientError> {
        let bytes = payloads::encode(bundle)?;
        Frame::new(codes::REGISTER_KEYS, bytes).write(&mut self.stream).await?;
        Ok(())
    }

    /// `SUBMIT_QUERY` (`0x1001`): request/reply, returning the server-minted
    /// [`QueryId`].
    pub async fn submit_query(&mut self, query: &Query) -> Result<QueryId, ClientError> {
        let bytes = payloads::encode(query)?;
        Frame::new(codes::SUBMIT_QUERY, bytes).write(&mut self.stream).await?;

        let reply = Frame::read(&mut self.stream).await?;
        match reply.control_code {
            codes::QUERY_ID_RESPONSE => {
                let response: payloads::SubmitQueryResponse = payloads::decode(&reply.payload)?;
                Ok(response.query_id)
            }
            codes::PROTOCOL_ERROR => Err(ClientError::Server(payloads::decode(&reply.payload)?)),
            other => Err(ClientError::UnexpectedReply(other)),
        }
    }

    /// `POLL_RESULT` (`0x1002`): request/reply. The server blocks on this
    /// same connection until `query_id`'s result exists rather than
    /// answering "not ready," so a reply always carries a finished
    /// (possibly `status = failed`) [`QueryResult`]; a `PROTOCOL_ERROR`
    /// reply here means a genuine framing/validation failure, not an
    /// unready result, and is surfaced as [`ClientError::Server`].
    /// Callers that also want to tolerate a dropped/reset connection
    /// should go through [`crate::subscriber::spawn_result_subscriber`]
    /// instead of calling this directly.
    pub async fn poll_result(&mut self, query_id: QueryId) -> Result<QueryResult, ClientError> {
        let request = payloads::PollResultRequest { query_id };
        let bytes = payloads::encode(&request)?;
        Frame::new(codes::POLL_RESULT, bytes).write(&mut self.stream).await?;

        let reply = Frame::read(&mut self.stream).await?;
        match reply.control_code {
            codes::RESULT_RESPONSE => Ok(payloads::decode(&reply.payload)?),
            codes::PROTOCOL_ERROR => Err(ClientError::Server(payloads::decode(&reply.payload)?)),
            other => Err(ClientError::UnexpectedReply(other)),
        }
    }
}
