//! Client side of the RPC transport.

use prost::Message;
use tokio::net::TcpStream;

use crate::frame::{read_frame, write_frame, Frame, FrameError, FrameType};
use crate::metadata::{Metadata, RpcRequest};
use crate::status::{Status, StatusProto};

/// A channel to one backend. Each call opens its own connection, so a
/// channel is freely shareable across concurrent requests.
#[derive(Debug, Clone)]
pub struct Channel {
    addr: String,
}

impl Channel {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Invoke `method` with the given metadata and request message.
    ///
    /// Transport failures surface as `Unavailable` so the retry layer can
    /// distinguish them from application errors reported by the peer.
    pub async fn call<Req, Resp>(
        &self,
        method: &str,
        metadata: &Metadata,
        request: &Req,
    ) -> Result<Resp, Status>
    where
        Req: Message,
        Resp: Message + Default,
    {
        let mut stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| Status::unavailable(format!("connect {}: {e}", self.addr)))?;

        let envelope = RpcRequest {
            method: method.to_string(),
            metadata: metadata.clone().into_pairs(),
            payload: request.encode_to_vec(),
        };

        let frame = Frame::request(&envelope).map_err(|e| Status::internal(e.to_string()))?;
        write_frame(&mut stream, &frame)
            .await
            .map_err(transport_error)?;

        let response = read_frame(&mut stream).await.map_err(transport_error)?;
        match response.frame_type {
            FrameType::Response => response
                .decode::<Resp>()
                .map_err(|e| Status::internal(format!("decode response: {e}"))),
            FrameType::Error => {
                let proto: StatusProto = response
                    .decode()
                    .map_err(|e| Status::internal(format!("decode status: {e}")))?;
                Err(proto.into())
            }
            FrameType::Request => Err(Status::internal("unexpected request frame from server")),
        }
    }
}

fn transport_error(err: FrameError) -> Status {
    match err {
        FrameError::ConnectionClosed | FrameError::Io(_) => Status::unavailable(err.to_string()),
        other => Status::internal(other.to_string()),
    }
}
