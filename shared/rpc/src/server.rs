//! Server side of the RPC transport: a method router plus the accept loop.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use prost::Message;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::frame::{read_frame, write_frame, Frame, FrameError, FrameType};
use crate::metadata::{Metadata, RpcRequest};
use crate::status::{Status, StatusProto};

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>, Status>> + Send>>;
type MethodHandler = Arc<dyn Fn(Metadata, Bytes) -> HandlerFuture + Send + Sync>;

/// How long `serve` waits for in-flight connections after shutdown is
/// requested before aborting them.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Routes incoming requests to typed handlers by method name.
#[derive(Default)]
pub struct RpcServer {
    methods: HashMap<String, MethodHandler>,
}

impl RpcServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed handler. The wrapper decodes the request payload,
    /// invokes the handler with the caller's metadata, and encodes the
    /// response; a payload that fails to decode reports `InvalidArgument`.
    pub fn add_method<Req, Resp, F, Fut>(&mut self, name: &str, handler: F)
    where
        Req: Message + Default + 'static,
        Resp: Message + 'static,
        F: Fn(Metadata, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, Status>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: MethodHandler = Arc::new(move |metadata: Metadata, payload: Bytes| {
            let handler = handler.clone();
            Box::pin(async move {
                let request = Req::decode(payload)
                    .map_err(|e| Status::invalid_argument(format!("decode request: {e}")))?;
                let response = handler(metadata, request).await?;
                Ok(response.encode_to_vec())
            })
        });
        self.methods.insert(name.to_string(), erased);
    }

    /// Accept connections until `shutdown` fires, then drain in-flight
    /// connections with a bounded wait and abort stragglers.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> std::io::Result<()> {
        let methods = Arc::new(self.methods);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    let methods = methods.clone();
                    connections.spawn(async move {
                        if let Err(e) = handle_connection(methods, stream).await {
                            tracing::debug!(%peer, error = %e, "connection ended with error");
                        }
                    });
                }
                // Reap finished connections so the set does not grow unbounded.
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        tracing::info!("rpc server draining in-flight connections");
        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!("drain timed out, aborting remaining connections");
            connections.abort_all();
        }
        Ok(())
    }
}

async fn handle_connection(
    methods: Arc<HashMap<String, MethodHandler>>,
    mut stream: TcpStream,
) -> Result<(), FrameError> {
    loop {
        let frame = match read_frame(&mut stream).await {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };

        if frame.frame_type != FrameType::Request {
            return Err(FrameError::InvalidFrameType(frame.frame_type as u16));
        }

        let envelope: RpcRequest = frame.decode()?;
        let metadata = Metadata::from_pairs(envelope.metadata);
        let trace_id = metadata.trace_id().unwrap_or("-").to_string();
        let started = Instant::now();

        let result = match methods.get(&envelope.method) {
            Some(handler) => handler(metadata, Bytes::from(envelope.payload)).await,
            None => Err(Status::internal(format!(
                "unknown method: {}",
                envelope.method
            ))),
        };

        match result {
            Ok(payload) => {
                tracing::info!(
                    method = %envelope.method,
                    trace_id = %trace_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "rpc handled"
                );
                let frame = Frame {
                    frame_type: FrameType::Response,
                    payload: Bytes::from(payload),
                };
                write_frame(&mut stream, &frame).await?;
            }
            Err(status) => {
                tracing::info!(
                    method = %envelope.method,
                    trace_id = %trace_id,
                    code = ?status.code,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "rpc failed"
                );
                let frame = Frame::error(&StatusProto::from(&status))?;
                write_frame(&mut stream, &frame).await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Channel;
    use crate::status::Code;

    #[derive(Clone, PartialEq, ::prost::Message)]
    struct EchoRequest {
        #[prost(string, tag = "1")]
        text: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    struct EchoResponse {
        #[prost(string, tag = "1")]
        text: String,
        #[prost(string, optional, tag = "2")]
        caller: Option<String>,
    }

    async fn spawn_echo_server() -> (String, CancellationToken) {
        let mut server = RpcServer::new();
        server.add_method("test.Echo", |metadata: Metadata, req: EchoRequest| async move {
            Ok(EchoResponse {
                text: req.text,
                caller: metadata.user_id().map(str::to_string),
            })
        });
        server.add_method("test.Fail", |_metadata: Metadata, _req: EchoRequest| async {
            Err::<EchoResponse, _>(Status::not_found("no such thing"))
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        tokio::spawn(async move {
            server.serve(listener, token).await.unwrap();
        });
        (addr, shutdown)
    }

    #[tokio::test]
    async fn loopback_call_round_trips_metadata_and_payload() {
        let (addr, shutdown) = spawn_echo_server().await;
        let channel = Channel::new(addr);

        let mut metadata = Metadata::new();
        metadata.insert("x-user-id", "user-1");

        let resp: EchoResponse = channel
            .call(
                "test.Echo",
                &metadata,
                &EchoRequest {
                    text: "hello".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(resp.text, "hello");
        assert_eq!(resp.caller.as_deref(), Some("user-1"));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn handler_error_reaches_the_client_as_status() {
        let (addr, shutdown) = spawn_echo_server().await;
        let channel = Channel::new(addr);

        let err = channel
            .call::<_, EchoResponse>("test.Fail", &Metadata::new(), &EchoRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, Code::NotFound);
        assert_eq!(err.message, "no such thing");
        shutdown.cancel();
    }

    #[tokio::test]
    async fn unknown_method_reports_internal() {
        let (addr, shutdown) = spawn_echo_server().await;
        let channel = Channel::new(addr);

        let err = channel
            .call::<_, EchoResponse>("test.Missing", &Metadata::new(), &EchoRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, Code::Internal);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        // Port 1 is essentially never listening.
        let channel = Channel::new("127.0.0.1:1");
        let err = channel
            .call::<_, EchoResponse>("test.Echo", &Metadata::new(), &EchoRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, Code::Unavailable);
    }
}
