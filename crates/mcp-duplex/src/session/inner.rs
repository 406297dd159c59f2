//! Shared session state and the receive loop.
//!
//! One reader task per session pulls frames off the transport in order.
//! Responses complete pending calls, notifications are applied inline, and
//! each inbound request runs in its own task so a slow handler never blocks
//! the loop (nested calls back across the session rely on this).

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::AbortHandle;

use crate::config::SessionConfig;
use crate::protocol::negotiation;
use crate::protocol::{codec, notifications, Coercion, Method};
use crate::registry::{CapabilityRegistry, RequestContext};
use crate::transport::Transport;
use crate::types::{
    CancelledParams, InitializeParams, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, McpError, McpResult, PeerInfo, RequestId,
};

use super::peer::Peer;
use super::pending::PendingRequests;
use super::state::{SessionState, Side};

pub(crate) struct SessionInner {
    pub(crate) id: String,
    pub(crate) side: Side,
    pub(crate) config: SessionConfig,
    pub(crate) registry: Arc<CapabilityRegistry>,
    pub(crate) remote: OnceLock<PeerInfo>,
    pub(crate) pending: PendingRequests,
    transport: Arc<dyn Transport>,
    state: watch::Sender<SessionState>,
    next_id: AtomicI64,
    inflight: Mutex<HashMap<RequestId, AbortHandle>>,
    handshake_failure: Mutex<Option<McpError>>,
}

impl SessionInner {
    /// Build the session and start its reader. State is `Handshaking` on return.
    pub(crate) fn start(
        side: Side,
        transport: Arc<dyn Transport>,
        registry: Arc<CapabilityRegistry>,
        config: SessionConfig,
    ) -> Arc<Self> {
        let inner = Arc::new(Self {
            id: uuid::Uuid::new_v4().to_string(),
            side,
            config,
            registry,
            remote: OnceLock::new(),
            pending: PendingRequests::default(),
            transport,
            state: watch::channel(SessionState::Disconnected).0,
            next_id: AtomicI64::new(1),
            inflight: Mutex::new(HashMap::new()),
            handshake_failure: Mutex::new(None),
        });

        inner.transition(SessionState::Handshaking);
        tracing::info!(
            "[{}] Session started as {:?} ({} local capabilities)",
            inner.id,
            side,
            inner.registry.descriptors().len()
        );

        tokio::spawn(Arc::clone(&inner).run_reader());
        inner
    }

    pub(crate) fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Move to `next` unless already there or closed. Returns whether the state changed.
    pub(crate) fn transition(&self, next: SessionState) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if *state == SessionState::Closed || *state == next {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            tracing::debug!("[{}] State -> {}", self.id, next);
        }
        changed
    }

    pub(crate) fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn take_handshake_failure(&self) -> Option<McpError> {
        self.handshake_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub(crate) async fn send_message(&self, message: &JsonRpcMessage) -> McpResult<()> {
        let frame = codec::encode(message)?;
        self.transport.send(frame).await
    }

    /// Synchronous half of closing: flip to `Closed` and fail pending calls.
    /// Returns false if the session was already closed.
    pub(crate) fn mark_closed(&self, reason: &str) -> bool {
        if !self.transition(SessionState::Closed) {
            return false;
        }
        let failed = self.pending.fail_all();
        tracing::info!(
            "[{}] Session closed: {reason} ({failed} pending requests failed)",
            self.id
        );
        true
    }

    /// Close the session and its transport. Idempotent.
    pub(crate) async fn shutdown(&self, reason: &str) {
        if self.mark_closed(reason) {
            self.transport.close().await;
        }
    }

    pub(crate) fn close_transport_in_background(self: &Arc<Self>) {
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let inner = Arc::clone(self);
            runtime.spawn(async move { inner.transport.close().await });
        }
    }

    async fn run_reader(self: Arc<Self>) {
        loop {
            let frame = match self.transport.receive().await {
                Ok(frame) => frame,
                Err(McpError::TransportClosed) => {
                    tracing::debug!("[{}] Transport closed", self.id);
                    break;
                }
                Err(e) => {
                    tracing::warn!("[{}] Transport receive failed: {e}", self.id);
                    break;
                }
            };

            let message = match codec::decode(&frame) {
                Ok(message) => message,
                Err(e) => {
                    self.handle_malformed(&frame, e);
                    continue;
                }
            };

            match message {
                JsonRpcMessage::Response(response) => {
                    self.complete(&response.id, Ok(response.result));
                }
                JsonRpcMessage::Error(error) => {
                    let outcome = Err(McpError::from_error_object(&error.error));
                    self.complete(&error.id, outcome);
                }
                JsonRpcMessage::Request(request) => self.handle_request(request).await,
                JsonRpcMessage::Notification(notification) => {
                    self.handle_notification(notification)
                }
            }
        }

        self.shutdown("transport closed").await;
    }

    fn complete(&self, id: &RequestId, outcome: McpResult<Value>) {
        if !self.pending.resolve(id, outcome) {
            tracing::debug!("[{}] Ignoring response for unknown request {id}", self.id);
        }
    }

    /// A frame that decoded to no message shape. Requests still carrying an
    /// id get an error reply and a response-shaped frame fails the matching
    /// pending call; anything else is dropped.
    fn handle_malformed(self: &Arc<Self>, frame: &[u8], error: McpError) {
        let id = serde_json::from_slice::<Value>(frame)
            .ok()
            .and_then(|value| match value {
                Value::Object(mut object) => {
                    let is_request = object.contains_key("method");
                    let id = object.remove("id")?;
                    let id = serde_json::from_value::<RequestId>(id).ok()?;
                    Some((id, is_request))
                }
                _ => None,
            });

        match id {
            Some((id, true)) => {
                tracing::warn!("[{}] Rejecting malformed request {id}: {error}", self.id);
                let reply = McpError::InvalidRequest(format!("malformed request: {error}"));
                self.reply_in_background(id, Err(reply));
            }
            Some((id, false)) => {
                tracing::warn!("[{}] Malformed response for request {id}: {error}", self.id);
                let outcome = Err(McpError::DecodeError(format!("malformed response: {error}")));
                self.complete(&id, outcome);
            }
            None => tracing::warn!("[{}] Dropping malformed frame: {error}", self.id),
        }
    }

    async fn handle_request(self: &Arc<Self>, request: JsonRpcRequest) {
        let Some(method) = Method::parse(&request.method) else {
            tracing::debug!("[{}] Unknown method {}", self.id, request.method);
            let error = McpError::MethodNotFound(request.method);
            self.reply_in_background(request.id, Err(error));
            return;
        };

        if method == Method::Initialize {
            self.handle_initialize(request).await;
            return;
        }

        match self.state() {
            SessionState::Ready => {}
            SessionState::Closed => {
                tracing::debug!("[{}] Dropping {method} received after close", self.id);
                return;
            }
            state => {
                let error = McpError::NotReady(format!("{method} received while {state}"));
                self.reply_in_background(request.id, Err(error));
                return;
            }
        }

        self.spawn_handler(method, request.id, request.params);
    }

    async fn handle_initialize(self: &Arc<Self>, request: JsonRpcRequest) {
        if self.side == Side::Initiator || self.remote.get().is_some() {
            let error = McpError::InvalidRequest("session already initialized".to_string());
            self.reply_in_background(request.id, Err(error));
            return;
        }

        let params: InitializeParams =
            match serde_json::from_value(request.params.unwrap_or(Value::Null)) {
                Ok(params) => params,
                Err(e) => {
                    let error = McpError::InvalidParams(format!("initialize params: {e}"));
                    self.send_outcome(request.id, Err(error)).await;
                    return;
                }
            };

        match negotiation::respond(params, &self.registry, &self.config) {
            Ok((result, info)) => {
                let _ = self.remote.set(info);
                let outcome = serde_json::to_value(result)
                    .map_err(|e| McpError::HandlerError(format!("initialize result: {e}")));
                self.send_outcome(request.id, outcome).await;
            }
            Err(McpError::IncompatibleVersion(detail)) => {
                tracing::warn!("[{}] Rejecting handshake: {detail}", self.id);
                let error = McpError::IncompatibleVersion(detail.clone());
                self.send_outcome(request.id, Err(error)).await;
                self.handshake_failure
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .replace(McpError::IncompatibleVersion(detail));
                self.shutdown("incompatible protocol version").await;
            }
            Err(e) => self.send_outcome(request.id, Err(e)).await,
        }
    }

    fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            notifications::INITIALIZED => {
                if self.side == Side::Responder && self.remote.get().is_some() {
                    if self.transition(SessionState::Ready) {
                        tracing::info!("[{}] Session ready", self.id);
                    }
                } else {
                    tracing::debug!("[{}] Ignoring unexpected initialized notification", self.id);
                }
            }
            notifications::CANCELLED => {
                let params = notification
                    .params
                    .and_then(|p| serde_json::from_value::<CancelledParams>(p).ok());
                let Some(params) = params else {
                    tracing::debug!("[{}] Ignoring malformed cancellation", self.id);
                    return;
                };

                let handle = self
                    .inflight
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&params.request_id);
                if let Some(handle) = handle {
                    handle.abort();
                    tracing::info!(
                        "[{}] Cancelled request {} ({})",
                        self.id,
                        params.request_id,
                        params.reason.as_deref().unwrap_or("no reason given")
                    );
                }
            }
            other => tracing::debug!("[{}] Ignoring notification {other}", self.id),
        }
    }

    fn spawn_handler(self: &Arc<Self>, method: Method, id: RequestId, params: Option<Value>) {
        let coercion = if self.config.coerce_prompt_arguments {
            Coercion::NumericStrings
        } else {
            Coercion::Strict
        };
        let ctx = RequestContext {
            peer: Peer::new(Arc::clone(self)),
            request_id: id.clone(),
            method,
        };

        let inner = Arc::clone(self);
        let task_id = id.clone();

        // Hold the table while spawning so the task cannot deregister first.
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        let task = tokio::spawn(async move {
            let dispatched = AssertUnwindSafe(inner.registry.dispatch(method, ctx, params, coercion))
                .catch_unwind()
                .await;
            let outcome = dispatched.unwrap_or_else(|panic| {
                tracing::error!("[{}] Handler for {method} panicked", inner.id);
                Err(McpError::HandlerError(panic_message(panic.as_ref())))
            });

            inner
                .inflight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&task_id);
            inner.send_outcome(task_id, outcome).await;
        });
        inflight.insert(id, task.abort_handle());
    }

    /// Send a reply without holding up the reader when the writer is backed up.
    fn reply_in_background(self: &Arc<Self>, id: RequestId, outcome: McpResult<Value>) {
        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.send_outcome(id, outcome).await });
    }

    async fn send_outcome(&self, id: RequestId, outcome: McpResult<Value>) {
        let message = match outcome {
            Ok(result) => JsonRpcMessage::Response(JsonRpcResponse::new(id, result)),
            Err(e) => {
                tracing::debug!("[{}] Request {id} failed: {e}", self.id);
                JsonRpcMessage::Error(e.to_json_rpc_error(id))
            }
        };

        if let Err(e) = self.send_message(&message).await {
            tracing::debug!("[{}] Could not deliver response: {e}", self.id);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}
