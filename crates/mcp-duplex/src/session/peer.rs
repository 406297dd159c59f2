//! Cloneable handle for issuing requests across a session.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::protocol::notifications;
use crate::protocol::validator::{self, Coercion};
use crate::protocol::Method;
use crate::types::{
    CancelledParams, CreateMessageParams, CreateMessageResult, ElicitParams, ElicitResult,
    JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, ListParams, ListRootsResult, McpError,
    McpResult, PeerInfo, PromptDefinition, PromptGetParams, PromptGetResult, PromptListResult,
    ReadResourceResult, RequestId, ResourceDefinition, ResourceListResult, ResourceReadParams,
    ResourceTemplateDefinition, ResourceTemplateListResult, Root, ToolCallParams, ToolCallResult,
    ToolDefinition, ToolListResult,
};

use super::inner::SessionInner;
use super::state::SessionState;

/// Handle to one session for outbound calls. Handlers receive one in their
/// [`RequestContext`](crate::registry::RequestContext) to call back to the
/// peer mid-request.
#[derive(Clone)]
pub struct Peer {
    inner: Arc<SessionInner>,
}

impl Peer {
    pub(crate) fn new(inner: Arc<SessionInner>) -> Self {
        Self { inner }
    }

    /// Session id used in log lines.
    pub fn session_id(&self) -> &str {
        &self.inner.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner.state()
    }

    /// What the peer declared during the handshake.
    pub fn remote(&self) -> Option<&PeerInfo> {
        self.inner.remote.get()
    }

    /// Outbound requests still awaiting a response.
    pub fn pending_requests(&self) -> usize {
        self.inner.pending.len()
    }

    /// Send a request and wait for its response.
    ///
    /// With `timeout` set, the call fails with `RequestTimeout` once it
    /// elapses and a late response is ignored. Without one it waits until
    /// the response arrives or the session closes.
    pub async fn call(
        &self,
        method: Method,
        params: Option<Value>,
        timeout: Option<Duration>,
    ) -> McpResult<Value> {
        match self.inner.state() {
            SessionState::Closed => return Err(McpError::SessionClosed),
            SessionState::Ready => {}
            _ if method == Method::Initialize => {}
            state => {
                return Err(McpError::NotReady(format!(
                    "cannot call {method} while {state}"
                )))
            }
        }

        let id = self.inner.next_request_id();
        let outcome = self.inner.pending.register(id.clone(), method.as_str())?;
        let mut guard = PendingGuard {
            inner: Arc::clone(&self.inner),
            id: id.clone(),
            armed: true,
        };

        let request = JsonRpcMessage::Request(JsonRpcRequest::new(id, method.as_str(), params));
        if let Err(e) = self.inner.send_message(&request).await {
            guard.armed = false;
            self.inner.pending.discard(&guard.id);
            return Err(e);
        }

        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, outcome).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::warn!(
                        "[{}] Request {} ({method}) timed out after {limit:?}",
                        self.inner.id,
                        guard.id
                    );
                    return Err(McpError::RequestTimeout {
                        method: method.to_string(),
                        timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    });
                }
            },
            None => outcome.await,
        };

        guard.armed = false;
        received.unwrap_or_else(|_| Err(McpError::SessionClosed))
    }

    /// Send a notification. Fails only once the session is closed.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> McpResult<()> {
        if self.inner.state() == SessionState::Closed {
            return Err(McpError::SessionClosed);
        }
        let notification = JsonRpcMessage::Notification(JsonRpcNotification::new(method, params));
        self.inner.send_message(&notification).await
    }

    /// Liveness probe.
    pub async fn ping(&self) -> McpResult<()> {
        let _: Value = self.request(Method::Ping, &Map::new()).await?;
        Ok(())
    }

    /// Tools the peer serves.
    pub async fn list_tools(&self) -> McpResult<Vec<ToolDefinition>> {
        let result: ToolListResult = self.request(Method::ToolsList, &ListParams::default()).await?;
        Ok(result.tools)
    }

    /// Invoke a peer tool.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolCallResult> {
        let params = ToolCallParams {
            name: name.to_string(),
            arguments: Some(arguments),
        };
        self.request(Method::ToolsCall, &params).await
    }

    /// Fixed-URI resources the peer serves.
    pub async fn list_resources(&self) -> McpResult<Vec<ResourceDefinition>> {
        let result: ResourceListResult = self
            .request(Method::ResourcesList, &ListParams::default())
            .await?;
        Ok(result.resources)
    }

    /// Resource templates the peer serves.
    pub async fn list_resource_templates(&self) -> McpResult<Vec<ResourceTemplateDefinition>> {
        let result: ResourceTemplateListResult = self
            .request(Method::ResourceTemplatesList, &ListParams::default())
            .await?;
        Ok(result.resource_templates)
    }

    /// Read a resource by URI.
    pub async fn read_resource(&self, uri: &str) -> McpResult<ReadResourceResult> {
        let params = ResourceReadParams {
            uri: uri.to_string(),
        };
        self.request(Method::ResourcesRead, &params).await
    }

    /// Prompts the peer serves.
    pub async fn list_prompts(&self) -> McpResult<Vec<PromptDefinition>> {
        let result: PromptListResult = self
            .request(Method::PromptsList, &ListParams::default())
            .await?;
        Ok(result.prompts)
    }

    /// Expand a peer prompt.
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> McpResult<PromptGetResult> {
        let params = PromptGetParams {
            name: name.to_string(),
            arguments: Some(arguments),
        };
        self.request(Method::PromptsGet, &params).await
    }

    /// Roots the client exposes.
    pub async fn list_roots(&self) -> McpResult<Vec<Root>> {
        let result: ListRootsResult = self.request(Method::RootsList, &Map::new()).await?;
        Ok(result.roots)
    }

    /// Ask the client to generate a message.
    pub async fn create_message(
        &self,
        params: CreateMessageParams,
    ) -> McpResult<CreateMessageResult> {
        self.request(Method::SamplingCreateMessage, &params).await
    }

    /// Ask the client for structured user input. Accepted content that does
    /// not satisfy `requested_schema` is rejected with `InvalidParams`.
    pub async fn elicit(&self, params: ElicitParams) -> McpResult<ElicitResult> {
        let schema = params.requested_schema.clone();
        let result: ElicitResult = self.request(Method::ElicitationCreate, &params).await?;

        if let ElicitResult::Accept { content } = &result {
            validator::validate(content, &schema, Coercion::Strict)?;
        }
        Ok(result)
    }

    async fn request<P, R>(&self, method: Method, params: &P) -> McpResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.ensure_remote_supports(method)?;

        let params = serde_json::to_value(params)
            .map_err(|e| McpError::InvalidParams(format!("{method} params: {e}")))?;
        let value = self
            .call(method, Some(params), self.inner.config.request_timeout())
            .await?;

        serde_json::from_value(value)
            .map_err(|e| McpError::DecodeError(format!("invalid {method} result: {e}")))
    }

    fn ensure_remote_supports(&self, method: Method) -> McpResult<()> {
        let Some(kind) = method.required_capability() else {
            return Ok(());
        };
        match self.inner.remote.get() {
            Some(remote) if !remote.capabilities.supports(kind) => Err(McpError::MethodNotFound(
                format!("{method} (peer declared no {kind} capability)"),
            )),
            _ => Ok(()),
        }
    }
}

/// Removes the pending entry if the call is abandoned before completing.
struct PendingGuard {
    inner: Arc<SessionInner>,
    id: RequestId,
    armed: bool,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.armed || !self.inner.pending.discard(&self.id) {
            return;
        }
        if !self.inner.config.notify_on_cancel || self.inner.state() != SessionState::Ready {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let inner = Arc::clone(&self.inner);
        let params = CancelledParams {
            request_id: self.id.clone(),
            reason: Some("caller stopped waiting".to_string()),
        };
        runtime.spawn(async move {
            let Ok(params) = serde_json::to_value(params) else {
                return;
            };
            let notification = JsonRpcMessage::Notification(JsonRpcNotification::new(
                notifications::CANCELLED,
                Some(params),
            ));
            if let Err(e) = inner.send_message(&notification).await {
                tracing::debug!("[{}] Could not send cancellation: {e}", inner.id);
            }
        });
    }
}
