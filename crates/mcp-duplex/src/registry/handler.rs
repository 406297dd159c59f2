//! Handler traits for host capabilities and client callbacks.
//!
//! Each trait has a blanket impl for async closures, so most registrations
//! are written as `|ctx: RequestContext, args: Value| async move { ... }`.

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::protocol::Method;
use crate::session::Peer;
use crate::types::{
    CreateMessageParams, CreateMessageResult, ElicitParams, ElicitResult, McpResult,
    PromptGetResult, ReadResourceResult, RequestId, Root, ToolCallResult,
};

/// Per-invocation context handed to every handler.
#[derive(Clone)]
pub struct RequestContext {
    /// Handle for calling back across the same session.
    pub peer: Peer,
    /// Id of the inbound request being served.
    pub request_id: RequestId,
    /// Method being served.
    pub method: Method,
}

/// A resource read after URI matching.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    /// The URI the peer asked for.
    pub uri: String,
    /// Values bound to `{name}` placeholders of a template; empty for fixed URIs.
    pub variables: HashMap<String, String>,
}

/// Host tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with already-validated arguments.
    async fn call(&self, ctx: RequestContext, arguments: Value) -> McpResult<ToolCallResult>;
}

/// Host resource or resource template.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Produce the resource contents.
    async fn read(&self, ctx: RequestContext, request: ResourceRequest)
        -> McpResult<ReadResourceResult>;
}

/// Host prompt template.
#[async_trait]
pub trait PromptHandler: Send + Sync {
    /// Render the prompt with already-validated arguments.
    async fn get(
        &self,
        ctx: RequestContext,
        arguments: Map<String, Value>,
    ) -> McpResult<PromptGetResult>;
}

/// Client roots callback.
#[async_trait]
pub trait RootsHandler: Send + Sync {
    /// Roots the host may reference, in order.
    async fn list(&self, ctx: RequestContext) -> McpResult<Vec<Root>>;
}

/// Client sampling callback.
#[async_trait]
pub trait SamplingHandler: Send + Sync {
    /// Generate one message for the given history. Must answer or refuse.
    async fn create_message(
        &self,
        ctx: RequestContext,
        params: CreateMessageParams,
    ) -> McpResult<CreateMessageResult>;
}

/// Client elicitation callback.
#[async_trait]
pub trait ElicitationHandler: Send + Sync {
    /// Ask the user and report accept, decline, or cancel.
    async fn elicit(&self, ctx: RequestContext, params: ElicitParams) -> McpResult<ElicitResult>;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Fn(RequestContext, Value) -> Fut + Send + Sync,
    Fut: Future<Output = McpResult<ToolCallResult>> + Send,
{
    async fn call(&self, ctx: RequestContext, arguments: Value) -> McpResult<ToolCallResult> {
        (self)(ctx, arguments).await
    }
}

#[async_trait]
impl<F, Fut> ResourceHandler for F
where
    F: Fn(RequestContext, ResourceRequest) -> Fut + Send + Sync,
    Fut: Future<Output = McpResult<ReadResourceResult>> + Send,
{
    async fn read(
        &self,
        ctx: RequestContext,
        request: ResourceRequest,
    ) -> McpResult<ReadResourceResult> {
        (self)(ctx, request).await
    }
}

#[async_trait]
impl<F, Fut> PromptHandler for F
where
    F: Fn(RequestContext, Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = McpResult<PromptGetResult>> + Send,
{
    async fn get(
        &self,
        ctx: RequestContext,
        arguments: Map<String, Value>,
    ) -> McpResult<PromptGetResult> {
        (self)(ctx, arguments).await
    }
}

#[async_trait]
impl<F, Fut> RootsHandler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = McpResult<Vec<Root>>> + Send,
{
    async fn list(&self, ctx: RequestContext) -> McpResult<Vec<Root>> {
        (self)(ctx).await
    }
}

#[async_trait]
impl<F, Fut> SamplingHandler for F
where
    F: Fn(RequestContext, CreateMessageParams) -> Fut + Send + Sync,
    Fut: Future<Output = McpResult<CreateMessageResult>> + Send,
{
    async fn create_message(
        &self,
        ctx: RequestContext,
        params: CreateMessageParams,
    ) -> McpResult<CreateMessageResult> {
        (self)(ctx, params).await
    }
}

#[async_trait]
impl<F, Fut> ElicitationHandler for F
where
    F: Fn(RequestContext, ElicitParams) -> Fut + Send + Sync,
    Fut: Future<Output = McpResult<ElicitResult>> + Send,
{
    async fn elicit(&self, ctx: RequestContext, params: ElicitParams) -> McpResult<ElicitResult> {
        (self)(ctx, params).await
    }
}
