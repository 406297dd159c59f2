//! Capability registry: what one side of a session serves, and dispatch into it.
//!
//! A registry is assembled with [`RegistryBuilder`] and frozen before the
//! session starts. Inbound requests are routed by [`CapabilityRegistry::dispatch`],
//! which validates inputs against declared schemas before any handler runs.

pub mod handler;
pub mod uri;

pub use handler::{
    ElicitationHandler, PromptHandler, RequestContext, ResourceHandler, ResourceRequest,
    RootsHandler, SamplingHandler, ToolHandler,
};
pub use uri::UriTemplate;

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::protocol::method::Method;
use crate::protocol::validator::{self, Coercion};
use crate::types::{
    CapabilityDescriptor, CapabilityKind, CapabilitySet, CreateMessageParams, ElicitParams,
    ListRootsResult, McpError, McpResult, PromptDefinition, PromptGetParams, PromptListResult,
    ResourceDefinition, ResourceListResult, ResourceReadParams, ResourceTemplateDefinition,
    ResourceTemplateListResult, ToolCallParams, ToolDefinition, ToolListResult,
};

struct ToolEntry {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

struct ResourceEntry {
    definition: ResourceDefinition,
    handler: Arc<dyn ResourceHandler>,
}

struct TemplateEntry {
    definition: ResourceTemplateDefinition,
    pattern: UriTemplate,
    handler: Arc<dyn ResourceHandler>,
}

struct PromptEntry {
    definition: PromptDefinition,
    schema: Value,
    handler: Arc<dyn PromptHandler>,
}

/// Immutable set of capabilities one side serves.
#[derive(Default)]
pub struct CapabilityRegistry {
    tools: Vec<ToolEntry>,
    resources: Vec<ResourceEntry>,
    templates: Vec<TemplateEntry>,
    prompts: Vec<PromptEntry>,
    roots: Option<Arc<dyn RootsHandler>>,
    sampling: Option<Arc<dyn SamplingHandler>>,
    elicitation: Option<Arc<dyn ElicitationHandler>>,
}

impl CapabilityRegistry {
    /// Start assembling a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// A registry that serves nothing besides `ping`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The capability set declared during the handshake.
    pub fn descriptors(&self) -> CapabilitySet {
        let mut out = Vec::new();

        for tool in &self.tools {
            out.push(CapabilityDescriptor {
                name: tool.definition.name.clone(),
                kind: CapabilityKind::Tool,
                description: tool.definition.description.clone(),
                input_schema: Some(tool.definition.input_schema.clone()),
            });
        }
        for resource in &self.resources {
            out.push(CapabilityDescriptor {
                name: resource.definition.uri.clone(),
                kind: CapabilityKind::Resource,
                description: resource.definition.description.clone(),
                input_schema: None,
            });
        }
        for template in &self.templates {
            out.push(CapabilityDescriptor {
                name: template.definition.uri_template.clone(),
                kind: CapabilityKind::Resource,
                description: template.definition.description.clone(),
                input_schema: None,
            });
        }
        for prompt in &self.prompts {
            out.push(CapabilityDescriptor {
                name: prompt.definition.name.clone(),
                kind: CapabilityKind::Prompt,
                description: prompt.definition.description.clone(),
                input_schema: Some(prompt.schema.clone()),
            });
        }
        if self.roots.is_some() {
            out.push(CapabilityDescriptor::new(
                Method::RootsList.as_str(),
                CapabilityKind::Roots,
            ));
        }
        if self.sampling.is_some() {
            out.push(CapabilityDescriptor::new(
                Method::SamplingCreateMessage.as_str(),
                CapabilityKind::Sampling,
            ));
        }
        if self.elicitation.is_some() {
            out.push(CapabilityDescriptor::new(
                Method::ElicitationCreate.as_str(),
                CapabilityKind::Elicitation,
            ));
        }

        CapabilitySet::new(out)
    }

    /// Whether anything of this kind is registered.
    pub fn supports(&self, kind: CapabilityKind) -> bool {
        match kind {
            CapabilityKind::Tool => !self.tools.is_empty(),
            CapabilityKind::Resource => !self.resources.is_empty() || !self.templates.is_empty(),
            CapabilityKind::Prompt => !self.prompts.is_empty(),
            CapabilityKind::Roots => self.roots.is_some(),
            CapabilityKind::Sampling => self.sampling.is_some(),
            CapabilityKind::Elicitation => self.elicitation.is_some(),
        }
    }

    /// Route one inbound request to its handler and serialize the result.
    ///
    /// `initialize` never reaches here; the session answers it directly.
    pub async fn dispatch(
        &self,
        method: Method,
        ctx: RequestContext,
        params: Option<Value>,
        prompt_coercion: Coercion,
    ) -> McpResult<Value> {
        if let Some(kind) = method.required_capability() {
            if !self.supports(kind) {
                return Err(McpError::MethodNotFound(format!(
                    "{method} (no {kind} capability registered)"
                )));
            }
        }

        match method {
            Method::Initialize => Err(McpError::InvalidRequest(
                "initialize is only valid as the first request".to_string(),
            )),
            Method::Ping => Ok(serde_json::json!({})),
            Method::ToolsList => to_result(ToolListResult {
                tools: self.tools.iter().map(|t| t.definition.clone()).collect(),
                next_cursor: None,
            }),
            Method::ToolsCall => {
                let params: ToolCallParams = parse_params(params)?;
                self.call_tool(ctx, params).await
            }
            Method::ResourcesList => to_result(ResourceListResult {
                resources: self.resources.iter().map(|r| r.definition.clone()).collect(),
                next_cursor: None,
            }),
            Method::ResourceTemplatesList => to_result(ResourceTemplateListResult {
                resource_templates: self.templates.iter().map(|t| t.definition.clone()).collect(),
                next_cursor: None,
            }),
            Method::ResourcesRead => {
                let params: ResourceReadParams = parse_params(params)?;
                self.read_resource(ctx, params.uri).await
            }
            Method::PromptsList => to_result(PromptListResult {
                prompts: self.prompts.iter().map(|p| p.definition.clone()).collect(),
                next_cursor: None,
            }),
            Method::PromptsGet => {
                let params: PromptGetParams = parse_params(params)?;
                self.get_prompt(ctx, params, prompt_coercion).await
            }
            Method::RootsList => {
                let handler = self.roots.as_ref().ok_or_else(|| not_served(method))?;
                let roots = handler.list(ctx).await.map_err(handler_failure)?;
                to_result(ListRootsResult { roots })
            }
            Method::SamplingCreateMessage => {
                let handler = self.sampling.as_ref().ok_or_else(|| not_served(method))?;
                let params: CreateMessageParams = parse_params(params)?;
                let result = handler
                    .create_message(ctx, params)
                    .await
                    .map_err(handler_failure)?;
                to_result(result)
            }
            Method::ElicitationCreate => {
                let handler = self.elicitation.as_ref().ok_or_else(|| not_served(method))?;
                let params: ElicitParams = parse_params(params)?;
                let result = handler.elicit(ctx, params).await.map_err(handler_failure)?;
                to_result(result)
            }
        }
    }

    async fn call_tool(&self, ctx: RequestContext, params: ToolCallParams) -> McpResult<Value> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.definition.name == params.name)
            .ok_or_else(|| McpError::ToolNotFound(params.name.clone()))?;

        let arguments = params
            .arguments
            .unwrap_or_else(|| Value::Object(Map::new()));
        let arguments =
            validator::validate(&arguments, &tool.definition.input_schema, Coercion::Strict)?;

        tracing::debug!("Calling tool {}", params.name);
        let result = tool
            .handler
            .call(ctx, arguments)
            .await
            .map_err(handler_failure)?;
        to_result(result)
    }

    async fn read_resource(&self, ctx: RequestContext, uri: String) -> McpResult<Value> {
        if let Some(resource) = self.resources.iter().find(|r| r.definition.uri == uri) {
            let request = ResourceRequest {
                uri,
                variables: HashMap::new(),
            };
            let result = resource
                .handler
                .read(ctx, request)
                .await
                .map_err(handler_failure)?;
            return to_result(result);
        }

        for template in &self.templates {
            if let Some(variables) = template.pattern.matches(&uri) {
                let request = ResourceRequest { uri, variables };
                let result = template
                    .handler
                    .read(ctx, request)
                    .await
                    .map_err(handler_failure)?;
                return to_result(result);
            }
        }

        Err(McpError::ResourceNotFound(uri))
    }

    async fn get_prompt(
        &self,
        ctx: RequestContext,
        params: PromptGetParams,
        coercion: Coercion,
    ) -> McpResult<Value> {
        let prompt = self
            .prompts
            .iter()
            .find(|p| p.definition.name == params.name)
            .ok_or_else(|| McpError::PromptNotFound(params.name.clone()))?;

        let arguments = Value::Object(params.arguments.unwrap_or_default());
        let arguments = match validator::validate(&arguments, &prompt.schema, coercion)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let result = prompt
            .handler
            .get(ctx, arguments)
            .await
            .map_err(handler_failure)?;
        to_result(result)
    }
}

/// Assembles a [`CapabilityRegistry`]. Registering a name twice replaces
/// the earlier entry.
#[derive(Default)]
pub struct RegistryBuilder {
    registry: CapabilityRegistry,
}

impl RegistryBuilder {
    /// Register a tool. Arguments are validated against `input_schema`.
    pub fn tool(mut self, definition: ToolDefinition, handler: impl ToolHandler + 'static) -> Self {
        let tools = &mut self.registry.tools;
        if tools.iter().any(|t| t.definition.name == definition.name) {
            tracing::warn!("Tool {} registered twice; keeping the latest", definition.name);
            tools.retain(|t| t.definition.name != definition.name);
        }
        tools.push(ToolEntry {
            definition,
            handler: Arc::new(handler),
        });
        self
    }

    /// Register a resource at a fixed URI.
    pub fn resource(
        mut self,
        definition: ResourceDefinition,
        handler: impl ResourceHandler + 'static,
    ) -> Self {
        let resources = &mut self.registry.resources;
        resources.retain(|r| r.definition.uri != definition.uri);
        resources.push(ResourceEntry {
            definition,
            handler: Arc::new(handler),
        });
        self
    }

    /// Register a resource family addressed by a URI template.
    pub fn resource_template(
        mut self,
        definition: ResourceTemplateDefinition,
        handler: impl ResourceHandler + 'static,
    ) -> Self {
        let templates = &mut self.registry.templates;
        templates.retain(|t| t.definition.uri_template != definition.uri_template);
        templates.push(TemplateEntry {
            pattern: UriTemplate::parse(&definition.uri_template),
            definition,
            handler: Arc::new(handler),
        });
        self
    }

    /// Register a prompt. Its argument list becomes the validation schema.
    pub fn prompt(
        mut self,
        definition: PromptDefinition,
        handler: impl PromptHandler + 'static,
    ) -> Self {
        let schema = validator::object_schema(definition.arguments.iter().flatten().map(|a| {
            (
                a.name.as_str(),
                a.schema.clone().unwrap_or_else(|| Value::Object(Map::new())),
                a.required,
            )
        }));

        let prompts = &mut self.registry.prompts;
        prompts.retain(|p| p.definition.name != definition.name);
        prompts.push(PromptEntry {
            definition,
            schema,
            handler: Arc::new(handler),
        });
        self
    }

    /// Serve `roots/list`.
    pub fn roots(mut self, handler: impl RootsHandler + 'static) -> Self {
        self.registry.roots = Some(Arc::new(handler));
        self
    }

    /// Serve `sampling/createMessage`.
    pub fn sampling(mut self, handler: impl SamplingHandler + 'static) -> Self {
        self.registry.sampling = Some(Arc::new(handler));
        self
    }

    /// Serve `elicitation/create`.
    pub fn elicitation(mut self, handler: impl ElicitationHandler + 'static) -> Self {
        self.registry.elicitation = Some(Arc::new(handler));
        self
    }

    /// Freeze the registry.
    pub fn build(self) -> CapabilityRegistry {
        self.registry
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> McpResult<T> {
    let params = params.unwrap_or_else(|| Value::Object(Map::new()));
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
}

fn to_result<T: Serialize>(result: T) -> McpResult<Value> {
    serde_json::to_value(result)
        .map_err(|e| McpError::HandlerError(format!("unserializable result: {e}")))
}

fn not_served(method: Method) -> McpError {
    McpError::MethodNotFound(method.to_string())
}

// Handlers may reject their input; anything else they raise is a handler failure.
fn handler_failure(error: McpError) -> McpError {
    match error {
        McpError::InvalidParams(_)
        | McpError::HandlerError(_)
        | McpError::ToolNotFound(_)
        | McpError::ResourceNotFound(_)
        | McpError::PromptNotFound(_) => error,
        other => McpError::HandlerError(other.to_string()),
    }
}
