//! Demo client callbacks: fixed roots, a keyword-driven stand-in for a
//! language model, and canned answers for elicitation.
//!
//! All three are deterministic so a host can be exercised end to end
//! without a model or a person on the other side.

use mcp_duplex::protocol::validator::{self, Coercion};
use mcp_duplex::registry::RequestContext;
use mcp_duplex::types::{
    Content, CreateMessageParams, CreateMessageResult, ElicitParams, ElicitResult, McpResult,
    Role, Root,
};
use serde_json::{json, Value};

/// Model name reported by the sampling policy.
pub const MODEL_NAME: &str = "travel-assistant-llm";

/// Text returned when the conversation has no user message.
pub const NO_PROMPT_REPLY: &str = "I couldn't generate a response.";

const POEM: &str = "Flights soar through azure skies,\n\
                    Connecting distant hearts and minds,\n\
                    Travel dreams come true.";

const EXPLANATION: &str = "Flight booking involves searching for available flights, comparing \
                           prices and schedules, selecting preferred options, and completing \
                           the reservation process with payment.";

const STORY: &str = "Once upon a time, there was a traveler named Sam who used an innovative \
                     flight booking system. With just a few clicks, Sam found the perfect \
                     flight, selected a window seat, and received instant confirmation.";

const RECOMMENDATION: &str = "I recommend booking flights 2-3 months in advance for domestic \
                              travel, being flexible with dates, and considering nearby \
                              airports for better deals.";

/// Roots the demo client exposes, in order.
pub fn project_roots() -> Vec<Root> {
    [
        "file:///home/lab-user/",
        "file:///home/lab-user/flight-booking-server/",
        "file:///home/lab-user/mcp-client/",
    ]
    .into_iter()
    .map(Root::new)
    .collect()
}

/// Answer a sampling request from the last user message.
pub fn sample(params: &CreateMessageParams) -> CreateMessageResult {
    let prompt = params
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| match &m.content {
            Content::Text { text } => text.clone(),
            Content::Structured { data } => data.to_string(),
        });

    let text = match prompt {
        Some(prompt) => {
            let lower = prompt.to_lowercase();
            if lower.contains("poem") {
                POEM.to_string()
            } else if lower.contains("explain") {
                EXPLANATION.to_string()
            } else if lower.contains("story") {
                STORY.to_string()
            } else if lower.contains("recommend") || lower.contains("suggest") {
                RECOMMENDATION.to_string()
            } else {
                format!("Here's a thoughtful response about travel and flight booking: {prompt}")
            }
        }
        None => NO_PROMPT_REPLY.to_string(),
    };

    CreateMessageResult {
        role: Role::Assistant,
        content: Content::text(text),
        model: MODEL_NAME.to_string(),
        stop_reason: Some("endTurn".to_string()),
    }
}

/// Canned user answer for an elicitation message.
pub fn canned_answer(message: &str) -> Value {
    let lower = message.to_lowercase();
    if lower.contains("name") {
        json!({"name": "Sarah Wilson", "title": "Dr."})
    } else if lower.contains("email") {
        json!({"email": "sarah.wilson@example.com", "notifications": true})
    } else if lower.contains("preference") {
        json!({"seat": "aisle", "class": "economy", "meal": "vegetarian"})
    } else if lower.contains("budget") {
        json!({"budget": 750, "currency": "USD", "flexible": true})
    } else if lower.contains("date") {
        json!({"departure": "2024-12-30", "return": "2025-01-05", "flexible": true})
    } else {
        json!({"response": "confirmed", "user_id": "user_789"})
    }
}

/// Accept with the canned answer when it satisfies the requested schema,
/// decline otherwise.
pub fn elicit(params: &ElicitParams) -> ElicitResult {
    if params.message.trim().is_empty() {
        return ElicitResult::Decline {
            reason: Some("No input provided".to_string()),
        };
    }

    let answer = canned_answer(&params.message);
    match validator::validate(&answer, &params.requested_schema, Coercion::Strict) {
        Ok(content) => ElicitResult::Accept { content },
        Err(e) => {
            tracing::debug!("Declining elicitation, canned answer does not fit: {e}");
            ElicitResult::Decline {
                reason: Some(format!("No suitable answer: {e}")),
            }
        }
    }
}

/// `roots/list` callback.
pub async fn list_roots(_ctx: RequestContext) -> McpResult<Vec<Root>> {
    Ok(project_roots())
}

/// `sampling/createMessage` callback.
pub async fn create_message(
    _ctx: RequestContext,
    params: CreateMessageParams,
) -> McpResult<CreateMessageResult> {
    Ok(sample(&params))
}

/// `elicitation/create` callback.
pub async fn elicitation(_ctx: RequestContext, params: ElicitParams) -> McpResult<ElicitResult> {
    tracing::info!("Elicitation requested: {}", params.message);
    Ok(elicit(&params))
}
