//! Prompt template: find the best flight within a budget.

use mcp_duplex::types::{
    Content, McpError, McpResult, PromptArgument, PromptDefinition, PromptGetResult,
    PromptMessage, Role,
};
use serde_json::{Map, Value};

/// Return the prompt definition for find_best_flight.
pub fn definition() -> PromptDefinition {
    PromptDefinition {
        name: "find_best_flight".to_string(),
        description: Some(
            "Generate a prompt for finding the best flight within budget".to_string(),
        ),
        arguments: Some(vec![
            PromptArgument::required("budget", "Maximum ticket price in USD", "number"),
            PromptArgument::optional("preferences", "Cabin or schedule preferences", "string"),
        ]),
    }
}

/// Whole amounts keep one decimal place, so `800` and `"800.0"` render alike.
fn format_budget(amount: f64) -> String {
    if amount.is_finite() && amount.fract() == 0.0 {
        format!("{amount:.1}")
    } else {
        amount.to_string()
    }
}

/// Expand the `find_best_flight` prompt. `budget` arrives already checked
/// as a number.
pub fn expand(args: &Map<String, Value>) -> McpResult<PromptGetResult> {
    let budget = match args.get("budget") {
        Some(Value::Number(budget)) => match budget.as_f64() {
            Some(amount) => format_budget(amount),
            None => budget.to_string(),
        },
        _ => {
            return Err(McpError::InvalidParams(
                "'budget' must be a number".to_string(),
            ))
        }
    };
    let preferences = args
        .get("preferences")
        .and_then(Value::as_str)
        .unwrap_or("economy");

    let text = format!(
        "Please help me find the best flight within a ${budget} budget.\n\n\
         My preferences: {preferences}\n\n\
         Please consider:\n\
         - Price (must be under ${budget})\n\
         - Flight duration\n\
         - Airline reputation\n\
         - Departure times\n\n\
         Use the search_flights tool to find available options and provide a \
         recommendation with reasoning."
    );

    Ok(PromptGetResult {
        description: Some("Find the best flight within budget".to_string()),
        messages: vec![PromptMessage {
            role: Role::User,
            content: Content::text(text),
        }],
    })
}
