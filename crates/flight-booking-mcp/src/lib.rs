//! Flight booking MCP host, plus the demo client callbacks that drive it.
//!
//! The host serves flight search, booking, reference-data resources, and
//! prompt templates. Two of its tools call back into the client mid-request
//! (sampling for trip plans, elicitation for passenger details).

pub mod bookings;
pub mod callbacks;
pub mod prompts;
pub mod resources;
pub mod tools;

use mcp_duplex::registry::{RequestContext, ResourceRequest};
use mcp_duplex::{CapabilityRegistry, SessionConfig};
use serde_json::{Map, Value};

use bookings::BookingLedger;

/// Name advertised by the host during the handshake.
pub const HOST_NAME: &str = "flight-booking-server";

/// Name advertised by the demo client during the handshake.
pub const CLIENT_NAME: &str = "flight-booking-client";

const HOST_INSTRUCTIONS: &str = "Use search_flights before create_booking. \
     confirm_booking asks the user for passenger details.";

/// Host-side session config layered over `base`.
pub fn host_config(base: SessionConfig) -> SessionConfig {
    let mut config = base.with_implementation(HOST_NAME, env!("CARGO_PKG_VERSION"));
    if config.instructions.is_none() {
        config.instructions = Some(HOST_INSTRUCTIONS.to_string());
    }
    config
}

/// Client-side session config layered over `base`.
pub fn client_config(base: SessionConfig) -> SessionConfig {
    base.with_implementation(CLIENT_NAME, env!("CARGO_PKG_VERSION"))
}

/// Every host capability, backed by `ledger`.
pub fn host_registry(ledger: BookingLedger) -> CapabilityRegistry {
    let create_ledger = ledger.clone();
    let confirm_ledger = ledger.clone();
    let resource_ledger = ledger;

    CapabilityRegistry::builder()
        .tool(
            tools::search_flights::definition(),
            |_ctx: RequestContext, args: Value| tools::search_flights::execute(args),
        )
        .tool(
            tools::create_booking::definition(),
            move |_ctx: RequestContext, args: Value| {
                let ledger = create_ledger.clone();
                async move { tools::create_booking::execute(args, &ledger).await }
            },
        )
        .tool(tools::plan_trip::definition(), tools::plan_trip::execute)
        .tool(
            tools::confirm_booking::definition(),
            move |ctx: RequestContext, args: Value| {
                let ledger = confirm_ledger.clone();
                async move { tools::confirm_booking::execute(ctx, args, &ledger).await }
            },
        )
        .tool(
            tools::list_client_roots::definition(),
            |ctx: RequestContext, _args: Value| tools::list_client_roots::execute(ctx),
        )
        .resource(
            resources::catalog::airports_definition(),
            |_ctx: RequestContext, _req: ResourceRequest| resources::catalog::read_airports(),
        )
        .resource(
            resources::catalog::airlines_definition(),
            |_ctx: RequestContext, _req: ResourceRequest| resources::catalog::read_airlines(),
        )
        .resource_template(
            resources::booking::definition(),
            move |_ctx: RequestContext, req: ResourceRequest| {
                let ledger = resource_ledger.clone();
                async move { resources::booking::read_booking(req, &ledger).await }
            },
        )
        .prompt(
            prompts::find_best_flight::definition(),
            |_ctx: RequestContext, args: Map<String, Value>| async move {
                prompts::find_best_flight::expand(&args)
            },
        )
        .prompt(
            prompts::handle_disruption::definition(),
            |_ctx: RequestContext, args: Map<String, Value>| async move {
                prompts::handle_disruption::expand(&args)
            },
        )
        .build()
}

/// The demo client: roots, sampling, and elicitation callbacks.
pub fn client_registry() -> CapabilityRegistry {
    CapabilityRegistry::builder()
        .roots(callbacks::list_roots)
        .sampling(callbacks::create_message)
        .elicitation(callbacks::elicitation)
        .build()
}
