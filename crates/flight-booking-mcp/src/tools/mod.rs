//! Host tools. Each module exposes `definition()` and `execute()`.

pub mod confirm_booking;
pub mod create_booking;
pub mod list_client_roots;
pub mod plan_trip;
pub mod search_flights;
