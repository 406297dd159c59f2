//! In-process booking ledger shared by the booking tools and resources.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// A confirmed booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// `BK` followed by the last three characters of the flight id.
    pub booking_id: String,
    /// Flight that was booked.
    pub flight_id: String,
    /// Passenger name as given.
    pub passenger: String,
    /// Always `confirmed`; there is no payment step.
    pub status: String,
    /// When the booking was made.
    pub created_at: DateTime<Utc>,
}

/// Bookings made by this process, keyed by booking id.
#[derive(Clone, Default)]
pub struct BookingLedger {
    bookings: Arc<Mutex<HashMap<String, Booking>>>,
}

impl BookingLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Book a flight. Booking the same flight again replaces the earlier entry.
    pub async fn create(&self, flight_id: &str, passenger: &str) -> Booking {
        let booking = Booking {
            booking_id: booking_id(flight_id),
            flight_id: flight_id.to_string(),
            passenger: passenger.to_string(),
            status: "confirmed".to_string(),
            created_at: Utc::now(),
        };

        tracing::info!(
            "Booked {} for {} as {}",
            booking.flight_id,
            booking.passenger,
            booking.booking_id
        );
        self.bookings
            .lock()
            .await
            .insert(booking.booking_id.clone(), booking.clone());
        booking
    }

    /// Look up a booking by id.
    pub async fn get(&self, booking_id: &str) -> Option<Booking> {
        self.bookings.lock().await.get(booking_id).cloned()
    }

    /// Number of bookings held.
    pub async fn len(&self) -> usize {
        self.bookings.lock().await.len()
    }

    /// Whether no bookings were made yet.
    pub async fn is_empty(&self) -> bool {
        self.bookings.lock().await.is_empty()
    }
}

/// `BK` plus the last three characters of the flight id (all of it if shorter).
pub fn booking_id(flight_id: &str) -> String {
    let chars: Vec<char> = flight_id.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(3)..].iter().collect();
    format!("BK{tail}")
}
