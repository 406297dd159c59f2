//! Host resources: reference catalogs and per-booking views.

pub mod booking;
pub mod catalog;
