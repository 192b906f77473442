//! Cowork Domain Concerns

pub mod bookings;
pub mod events;
pub mod payments;
pub mod resources;
