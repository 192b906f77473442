//! Payments: VNPAY redirect flow reconciled against the booking service

mod bookings_client;
pub mod errors;
pub mod models;
mod repository;
pub mod service;
pub mod vnpay;

pub use bookings_client::*;
pub use errors::*;
pub use service::*;
