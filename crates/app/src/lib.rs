//! Booking and payment domain, persistence and collaborator clients.

pub mod auth;
pub mod context;
pub mod database;
pub mod domain;
pub mod ids;
pub mod resilience;

#[cfg(test)]
mod test;
