//! Shared test infrastructure.

mod helpers;

pub(crate) use context::*;
pub(crate) use db::TestDb;
pub(crate) use helpers::*;
