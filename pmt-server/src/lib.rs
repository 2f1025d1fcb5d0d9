//! PMT backend library.
//!
//! Exposes the REST server for use in tests and embedding. The server keeps
//! users, projects, tasks, memberships, assignments, and change history in
//! memory and speaks the JSON contract defined in `pmt-proto`.

pub mod config;
pub mod routes;
pub mod store;
