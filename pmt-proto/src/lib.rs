//! Wire model for PMT: the JSON types exchanged between the client and the
//! REST backend, plus the field validation both sides share.

pub mod auth;
pub mod history;
pub mod project;
pub mod task;
pub mod user;
pub mod validate;
