//! Persisted résumé records: storage, completeness scoring, and the read and
//! website endpoints built on top of them.

pub mod completeness;
pub mod handlers;
pub mod store;
