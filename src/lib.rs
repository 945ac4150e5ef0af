//! Feed polling core: jittered conditional fetching, idempotent ingestion
//! into score-ranked collections, and bounded retention.

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod services;
pub mod sources;
pub mod storage;
