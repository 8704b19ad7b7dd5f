//! Anonymous Greeter service.
//!
//! Hosts the Greeter contract: a zero-knowledge membership group whose members
//! can post greetings without revealing which member they are. The HTTP API
//! wraps the contract; `zk-membership` provides the cryptography.

pub mod api;
pub mod contract;
pub mod db;
pub mod errors;
pub mod models;
pub mod state;
