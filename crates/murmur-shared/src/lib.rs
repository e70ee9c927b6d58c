//! # Murmur Shared
//!
//! Wire types shared by the API server and its clients: request bodies, query
//! strings, small response envelopes and RFC 7807 problem details.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
