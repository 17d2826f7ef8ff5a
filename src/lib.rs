//! qosping - latency and packet loss per traffic class
//!
//! This library runs one `ping` per ToS marking concurrently, parses the
//! output into typed records and reconstructs exactly which sequence
//! numbers were lost, so that different priority markings can be compared
//! against the same target.

pub mod experiment;
pub mod probe;
