//! Data models used throughout the application
//!
//! This module contains the request bodies, response shapes and the uniform
//! response envelope of the gateway, plus helpers for parsing the string
//! encodings callers send us.

// `{success, data|error}` wrapper
pub mod envelope;
// Hex and unit parsing/formatting
pub mod parsing;
// Request bodies
pub mod requests;
// Response payloads
pub mod responses;
