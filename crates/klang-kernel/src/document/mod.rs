//! Path-based document manipulation over JSON and YAML payloads.
//!
//! All path operations normalize through a JSON intermediate
//! (`serde_json::Value`); the engine preserves the wire format of the input
//! on output (JSON stays JSON, YAML stays YAML, multi-doc streams stay
//! streams) and guarantees semantic rather than byte-exact equality.

pub mod engine;
pub mod path;
