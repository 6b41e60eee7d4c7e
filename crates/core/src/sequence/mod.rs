//! Human-readable reference codes.
//!
//! Codes look like `RCP-2026-00042`: a registered prefix, the scope year and a
//! counter zero-padded to five digits. Counters are minted atomically by the
//! database layer; this module only formats, parses and validates.

pub mod code;

#[cfg(test)]
mod code_props;

pub use code::{format_code, next_after, parse_code, validate_prefix, ReferenceCode, SequencePrefix};
