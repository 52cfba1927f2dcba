//! Decoding of environmental sensor node telemetry.
//!
//! Two binary surfaces carry the same physical quantities:
//! - live notifications on two GATT characteristics, a fixed 16-byte reading
//!   and a 6-byte particulate triple ([`decoder::live`])
//! - history logs retrieved from the device, a sequence of variable-length
//!   records whose optional blocks are selected by a per-record feature
//!   bitmask ([`decoder::history`])
//!
//! Decoded values keep the device's in-band "Off"/"Heating" codes; the
//! [`sentinel`] module classifies them for display and [`export`] writes
//! history as a CSV table.

pub mod bluetooth;
pub mod config;
pub mod decoder;
pub mod error;
pub mod export;
pub mod models;
pub mod sentinel;
pub mod utils;

pub use decoder::{decode_live_packet, decode_particulate, parse_history};
pub use error::{DecodeError, ExportError};
pub use models::{HistoricalMeasurement, LiveReading, ParticulateTriple};
