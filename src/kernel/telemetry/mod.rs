//! Frame telemetry.
//!
//! # INVARIANT
//! Telemetry is a READ-ONLY side-effect layer. Modules, brains and receptors
//! never read it back; it exists for observability and verification only.

pub mod event;
pub mod metrics;
pub mod recorder;
