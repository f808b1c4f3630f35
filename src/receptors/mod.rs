//! Stock interaction receptors.

pub mod pickup;
pub mod probe;

pub use pickup::PickupReceptor;
pub use probe::ProbeReceptor;
