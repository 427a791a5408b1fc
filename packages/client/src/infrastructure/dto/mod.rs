//! Data transfer objects for the broker wire format.

pub mod wire;
