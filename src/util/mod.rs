pub mod config;
pub mod constants;
pub mod deserialization;
pub mod error;
pub mod sph_shabal;
