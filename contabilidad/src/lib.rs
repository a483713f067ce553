mod client;
mod dto;
mod ports;
pub mod breakdown;
pub mod dates;
pub mod dev_backend;
pub mod domain;
pub mod edit;
pub mod format;
pub mod pending;

pub use client::*;
pub use domain::*;
pub use ports::*;
