//! Backend-facing traits.
//!
//! - [`Driver`]: the capability set the adapter layer calls into
//! - [`ObjectClient`] / [`Connector`]: the vendor seam under object-store drivers

mod client;
mod driver;

pub use client::{Connector, ObjectClient};
pub use driver::Driver;
