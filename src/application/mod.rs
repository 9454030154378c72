// Application layer: voucher use cases over an injected store.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
