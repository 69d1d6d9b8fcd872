pub mod error;
pub mod paypal;
pub mod service;
