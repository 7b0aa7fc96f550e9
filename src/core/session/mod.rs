// Session module - Device session and its SCPI command catalogue
pub mod commands;
pub mod session;

pub use session::F4tSession;
