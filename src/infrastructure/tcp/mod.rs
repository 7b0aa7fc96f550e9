// TCP module - Socket transport to the controller
pub mod client;

pub use client::TcpConnection;
