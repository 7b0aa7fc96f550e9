// Core module - Framing and device session
pub mod communication;
pub mod session;
