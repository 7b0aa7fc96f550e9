// Communication module - Transport abstraction, line framing and pacing
pub mod frame;
pub mod pacing;
pub mod transport;

pub use frame::{Framer, Reply, CHUNK_SIZE, TERMINATOR};
pub use pacing::CommandPacer;
pub use transport::Transport;
