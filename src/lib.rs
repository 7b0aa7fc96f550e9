//! F4TCom Library
//!
//! Client for Watlow F4T temperature/humidity controllers over their
//! line-delimited SCPI TCP port: connection lifecycle, LF framing with
//! timeout-bounded receives, and one method per device capability.
//!
//! ```no_run
//! use f4tcom::{F4tSession, LoopId, SessionConfig};
//!
//! # async fn demo() -> f4tcom::F4tResult<()> {
//! let mut session = F4tSession::connect(&SessionConfig::new("192.168.0.101")).await?;
//! let pv = session.loop_pv(LoopId::TEMPERATURE).await?;
//! println!("Temperature PV: {}", pv);
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use crate::core::communication::{Framer, Reply, Transport};
pub use crate::core::session::F4tSession;
pub use crate::domain::config::{ConnectionConfig, F4tConfig, FramingMode, SessionConfig};
pub use crate::domain::error::{F4tError, F4tResult};
pub use crate::domain::types::{
    CascadeId, CascadeLoop, DeviceIdentity, LoopId, OutputId, ProfileCatalog, ProfileNumber,
    ProgramMode, RampAction, RampKind, RampScale, SignalState, TemperatureUnit, TimeSignal,
};
pub use crate::infrastructure::tcp::TcpConnection;
