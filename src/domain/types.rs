//! Typed values exchanged with the controller.
//!
//! Every closed set of SCPI tokens is an enum validated at the API boundary,
//! so out-of-set values are rejected before any wire traffic is produced.

use crate::domain::error::{F4tError, F4tResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Highest control loop index the controller exposes.
pub const MAX_LOOP: u8 = 4;
/// Highest profile slot the controller stores.
pub const MAX_PROFILE: u8 = 40;

/// Control loop identity (1..=4). Loop 1 is conventionally temperature,
/// loop 2 humidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct LoopId(u8);

impl LoopId {
    pub const TEMPERATURE: LoopId = LoopId(1);
    pub const HUMIDITY: LoopId = LoopId(2);

    pub fn new(id: u8) -> F4tResult<Self> {
        if (1..=MAX_LOOP).contains(&id) {
            Ok(Self(id))
        } else {
            Err(F4tError::InvalidInput(format!(
                "loop {} out of range 1..={}",
                id, MAX_LOOP
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cascade loop index (>= 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct CascadeId(u8);

impl CascadeId {
    pub fn new(id: u8) -> F4tResult<Self> {
        if id == 0 {
            return Err(F4tError::InvalidInput("cascade index starts at 1".to_string()));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for CascadeId {
    fn default() -> Self {
        Self(1)
    }
}

/// Time signal (digital output) index (>= 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct OutputId(u8);

impl OutputId {
    pub fn new(id: u8) -> F4tResult<Self> {
        if id == 0 {
            return Err(F4tError::InvalidInput("output index starts at 1".to_string()));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Profile slot number. Slots 1..=40 hold stored programs; slot 0 addresses
/// the currently selected program and is only reachable through
/// [`ProfileNumber::SELECTED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct ProfileNumber(u8);

impl ProfileNumber {
    pub const SELECTED: ProfileNumber = ProfileNumber(0);

    pub fn new(slot: u8) -> F4tResult<Self> {
        if (1..=MAX_PROFILE).contains(&slot) {
            Ok(Self(slot))
        } else {
            Err(F4tError::InvalidInput(format!(
                "profile {} out of range 1..={}",
                slot, MAX_PROFILE
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Deserialization goes through `new`, so serde input obeys the same ranges.
macro_rules! checked_from_u8 {
    ($($name:ident),+) => {
        $(
            impl TryFrom<u8> for $name {
                type Error = F4tError;

                fn try_from(value: u8) -> Result<Self, Self::Error> {
                    Self::new(value)
                }
            }
        )+
    };
}

checked_from_u8!(LoopId, CascadeId, OutputId, ProfileNumber);

/// Generates the `as_scpi` / `Display` / `FromStr` trio for a closed token set.
macro_rules! scpi_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $token:literal $(| $alias:literal)*),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Wire token for this value.
            pub fn as_scpi(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_scpi())
            }
        }

        impl FromStr for $name {
            type Err = F4tError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let upper = s.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $($token $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(F4tError::InvalidInput(format!(
                        "'{}' is not a valid {}",
                        s,
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

scpi_enum! {
    /// Temperature display unit.
    TemperatureUnit { Celsius => "C" | "CELSIUS", Fahrenheit => "F" | "FAHRENHEIT" }
}

scpi_enum! {
    /// Time base for ramp rates.
    RampScale { Hours => "HOURS" | "H", Minutes => "MINUTES" | "M" }
}

scpi_enum! {
    /// Program execution command.
    ProgramMode { Start => "START", Stop => "STOP", Pause => "PAUSE", Resume => "RESUME" }
}

scpi_enum! {
    /// When a loop ramps instead of stepping to its set point.
    RampAction { Off => "OFF", Startup => "STARTUP", Setpoint => "SETPOINT", Both => "BOTH" }
}

scpi_enum! {
    /// Time signal output state.
    SignalState { On => "ON", Off => "OFF" }
}

scpi_enum! {
    /// Ramp parameter selector.
    RampKind { Rate => "RRATE" | "RATE", Time => "RTIME" | "TIME" }
}

scpi_enum! {
    /// Cascade sub-loop selector.
    CascadeLoop { Outer => "OUTER", Inner => "INNER" }
}

impl SignalState {
    pub fn toggled(self) -> Self {
        match self {
            SignalState::On => SignalState::Off,
            SignalState::Off => SignalState::On,
        }
    }
}

/// A named digital output and its last read state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignal {
    pub id: u8,
    pub state: SignalState,
    pub name: Option<String>,
}

/// Fields of the `*IDN?` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
    pub firmware: String,
}

impl DeviceIdentity {
    /// Split a comma-separated identity line. Missing fields stay empty.
    pub fn parse(line: &str) -> Self {
        let mut fields = line.split(',').map(|f| f.trim().to_string());
        Self {
            manufacturer: fields.next().unwrap_or_default(),
            model: fields.next().unwrap_or_default(),
            serial: fields.next().unwrap_or_default(),
            firmware: fields.next().unwrap_or_default(),
        }
    }
}

/// Profiles found by sequential probing, keyed by slot.
///
/// Probing stops at the first empty name, so any profile stored after a gap
/// is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCatalog {
    profiles: BTreeMap<u8, String>,
}

impl ProfileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: ProfileNumber, name: String) {
        self.profiles.insert(slot.get(), name);
    }

    pub fn get(&self, slot: u8) -> Option<&str> {
        self.profiles.get(&slot).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn clear(&mut self) {
        self.profiles.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.profiles.iter().map(|(slot, name)| (*slot, name.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<u8, String> {
        &self.profiles
    }
}
