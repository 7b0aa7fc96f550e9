use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Command line arguments for F4TCom
#[derive(Parser, Debug)]
#[command(
    name = "f4tcom",
    version = env!("CARGO_PKG_VERSION"),
    about = "SCPI client for Watlow F4T temperature/humidity controllers",
    long_about = "Reads and controls loops, profiles, ramps, time signals and units of a Watlow F4T controller over its SCPI TCP port."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Controller IPv4 address
    #[arg(long, global = true, conflicts_with = "controller")]
    pub host: Option<Ipv4Addr>,

    /// Controller name from the configuration file
    #[arg(long, global = true)]
    pub controller: Option<String>,

    /// SCPI port
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Receive timeout in seconds
    #[arg(short, long, global = true)]
    pub timeout: Option<f64>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read manufacturer, part number, serial number and firmware
    Id,
    /// Read a loop process value
    Pv(LoopArg),
    /// Read a loop set point
    Sp(LoopArg),
    /// Write a loop set point, then read back SP and PV
    SetSp {
        #[command(flatten)]
        target: LoopArg,
        /// New set point
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Read cascade loop values
    Cascade {
        /// Value to read
        #[arg(value_enum)]
        value: CascadeValue,
        /// Cascade index
        #[arg(long, default_value = "1")]
        cascade: u8,
    },
    /// List stored profiles (stops at the first empty slot)
    Profiles,
    /// Select a profile and start it
    Run {
        /// Profile number (1-40)
        profile: u8,
    },
    /// Change the state of the selected program
    Program {
        #[arg(value_enum)]
        mode: ProgramModeArg,
    },
    /// Ramp configuration
    Ramp(RampArgs),
    /// Time signal (event output) control
    Ts(TsArgs),
    /// Temperature unit
    Units(UnitsArgs),
    /// Print a loop PV at a fixed interval until Ctrl+C
    Monitor {
        #[command(flatten)]
        target: LoopArg,
        /// Poll interval in milliseconds
        #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: u64,
    },
    /// Configuration management commands
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Loop selection
#[derive(ClapArgs, Debug, Clone)]
pub struct LoopArg {
    /// Control loop (1=temperature, 2=humidity, max 4)
    #[arg(short, long = "loop", default_value = "1")]
    pub loop_id: u8,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
    /// Table output
    Table,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum CascadeValue {
    Sp,
    OuterPv,
    OuterSp,
    InnerPv,
    InnerSp,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ProgramModeArg {
    Start,
    Stop,
    Pause,
    Resume,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum RampKindArg {
    Rate,
    Time,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum RampScaleArg {
    Hours,
    Minutes,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum RampActionArg {
    Off,
    Startup,
    Setpoint,
    Both,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum UnitArg {
    C,
    F,
}

/// Ramp arguments
#[derive(ClapArgs, Debug)]
pub struct RampArgs {
    #[command(flatten)]
    pub target: LoopArg,

    #[command(subcommand)]
    pub command: RampCommand,
}

#[derive(Subcommand, Debug)]
pub enum RampCommand {
    /// Read ramp rate or ramp time
    Get {
        #[arg(value_enum)]
        kind: RampKindArg,
    },
    /// Set ramp rate
    SetRate { rate: f64 },
    /// Set ramp time in minutes
    SetTime { minutes: u32 },
    /// Set the time base of the ramp rate
    Scale {
        #[arg(value_enum)]
        scale: RampScaleArg,
    },
    /// Set when the loop ramps (off = instant change)
    Action {
        #[arg(value_enum)]
        action: RampActionArg,
    },
}

/// Time signal arguments
#[derive(ClapArgs, Debug)]
pub struct TsArgs {
    #[command(subcommand)]
    pub command: TsCommand,
}

#[derive(Subcommand, Debug)]
pub enum TsCommand {
    /// Read the ON/OFF state
    Read {
        #[arg(id = "output_id", value_name = "OUTPUT")]
        output: u8,
    },
    /// Switch ON to OFF and OFF to ON
    Toggle {
        #[arg(id = "output_id", value_name = "OUTPUT")]
        output: u8,
    },
    /// Read the assigned name
    Name {
        #[arg(id = "output_id", value_name = "OUTPUT")]
        output: u8,
    },
    /// Read state and name
    Show {
        #[arg(id = "output_id", value_name = "OUTPUT")]
        output: u8,
    },
}

/// Unit arguments
#[derive(ClapArgs, Debug)]
pub struct UnitsArgs {
    #[command(subcommand)]
    pub command: UnitsCommand,
}

#[derive(Subcommand, Debug)]
pub enum UnitsCommand {
    /// Read the temperature unit
    Get,
    /// Set the temperature unit
    Set {
        #[arg(value_enum)]
        unit: UnitArg,
    },
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate configuration
    Validate {
        /// Configuration file path
        file: Option<String>,
    },
    /// Create default configuration
    Init {
        /// Project directory
        #[arg(short = 'd', long)]
        dir: Option<String>,
        /// Global configuration
        #[arg(short, long)]
        global: bool,
    },
    /// List configured controllers
    Controllers,
}

impl From<ProgramModeArg> for crate::domain::types::ProgramMode {
    fn from(mode: ProgramModeArg) -> Self {
        match mode {
            ProgramModeArg::Start => Self::Start,
            ProgramModeArg::Stop => Self::Stop,
            ProgramModeArg::Pause => Self::Pause,
            ProgramModeArg::Resume => Self::Resume,
        }
    }
}

impl From<RampKindArg> for crate::domain::types::RampKind {
    fn from(kind: RampKindArg) -> Self {
        match kind {
            RampKindArg::Rate => Self::Rate,
            RampKindArg::Time => Self::Time,
        }
    }
}

impl From<RampScaleArg> for crate::domain::types::RampScale {
    fn from(scale: RampScaleArg) -> Self {
        match scale {
            RampScaleArg::Hours => Self::Hours,
            RampScaleArg::Minutes => Self::Minutes,
        }
    }
}

impl From<RampActionArg> for crate::domain::types::RampAction {
    fn from(action: RampActionArg) -> Self {
        match action {
            RampActionArg::Off => Self::Off,
            RampActionArg::Startup => Self::Startup,
            RampActionArg::Setpoint => Self::Setpoint,
            RampActionArg::Both => Self::Both,
        }
    }
}

impl From<UnitArg> for crate::domain::types::TemperatureUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::C => Self::Celsius,
            UnitArg::F => Self::Fahrenheit,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_sp_with_negative_value() {
        let args = Args::try_parse_from([
            "f4tcom", "--host", "192.168.0.101", "set-sp", "--loop", "1", "-20.5",
        ])
        .unwrap();
        assert_eq!(args.host, Some(Ipv4Addr::new(192, 168, 0, 101)));
        match args.command {
            Command::SetSp { target, value } => {
                assert_eq!(target.loop_id, 1);
                assert_eq!(value, -20.5);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_host_must_be_dotted_quad() {
        assert!(Args::try_parse_from(["f4tcom", "--host", "chamber.local", "id"]).is_err());
        assert!(Args::try_parse_from(["f4tcom", "--host", "300.1.1.1", "id"]).is_err());
    }

    #[test]
    fn test_host_conflicts_with_controller() {
        let result = Args::try_parse_from([
            "f4tcom", "--host", "10.0.0.1", "--controller", "chamber1", "id",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_monitor_interval_must_be_positive() {
        assert!(Args::try_parse_from(["f4tcom", "monitor", "--interval-ms", "0"]).is_err());

        let args = Args::try_parse_from(["f4tcom", "monitor", "--loop", "2"]).unwrap();
        match args.command {
            Command::Monitor { target, interval_ms } => {
                assert_eq!(target.loop_id, 2);
                assert_eq!(interval_ms, 1000);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_ramp_and_ts() {
        let args = Args::try_parse_from(["f4tcom", "ramp", "--loop", "2", "scale", "hours"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Ramp(RampArgs { command: RampCommand::Scale { scale: RampScaleArg::Hours }, .. })
        ));

        let args = Args::try_parse_from(["f4tcom", "ts", "toggle", "3"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Ts(TsArgs { command: TsCommand::Toggle { output: 3 } })
        ));
    }
}
