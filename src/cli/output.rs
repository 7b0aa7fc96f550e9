use crate::cli::args::OutputFormat;
use crate::domain::config::{ControllerConfig, F4tConfig};
use crate::domain::types::{DeviceIdentity, ProfileCatalog, TimeSignal};
use std::io;
use tabled::{Table, Tabled};

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_reading(&self, label: &str, value: &str) -> Result<(), OutputError>;
    fn write_identity(&self, raw: &str) -> Result<(), OutputError>;
    fn write_profiles(&self, profiles: &ProfileCatalog) -> Result<(), OutputError>;
    fn write_time_signal(&self, signal: &TimeSignal) -> Result<(), OutputError>;
    fn write_config(&self, config: &F4tConfig) -> Result<(), OutputError>;
    fn write_controllers(&self, controllers: &[ControllerConfig]) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::F4tError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_reading(&self, label: &str, value: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({ label: value });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("{}", Table::new(vec![ReadingRow::new(label, value)]));
            }
            OutputFormat::Text => println!("{}: {}", label, value),
        }
        Ok(())
    }

    fn write_identity(&self, raw: &str) -> Result<(), OutputError> {
        let identity = DeviceIdentity::parse(raw);
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&identity)?);
            }
            OutputFormat::Table => {
                println!("{}", Table::new(vec![IdentityRow::from(&identity)]));
            }
            OutputFormat::Text => {
                println!("Manufacturer: {}", identity.manufacturer);
                println!("Part number:  {}", identity.model);
                println!("Serial:       {}", identity.serial);
                println!("Firmware:     {}", identity.firmware);
            }
        }
        Ok(())
    }

    fn write_profiles(&self, profiles: &ProfileCatalog) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(profiles.as_map())?);
            }
            OutputFormat::Table => {
                if !profiles.is_empty() {
                    let rows: Vec<ProfileRow> = profiles
                        .iter()
                        .map(|(slot, name)| ProfileRow {
                            slot,
                            name: name.to_string(),
                        })
                        .collect();
                    println!("{}", Table::new(rows));
                }
            }
            OutputFormat::Text => {
                if profiles.is_empty() {
                    println!("No profiles found");
                }
                for (slot, name) in profiles.iter() {
                    println!("{:>2}: {}", slot, name);
                }
            }
        }
        Ok(())
    }

    fn write_time_signal(&self, signal: &TimeSignal) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(signal)?);
            }
            OutputFormat::Table => {
                println!("{}", Table::new(vec![TimeSignalRow::from(signal)]));
            }
            OutputFormat::Text => {
                let name = signal.name.as_deref().unwrap_or("(unnamed)");
                println!("Time Signal #{} {}: {}", signal.id, name, signal.state);
            }
        }
        Ok(())
    }

    fn write_config(&self, config: &F4tConfig) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(config)?);
            }
            OutputFormat::Table => {
                self.write_controllers(&config.controllers)?;
            }
            OutputFormat::Text => {
                println!("F4TCom Configuration:");
                println!("  Log level: {}", config.global.log_level);
                println!("  Timeout: {}ms", config.global.timeout_ms);
                println!("  Settle delay: {}ms", config.global.settle_delay_ms);
                println!("  Strict framing: {}", config.global.strict_framing);
                println!("  Identify on connect: {}", config.global.identify_on_connect);

                if !config.controllers.is_empty() {
                    println!("  Controllers:");
                    for controller in &config.controllers {
                        println!("    {}: {}:{}", controller.name, controller.host, controller.port);
                    }
                }
            }
        }
        Ok(())
    }

    fn write_controllers(&self, controllers: &[ControllerConfig]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(controllers)?);
            }
            OutputFormat::Table => {
                if !controllers.is_empty() {
                    let rows: Vec<ControllerRow> = controllers.iter().map(ControllerRow::from).collect();
                    println!("{}", Table::new(rows));
                }
            }
            OutputFormat::Text => {
                for controller in controllers {
                    println!("Controller: {}", controller.name);
                    let desc = if controller.description.is_empty() {
                        "No description"
                    } else {
                        &controller.description
                    };
                    println!("  Description: {}", desc);
                    println!("  Address: {}:{}", controller.host, controller.port);
                    println!();
                }
            }
        }
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "message": message,
                    "level": "info"
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                println!("{}", message);
            }
        }
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "error": error,
                    "level": "error"
                });
                eprintln!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                eprintln!("Error: {}", error);
            }
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct ReadingRow {
    reading: String,
    value: String,
}

impl ReadingRow {
    fn new(label: &str, value: &str) -> Self {
        Self {
            reading: label.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Tabled)]
struct IdentityRow {
    manufacturer: String,
    part: String,
    serial: String,
    firmware: String,
}

impl From<&DeviceIdentity> for IdentityRow {
    fn from(identity: &DeviceIdentity) -> Self {
        Self {
            manufacturer: identity.manufacturer.clone(),
            part: identity.model.clone(),
            serial: identity.serial.clone(),
            firmware: identity.firmware.clone(),
        }
    }
}

#[derive(Tabled)]
struct ProfileRow {
    slot: u8,
    name: String,
}

#[derive(Tabled)]
struct TimeSignalRow {
    output: u8,
    name: String,
    state: String,
}

impl From<&TimeSignal> for TimeSignalRow {
    fn from(signal: &TimeSignal) -> Self {
        Self {
            output: signal.id,
            name: signal.name.clone().unwrap_or_default(),
            state: signal.state.to_string(),
        }
    }
}

#[derive(Tabled)]
struct ControllerRow {
    name: String,
    host: String,
    port: u16,
    description: String,
}

impl From<&ControllerConfig> for ControllerRow {
    fn from(controller: &ControllerConfig) -> Self {
        Self {
            name: controller.name.clone(),
            host: controller.host.clone(),
            port: controller.port,
            description: controller.description.clone(),
        }
    }
}
