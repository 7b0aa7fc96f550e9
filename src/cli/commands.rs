use crate::cli::args::{
    Args, CascadeValue, Command, ConfigCommand, RampCommand, TsCommand, UnitsCommand,
};
use crate::cli::output::{ConsoleWriter, OutputWriter};
use crate::core::communication::Transport;
use crate::core::session::F4tSession;
use crate::domain::config::{ConnectionConfig, F4tConfig, SessionConfig};
use crate::domain::error::{F4tError, F4tResult};
use crate::domain::types::{
    CascadeId, CascadeLoop, LoopId, OutputId, ProfileNumber, ProgramMode, RampKind,
};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Execute CLI command
pub async fn execute_command(args: Args) -> F4tResult<()> {
    let writer = ConsoleWriter::new(args.output);

    let config_manager = ConfigManager::new()?;
    let config = if let Some(config_path) = &args.config {
        config_manager.load_config_from_path(config_path.as_ref())?
    } else {
        config_manager.load_config()?
    };

    if !args.quiet {
        init_logging(&config.global.log_level, args.verbose)?;
    }

    match &args.command {
        Command::Config(config_args) => {
            return execute_config_command(&config_args.command, &writer, &config, &config_manager);
        }
        Command::Version => {
            writer.write_message(&format!("f4tcom {}", env!("CARGO_PKG_VERSION")))?;
            return Ok(());
        }
        _ => {}
    }

    // Identity is only fetched for `id` itself
    let session_config = resolve_session_config(&args, &config)?.with_identify_on_connect(false);
    let mut session = F4tSession::connect(&session_config).await?;
    let result = execute_device_command(args.command, &mut session, &writer).await;
    finish_session(&mut session, result).await
}

/// Close the session and hand back the command's own result.
///
/// A failed close is logged, never allowed to replace the command error.
/// A session whose socket is already gone is left to `Drop`.
async fn finish_session<T: Transport>(
    session: &mut F4tSession<T>,
    result: F4tResult<()>,
) -> F4tResult<()> {
    match &result {
        Err(e) if e.is_transport_failure() => {
            debug!("Skipping close, connection lost: {}", e);
        }
        _ => {
            if let Err(e) = session.close().await {
                warn!("Failed to close connection: {}", e);
            }
        }
    }
    result
}

/// Combine command line overrides with the configuration file
pub fn resolve_session_config(args: &Args, config: &F4tConfig) -> F4tResult<SessionConfig> {
    let mut session_config = if let Some(host) = args.host {
        let connection = ConnectionConfig::new(host.to_string())
            .with_timeout(Duration::from_millis(config.global.timeout_ms));
        SessionConfig::from_connection(connection).apply_global(&config.global)
    } else if let Some(name) = &args.controller {
        let controller = config.find_controller(name).ok_or_else(|| F4tError::Config {
            message: format!("Controller '{}' not found in configuration", name),
        })?;
        SessionConfig::from_controller(controller, &config.global)
    } else if let [only] = config.controllers.as_slice() {
        SessionConfig::from_controller(only, &config.global)
    } else {
        return Err(F4tError::InvalidInput(
            "no controller given; pass --host or --controller".to_string(),
        ));
    };

    if let Some(port) = args.port {
        session_config.connection.port = port;
    }
    if let Some(timeout) = args.timeout {
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(F4tError::InvalidInput(format!("invalid timeout {}", timeout)));
        }
        session_config.connection.timeout = Duration::from_secs_f64(timeout);
    }
    Ok(session_config)
}

async fn execute_device_command(
    command: Command,
    session: &mut F4tSession,
    writer: &ConsoleWriter,
) -> F4tResult<()> {
    match command {
        Command::Id => {
            let identity = session.identify().await?;
            writer.write_identity(&identity)?;
        }
        Command::Pv(target) => {
            let loop_id = LoopId::new(target.loop_id)?;
            let pv = session.loop_pv(loop_id).await?;
            writer.write_reading(&format!("Loop {} PV", loop_id), &pv)?;
        }
        Command::Sp(target) => {
            let loop_id = LoopId::new(target.loop_id)?;
            let sp = session.loop_sp(loop_id).await?;
            writer.write_reading(&format!("Loop {} SP", loop_id), &sp)?;
        }
        Command::SetSp { target, value } => {
            let loop_id = LoopId::new(target.loop_id)?;
            session.write_loop_sp(loop_id, value).await?;
            session.settle().await;
            let sp = session.loop_sp(loop_id).await?;
            let pv = session.loop_pv(loop_id).await?;
            writer.write_reading(&format!("Loop {} SP", loop_id), &sp)?;
            writer.write_reading(&format!("Loop {} PV", loop_id), &pv)?;
        }
        Command::Cascade { value, cascade } => {
            let cascade = CascadeId::new(cascade)?;
            let (label, reading) = match value {
                CascadeValue::Sp => ("SP", session.cascade_sp(cascade).await?),
                CascadeValue::OuterPv => ("outer PV", session.cascade_loop_pv(cascade, CascadeLoop::Outer).await?),
                CascadeValue::OuterSp => ("outer SP", session.cascade_loop_sp(cascade, CascadeLoop::Outer).await?),
                CascadeValue::InnerPv => ("inner PV", session.cascade_loop_pv(cascade, CascadeLoop::Inner).await?),
                CascadeValue::InnerSp => ("inner SP", session.cascade_loop_sp(cascade, CascadeLoop::Inner).await?),
            };
            writer.write_reading(&format!("Cascade {} {}", cascade.get(), label), &reading)?;
        }
        Command::Profiles => {
            let profiles = session.refresh_profiles().await?;
            writer.write_profiles(profiles)?;
        }
        Command::Run { profile } => {
            let profile = ProfileNumber::new(profile)?;
            let name = session.run_profile(profile).await?;
            writer.write_message(&format!("Started profile {} ({})", profile.get(), name))?;
        }
        Command::Program { mode } => {
            let mode = ProgramMode::from(mode);
            let name = session.control_selected_program(mode).await?;
            writer.write_message(&format!("Sent {} to program '{}'", mode, name))?;
        }
        Command::Ramp(ramp_args) => {
            let loop_id = LoopId::new(ramp_args.target.loop_id)?;
            match ramp_args.command {
                RampCommand::Get { kind } => {
                    let kind = RampKind::from(kind);
                    let value = session.ramp(loop_id, kind).await?;
                    let label = match kind {
                        RampKind::Rate => "ramp rate",
                        RampKind::Time => "ramp time",
                    };
                    writer.write_reading(&format!("Loop {} {}", loop_id, label), &value)?;
                }
                RampCommand::SetRate { rate } => {
                    session.set_ramp_rate(loop_id, rate).await?;
                    writer.write_message("Done.")?;
                }
                RampCommand::SetTime { minutes } => {
                    session.set_ramp_time(loop_id, minutes).await?;
                    writer.write_message("Done.")?;
                }
                RampCommand::Scale { scale } => {
                    session.set_ramp_scale(loop_id, scale.into()).await?;
                    writer.write_message("Done.")?;
                }
                RampCommand::Action { action } => {
                    session.set_ramp_action(loop_id, action.into()).await?;
                    writer.write_message("Done.")?;
                }
            }
        }
        Command::Ts(ts_args) => match ts_args.command {
            TsCommand::Read { output } => {
                let output = OutputId::new(output)?;
                let state = session.time_signal_state(output).await?;
                writer.write_reading(&format!("Time Signal #{}", output.get()), &state)?;
            }
            TsCommand::Toggle { output } => {
                let output = OutputId::new(output)?;
                let state = session.toggle_time_signal(output).await?;
                writer.write_reading(&format!("Time Signal #{}", output.get()), state.as_scpi())?;
            }
            TsCommand::Name { output } => {
                let output = OutputId::new(output)?;
                let name = session.time_signal_name(output).await?;
                writer.write_reading(&format!("Name of Time Signal {}", output.get()), &name)?;
            }
            TsCommand::Show { output } => {
                let signal = session.time_signal(OutputId::new(output)?).await?;
                writer.write_time_signal(&signal)?;
            }
        },
        Command::Units(units_args) => match units_args.command {
            UnitsCommand::Get => {
                let unit = session.temperature_unit().await?;
                writer.write_reading("Temperature unit", unit.as_scpi())?;
            }
            UnitsCommand::Set { unit } => {
                session.set_temperature_unit(unit.into()).await?;
                writer.write_message("Done.")?;
            }
        },
        Command::Monitor { target, interval_ms } => {
            let loop_id = LoopId::new(target.loop_id)?;
            monitor_pv(session, writer, loop_id, Duration::from_millis(interval_ms)).await?;
        }
        Command::Config(_) | Command::Version => {}
    }
    Ok(())
}

async fn monitor_pv(
    session: &mut F4tSession,
    writer: &ConsoleWriter,
    loop_id: LoopId,
    interval: Duration,
) -> F4tResult<()> {
    info!("Monitoring loop {} PV every {:?}", loop_id, interval);
    let mut ticker = tokio::time::interval(interval);
    let label = format!("Loop {} PV", loop_id);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let pv = session.loop_pv(loop_id).await?;
                writer.write_reading(&label, &pv)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Monitoring stopped");
                return Ok(());
            }
        }
    }
}

fn execute_config_command(
    command: &ConfigCommand,
    writer: &ConsoleWriter,
    config: &F4tConfig,
    config_manager: &ConfigManager,
) -> F4tResult<()> {
    match command {
        ConfigCommand::Show => {
            writer.write_config(config)?;
        }
        ConfigCommand::Validate { file } => {
            let result = match file {
                Some(path) => config_manager.load_config_from_path(path.as_ref()),
                None => config_manager.load_config(),
            };
            match result {
                Ok(_) => writer.write_message("Configuration is valid")?,
                Err(e) => writer.write_error(&format!("Configuration validation failed: {}", e))?,
            }
        }
        ConfigCommand::Init { dir, global } => {
            if *global {
                let global_path = config_manager.get_global_config_path_ref();
                config_manager.save_config_to_path(global_path, &F4tConfig::default())?;
                writer.write_message(&format!(
                    "Global configuration initialized at '{}'",
                    global_path.display()
                ))?;
            } else {
                let base = match dir {
                    Some(dir) => dir.into(),
                    None => std::env::current_dir().map_err(|e| F4tError::Config {
                        message: format!("Failed to get current directory: {}", e),
                    })?,
                };
                let path = config_manager.init_project_config(&base)?;
                writer.write_message(&format!(
                    "Project configuration initialized at '{}'",
                    path.display()
                ))?;
            }
        }
        ConfigCommand::Controllers => {
            writer.write_controllers(&config.controllers)?;
        }
    }
    Ok(())
}
