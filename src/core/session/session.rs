use crate::core::communication::{CommandPacer, Framer, Reply, Transport};
use crate::core::session::commands;
use crate::domain::{
    config::{FramingMode, SessionConfig},
    error::{F4tError, F4tResult},
    types::{
        CascadeId, CascadeLoop, LoopId, OutputId, ProfileCatalog, ProfileNumber, ProgramMode,
        RampAction, RampKind, RampScale, SignalState, TemperatureUnit, TimeSignal, MAX_PROFILE,
    },
};
use crate::infrastructure::tcp::client::TcpConnection;
use tracing::{debug, info, warn};

/// A session with one F4T controller.
///
/// Owns its connection exclusively. Every transaction borrows the session
/// mutably, so a request and its reply can never interleave with another
/// transaction. Numeric replies are returned as the device's text; parsing
/// them is left to the caller.
pub struct F4tSession<T = TcpConnection> {
    framer: Framer<T>,
    pacer: CommandPacer,
    framing: FramingMode,
    identity: Option<String>,
    temperature_unit: Option<TemperatureUnit>,
    profiles: ProfileCatalog,
    last_program_mode: Option<ProgramMode>,
}

impl F4tSession<TcpConnection> {
    /// Open the socket and, if configured, read the device identity.
    ///
    /// If the identity query fails the connection is dropped with the
    /// partially built session, releasing the socket.
    pub async fn connect(config: &SessionConfig) -> F4tResult<Self> {
        let connection = TcpConnection::open(&config.connection).await?;
        let mut session = Self::with_transport(connection, config);

        if config.identify_on_connect {
            let identity = session.identify().await?;
            info!("Connected to {}", identity);
        }
        Ok(session)
    }
}

impl<T: Transport> F4tSession<T> {
    pub fn with_transport(transport: T, config: &SessionConfig) -> Self {
        Self {
            framer: Framer::new(transport),
            pacer: CommandPacer::new(config.settle_delay),
            framing: config.framing,
            identity: None,
            temperature_unit: None,
            profiles: ProfileCatalog::new(),
            last_program_mode: None,
        }
    }

    /// Identity string from the last `*IDN?`
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Profiles found by the last [`F4tSession::refresh_profiles`]
    pub fn profiles(&self) -> &ProfileCatalog {
        &self.profiles
    }

    pub fn cached_temperature_unit(&self) -> Option<TemperatureUnit> {
        self.temperature_unit
    }

    /// Last program command sent. The device may have rejected it.
    pub fn last_program_mode(&self) -> Option<ProgramMode> {
        self.last_program_mode
    }

    pub fn is_open(&self) -> bool {
        self.framer.transport().is_open()
    }

    pub fn transport(&self) -> &T {
        self.framer.transport()
    }

    pub async fn close(&mut self) -> F4tResult<()> {
        self.framer.close().await
    }

    /// Wait out the settling time of the last state-changing command
    pub async fn settle(&mut self) {
        self.pacer.settle().await;
    }

    /// Discard bytes left over from an abandoned transaction
    pub async fn drain(&mut self) -> F4tResult<usize> {
        self.framer.drain().await
    }

    fn accept(&self, command: &str, reply: Reply) -> F4tResult<String> {
        if reply.complete || self.framing == FramingMode::Lenient {
            return Ok(reply.text);
        }
        debug!("Strict framing rejected partial reply to {:?}", command);
        Err(F4tError::Timeout {
            partial: reply.text,
        })
    }

    async fn send(&mut self, command: &str) -> F4tResult<()> {
        self.framer.send_command(command).await
    }

    async fn query(&mut self, command: &str) -> F4tResult<String> {
        let reply = self.framer.query(command).await?;
        self.accept(command, reply)
    }

    /// Send a query, give the device its settling time, then read.
    async fn settled_query(&mut self, command: &str) -> F4tResult<String> {
        self.send(command).await?;
        self.pacer.pause().await;
        let reply = self.framer.read_response().await?;
        self.accept(command, reply)
    }

    /// `*IDN?`: manufacturer, part number, serial number, firmware.
    pub async fn identify(&mut self) -> F4tResult<String> {
        self.drain().await?;
        self.pacer.pause().await;
        let identity = self.query(commands::IDENTIFY).await?;
        self.identity = Some(identity.clone());
        Ok(identity)
    }

    pub async fn loop_pv(&mut self, loop_id: LoopId) -> F4tResult<String> {
        self.drain().await?;
        self.query(&commands::loop_pv(loop_id)).await
    }

    pub async fn loop_sp(&mut self, loop_id: LoopId) -> F4tResult<String> {
        self.query(&commands::loop_sp(loop_id)).await
    }

    pub async fn write_loop_sp(&mut self, loop_id: LoopId, value: f64) -> F4tResult<()> {
        if !value.is_finite() {
            return Err(F4tError::InvalidInput(format!(
                "set point {} is not a finite number",
                value
            )));
        }
        self.send(&commands::write_loop_sp(loop_id, value)).await?;
        self.pacer.mark();
        Ok(())
    }

    pub async fn cascade_sp(&mut self, cascade: CascadeId) -> F4tResult<String> {
        self.query(&commands::cascade_sp(cascade)).await
    }

    pub async fn cascade_loop_pv(
        &mut self,
        cascade: CascadeId,
        sub_loop: CascadeLoop,
    ) -> F4tResult<String> {
        self.query(&commands::cascade_loop_pv(cascade, sub_loop)).await
    }

    pub async fn cascade_loop_sp(
        &mut self,
        cascade: CascadeId,
        sub_loop: CascadeLoop,
    ) -> F4tResult<String> {
        self.query(&commands::cascade_loop_sp(cascade, sub_loop)).await
    }

    pub async fn select_profile(&mut self, profile: ProfileNumber) -> F4tResult<()> {
        self.send(&commands::select_profile(profile)).await
    }

    /// Name of the selected profile, without the quotes the device adds
    pub async fn profile_name(&mut self) -> F4tResult<String> {
        let name = self.query(commands::PROGRAM_NAME).await?;
        Ok(clean_profile_name(&name))
    }

    /// Probe slots 1..=40 in order and rebuild the profile catalog.
    ///
    /// Stops at the first slot with an empty name; later slots are never
    /// probed.
    pub async fn refresh_profiles(&mut self) -> F4tResult<&ProfileCatalog> {
        self.profiles.clear();

        for slot in 1..=MAX_PROFILE {
            let profile = ProfileNumber::new(slot)?;
            self.select_profile(profile).await?;
            self.pacer.pause().await;
            let name = clean_profile_name(&self.settled_query(commands::PROGRAM_NAME).await?);

            if name.is_empty() {
                debug!("Profile slot {} is empty, stopping probe", slot);
                break;
            }
            debug!("Profile slot {}: {}", slot, name);
            self.profiles.insert(profile, name);
        }

        info!("Found {} profiles", self.profiles.len());
        Ok(&self.profiles)
    }

    /// Send a program state command to the selected program.
    ///
    /// Transitions are not checked locally; the device silently ignores
    /// illegal ones.
    pub async fn program_mode(&mut self, mode: ProgramMode) -> F4tResult<()> {
        self.send(&commands::program_state(mode)).await?;
        self.last_program_mode = Some(mode);
        self.pacer.mark();
        Ok(())
    }

    /// Select `profile` and start it. Returns the profile name.
    pub async fn run_profile(&mut self, profile: ProfileNumber) -> F4tResult<String> {
        self.address_profile(profile).await?;
        let name = self.profile_name().await?;
        self.pacer.pause().await;
        info!("Starting profile {} ({})", profile.get(), name);
        self.program_mode(ProgramMode::Start).await?;
        Ok(name)
    }

    /// Apply `mode` to whichever program is currently selected. Returns its name.
    pub async fn control_selected_program(&mut self, mode: ProgramMode) -> F4tResult<String> {
        self.address_profile(ProfileNumber::SELECTED).await?;
        let name = self.profile_name().await?;
        self.pacer.pause().await;
        info!("Sending {} to program {:?}", mode, name);
        self.program_mode(mode).await?;
        Ok(name)
    }

    async fn address_profile(&mut self, profile: ProfileNumber) -> F4tResult<()> {
        self.pacer.settle().await;
        self.select_profile(profile).await?;
        self.pacer.pause().await;
        Ok(())
    }

    /// Ramp rate (degrees per scale unit) or ramp time (minutes)
    pub async fn ramp(&mut self, loop_id: LoopId, kind: RampKind) -> F4tResult<String> {
        self.settled_query(&commands::ramp(loop_id, kind)).await
    }

    pub async fn set_ramp_rate(&mut self, loop_id: LoopId, rate: f64) -> F4tResult<()> {
        if !rate.is_finite() {
            return Err(F4tError::InvalidInput(format!(
                "ramp rate {} is not a finite number",
                rate
            )));
        }
        self.send(&commands::write_ramp_rate(loop_id, rate)).await?;
        self.pacer.mark();
        Ok(())
    }

    pub async fn set_ramp_time(&mut self, loop_id: LoopId, minutes: u32) -> F4tResult<()> {
        self.send(&commands::write_ramp_time(loop_id, minutes)).await?;
        self.pacer.mark();
        Ok(())
    }

    pub async fn set_ramp_scale(&mut self, loop_id: LoopId, scale: RampScale) -> F4tResult<()> {
        self.pacer.settle().await;
        self.send(&commands::ramp_scale(loop_id, scale)).await?;
        self.pacer.mark();
        Ok(())
    }

    /// `Off` steps straight to the set point, the others ramp.
    pub async fn set_ramp_action(&mut self, loop_id: LoopId, action: RampAction) -> F4tResult<()> {
        self.pacer.settle().await;
        self.send(&commands::ramp_action(loop_id, action)).await?;
        self.pacer.mark();
        Ok(())
    }

    /// Raw state text of a time signal, normally `ON` or `OFF`
    pub async fn time_signal_state(&mut self, output: OutputId) -> F4tResult<String> {
        self.settled_query(&commands::output_state(output)).await
    }

    pub async fn time_signal_name(&mut self, output: OutputId) -> F4tResult<String> {
        self.settled_query(&commands::output_name(output)).await
    }

    /// State and name of a time signal
    pub async fn time_signal(&mut self, output: OutputId) -> F4tResult<TimeSignal> {
        let command = commands::output_state(output);
        let text = self.settled_query(&command).await?;
        let state = text
            .parse::<SignalState>()
            .map_err(|_| F4tError::UnexpectedResponse {
                command,
                response: text.clone(),
            })?;
        let name = self.time_signal_name(output).await?;

        Ok(TimeSignal {
            id: output.get(),
            state,
            name: if name.is_empty() { None } else { Some(name) },
        })
    }

    /// Read the output state and write the opposite. Returns the state written.
    ///
    /// Not atomic: a change made on the device between the read and the
    /// write is overwritten. Any reply other than `OFF` is treated as on.
    pub async fn toggle_time_signal(&mut self, output: OutputId) -> F4tResult<SignalState> {
        let current = self.time_signal_state(output).await?;
        let next = match current.parse::<SignalState>() {
            Ok(state) => state.toggled(),
            Err(_) => {
                warn!(
                    "Output {} reported {:?}, switching it off",
                    output.get(),
                    current
                );
                SignalState::Off
            }
        };

        self.pacer.pause().await;
        self.send(&commands::write_output_state(output, next)).await?;
        self.pacer.mark();
        info!("Output {} set to {}", output.get(), next);
        Ok(next)
    }

    pub async fn temperature_unit(&mut self) -> F4tResult<TemperatureUnit> {
        self.drain().await?;
        self.pacer.pause().await;
        let text = self.query(commands::TEMPERATURE_UNIT).await?;
        let unit = text
            .parse::<TemperatureUnit>()
            .map_err(|_| F4tError::UnexpectedResponse {
                command: commands::TEMPERATURE_UNIT.to_string(),
                response: text.clone(),
            })?;
        self.temperature_unit = Some(unit);
        Ok(unit)
    }

    pub async fn set_temperature_unit(&mut self, unit: TemperatureUnit) -> F4tResult<()> {
        self.send(&commands::write_temperature_unit(unit)).await?;
        self.temperature_unit = Some(unit);
        Ok(())
    }
}

fn clean_profile_name(raw: &str) -> String {
    raw.trim().replace('"', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::io::{Builder, Mock};

    fn mock_session(stream: Mock) -> F4tSession<TcpConnection<Mock>> {
        paced_session(stream, Duration::ZERO)
    }

    fn paced_session(stream: Mock, settle_delay: Duration) -> F4tSession<TcpConnection<Mock>> {
        let config = SessionConfig::new("mock")
            .with_settle_delay(settle_delay)
            .with_identify_on_connect(false);
        let connection = TcpConnection::from_stream(stream, "mock", Duration::from_millis(100));
        F4tSession::with_transport(connection, &config)
    }

    #[test]
    fn test_clean_profile_name() {
        assert_eq!(clean_profile_name("\"RampA\""), "RampA");
        assert_eq!(clean_profile_name("  \"\" "), "");
    }

    #[tokio::test]
    async fn test_loop_sp_query() {
        let stream = Builder::new()
            .write(b":SOURCE:CLOOP2:SPOINT?\n")
            .read(b"50.0\n")
            .build();
        let mut session = mock_session(stream);

        assert_eq!(session.loop_sp(LoopId::HUMIDITY).await.unwrap(), "50.0");
    }

    #[tokio::test]
    async fn test_write_sp_rejects_nan_before_sending() {
        let mut session = mock_session(Builder::new().build());
        let result = session.write_loop_sp(LoopId::TEMPERATURE, f64::NAN).await;
        assert!(matches!(result, Err(F4tError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_set_point_write_is_settled_before_read_back() {
        let stream = Builder::new()
            .write(b":SOURCE:CLOOP1:SPOINT 23.5\n")
            .write(b":SOURCE:CLOOP1:SPOINT?\n")
            .read(b"23.5\n")
            .build();
        let mut session = paced_session(stream, Duration::from_millis(50));

        let started = tokio::time::Instant::now();
        session.write_loop_sp(LoopId::TEMPERATURE, 23.5).await.unwrap();
        session.settle().await;
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(session.loop_sp(LoopId::TEMPERATURE).await.unwrap(), "23.5");
    }

    #[tokio::test]
    async fn test_settle_without_pending_write_is_immediate() {
        let mut session = paced_session(Builder::new().build(), Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        session.settle().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_toggle_sends_opposite_state() {
        let stream = Builder::new()
            .write(b":OUTPUT3:STATE?\n")
            .read(b"ON\n")
            .write(b":OUTPUT3:STATE OFF\n")
            .build();
        let mut session = mock_session(stream);

        let written = session.toggle_time_signal(OutputId::new(3).unwrap()).await.unwrap();
        assert_eq!(written, SignalState::Off);
    }

    #[tokio::test]
    async fn test_toggle_unknown_state_switches_off() {
        let stream = Builder::new()
            .write(b":OUTPUT1:STATE?\n")
            .read(b"ERR\n")
            .write(b":OUTPUT1:STATE OFF\n")
            .build();
        let mut session = mock_session(stream);

        let written = session.toggle_time_signal(OutputId::new(1).unwrap()).await.unwrap();
        assert_eq!(written, SignalState::Off);
    }

    #[tokio::test]
    async fn test_time_signal_reads_state_and_name() {
        let stream = Builder::new()
            .write(b":OUTPUT2:STATE?\n")
            .read(b"OFF\n")
            .write(b":OUTPUT2:NAME?\n")
            .read(b"Door Lock\n")
            .build();
        let mut session = mock_session(stream);

        let signal = session.time_signal(OutputId::new(2).unwrap()).await.unwrap();
        assert_eq!(
            signal,
            TimeSignal {
                id: 2,
                state: SignalState::Off,
                name: Some("Door Lock".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_run_profile_sequence() {
        let stream = Builder::new()
            .write(b":PROGRAM:NUMBER 4\n")
            .write(b":PROGRAM:NAME?\n")
            .read(b"\"Soak\"\n")
            .write(b":PROGRAM:SELECTED:STATE START\n")
            .build();
        let mut session = mock_session(stream);

        let name = session.run_profile(ProfileNumber::new(4).unwrap()).await.unwrap();
        assert_eq!(name, "Soak");
        assert_eq!(session.last_program_mode(), Some(ProgramMode::Start));
    }

    #[tokio::test]
    async fn test_control_selected_program_uses_sentinel() {
        let stream = Builder::new()
            .write(b":PROGRAM:NUMBER 0\n")
            .write(b":PROGRAM:NAME?\n")
            .read(b"\"Soak\"\n")
            .write(b":PROGRAM:SELECTED:STATE PAUSE\n")
            .build();
        let mut session = mock_session(stream);

        session.control_selected_program(ProgramMode::Pause).await.unwrap();
        assert_eq!(session.last_program_mode(), Some(ProgramMode::Pause));
    }

    #[tokio::test]
    async fn test_ramp_configuration_commands() {
        let stream = Builder::new()
            .write(b":SOURCE:CLOOP1:RRATE 1.5\n")
            .write(b":SOURCE:CLOOP1:RTIME 30\n")
            .write(b":SOURCE:CLOOP1:RSCALE MINUTES\n")
            .write(b":SOURCE:CLOOP1:RACTION SETPOINT\n")
            .write(b":SOURCE:CLOOP1:RTIME?\n")
            .read(b"30\n")
            .build();
        let mut session = mock_session(stream);
        let loop_id = LoopId::TEMPERATURE;

        session.set_ramp_rate(loop_id, 1.5).await.unwrap();
        session.set_ramp_time(loop_id, 30).await.unwrap();
        session.set_ramp_scale(loop_id, RampScale::Minutes).await.unwrap();
        session.set_ramp_action(loop_id, RampAction::Setpoint).await.unwrap();
        assert_eq!(session.ramp(loop_id, RampKind::Time).await.unwrap(), "30");
    }

    #[tokio::test]
    async fn test_set_units_uses_plural_keyword() {
        let stream = Builder::new().write(b":UNITS:TEMPERATURE C\n").build();
        let mut session = mock_session(stream);

        session.set_temperature_unit(TemperatureUnit::Celsius).await.unwrap();
        assert_eq!(session.cached_temperature_unit(), Some(TemperatureUnit::Celsius));
    }

    #[tokio::test]
    async fn test_cascade_queries() {
        let stream = Builder::new()
            .write(b":SOURCE:CASCADE1:OUTER:PVALUE?\n")
            .read(b"21.3\n")
            .write(b":SOURCE:CASCADE1:INNER:SPOINT?\n")
            .read(b"22.0\n")
            .build();
        let mut session = mock_session(stream);
        let cascade = CascadeId::default();

        assert_eq!(
            session.cascade_loop_pv(cascade, CascadeLoop::Outer).await.unwrap(),
            "21.3"
        );
        assert_eq!(
            session.cascade_loop_sp(cascade, CascadeLoop::Inner).await.unwrap(),
            "22.0"
        );
    }
}
