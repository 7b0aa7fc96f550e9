//! SCPI command text for every controller capability.

use crate::domain::types::{
    CascadeId, CascadeLoop, LoopId, OutputId, ProfileNumber, ProgramMode, RampAction, RampKind,
    RampScale, SignalState, TemperatureUnit,
};

pub const IDENTIFY: &str = "*IDN?";
pub const PROGRAM_NAME: &str = ":PROGRAM:NAME?";
// The device reads units with singular UNIT and writes them with plural UNITS.
pub const TEMPERATURE_UNIT: &str = ":UNIT:TEMPERATURE?";

pub fn loop_pv(loop_id: LoopId) -> String {
    format!(":SOURCE:CLOOP{}:PVALUE?", loop_id)
}

pub fn loop_sp(loop_id: LoopId) -> String {
    format!(":SOURCE:CLOOP{}:SPOINT?", loop_id)
}

pub fn write_loop_sp(loop_id: LoopId, value: f64) -> String {
    format!(":SOURCE:CLOOP{}:SPOINT {}", loop_id, value)
}

pub fn cascade_sp(cascade: CascadeId) -> String {
    format!(":SOURCE:CASCADE{}:SPOINT?", cascade.get())
}

pub fn cascade_loop_pv(cascade: CascadeId, sub_loop: CascadeLoop) -> String {
    format!(":SOURCE:CASCADE{}:{}:PVALUE?", cascade.get(), sub_loop.as_scpi())
}

pub fn cascade_loop_sp(cascade: CascadeId, sub_loop: CascadeLoop) -> String {
    format!(":SOURCE:CASCADE{}:{}:SPOINT?", cascade.get(), sub_loop.as_scpi())
}

pub fn select_profile(profile: ProfileNumber) -> String {
    format!(":PROGRAM:NUMBER {}", profile.get())
}

pub fn program_state(mode: ProgramMode) -> String {
    format!(":PROGRAM:SELECTED:STATE {}", mode.as_scpi())
}

pub fn ramp(loop_id: LoopId, kind: RampKind) -> String {
    format!(":SOURCE:CLOOP{}:{}?", loop_id, kind.as_scpi())
}

pub fn write_ramp_rate(loop_id: LoopId, rate: f64) -> String {
    format!(":SOURCE:CLOOP{}:{} {}", loop_id, RampKind::Rate.as_scpi(), rate)
}

pub fn write_ramp_time(loop_id: LoopId, minutes: u32) -> String {
    format!(":SOURCE:CLOOP{}:{} {}", loop_id, RampKind::Time.as_scpi(), minutes)
}

pub fn ramp_scale(loop_id: LoopId, scale: RampScale) -> String {
    format!(":SOURCE:CLOOP{}:RSCALE {}", loop_id, scale.as_scpi())
}

pub fn ramp_action(loop_id: LoopId, action: RampAction) -> String {
    format!(":SOURCE:CLOOP{}:RACTION {}", loop_id, action.as_scpi())
}

pub fn output_state(output: OutputId) -> String {
    format!(":OUTPUT{}:STATE?", output.get())
}

pub fn write_output_state(output: OutputId, state: SignalState) -> String {
    format!(":OUTPUT{}:STATE {}", output.get(), state.as_scpi())
}

pub fn output_name(output: OutputId) -> String {
    format!(":OUTPUT{}:NAME?", output.get())
}

pub fn write_temperature_unit(unit: TemperatureUnit) -> String {
    format!(":UNITS:TEMPERATURE {}", unit.as_scpi())
}
