//! In-process stand-in for an F4T controller.
//!
//! Listens on an ephemeral localhost port, answers the SCPI subset the
//! session uses, and records every command line plus whether the client
//! closed its socket.

#![allow(dead_code)]

use f4tcom::{FramingMode, SessionConfig};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub const TEST_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug, Default)]
pub struct DeviceState {
    /// Every command line received, in order
    pub received: Vec<String>,
    pub accepted: usize,
    pub closed: usize,
    pub identity: String,
    pub pv: HashMap<u8, String>,
    pub sp: HashMap<u8, String>,
    pub profiles: HashMap<u8, String>,
    pub selected_profile: u8,
    pub outputs: HashMap<u8, String>,
    pub output_names: HashMap<u8, String>,
    pub unit: String,
    /// Raw bytes sent instead of the normal reply; empty means no reply
    pub overrides: HashMap<String, Vec<u8>>,
    /// Close the socket when this command arrives
    pub hang_up_on: Option<String>,
    /// Sent unprompted right after accepting
    pub greeting: Option<Vec<u8>>,
}

impl DeviceState {
    pub fn f4t() -> Self {
        Self {
            identity: "WATLOW ELECTRIC,F4T1L1AA1A4A1AA,1234567,01.05.0009".to_string(),
            unit: "C".to_string(),
            ..Self::default()
        }
    }

    fn reply(&mut self, line: &str) -> Option<Vec<u8>> {
        if let Some(raw) = self.overrides.get(line) {
            return if raw.is_empty() { None } else { Some(raw.clone()) };
        }
        let text = self.handle(line)?;
        Some(format!("{}\n", text).into_bytes())
    }

    fn handle(&mut self, line: &str) -> Option<String> {
        if line == "*IDN?" {
            return Some(self.identity.clone());
        }
        if line == ":UNIT:TEMPERATURE?" {
            return Some(self.unit.clone());
        }
        if let Some(unit) = line.strip_prefix(":UNITS:TEMPERATURE ") {
            self.unit = unit.to_string();
            return None;
        }
        if line == ":PROGRAM:NAME?" {
            let name = self.profiles.get(&self.selected_profile).cloned().unwrap_or_default();
            return Some(format!("\"{}\"", name));
        }
        if let Some(number) = line.strip_prefix(":PROGRAM:NUMBER ") {
            self.selected_profile = number.parse().unwrap_or(0);
            return None;
        }
        if line.starts_with(":PROGRAM:SELECTED:STATE ") {
            return None;
        }
        if let Some(rest) = line.strip_prefix(":SOURCE:CLOOP") {
            let (index, command) = split_index(rest)?;
            return match command {
                ":PVALUE?" => Some(self.pv.get(&index).cloned().unwrap_or_default()),
                ":SPOINT?" => Some(self.sp.get(&index).cloned().unwrap_or_default()),
                _ => {
                    if let Some(value) = command.strip_prefix(":SPOINT ") {
                        self.sp.insert(index, value.to_string());
                    }
                    None
                }
            };
        }
        if let Some(rest) = line.strip_prefix(":OUTPUT") {
            let (index, command) = split_index(rest)?;
            return match command {
                ":STATE?" => Some(self.outputs.get(&index).cloned().unwrap_or_default()),
                ":NAME?" => Some(self.output_names.get(&index).cloned().unwrap_or_default()),
                _ => {
                    if let Some(state) = command.strip_prefix(":STATE ") {
                        self.outputs.insert(index, state.to_string());
                    }
                    None
                }
            };
        }
        if line.ends_with('?') {
            return Some("0".to_string());
        }
        None
    }
}

fn split_index(rest: &str) -> Option<(u8, &str)> {
    let digits = rest.find(|c: char| !c.is_ascii_digit())?;
    let index = rest[..digits].parse().ok()?;
    Some((index, &rest[digits..]))
}

pub struct MockController {
    addr: SocketAddr,
    state: Arc<Mutex<DeviceState>>,
    _handle: JoinHandle<()>,
}

impl MockController {
    pub async fn start(state: DeviceState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(state));

        let accept_state = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accept_state.lock().unwrap().accepted += 1;
                tokio::spawn(serve(stream, Arc::clone(&accept_state)));
            }
        });

        Self {
            addr,
            state,
            _handle: handle,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new("127.0.0.1")
            .with_settle_delay(Duration::ZERO)
            .with_identify_on_connect(false)
            .with_framing(FramingMode::Lenient);
        config.connection.port = self.port();
        config.connection.timeout = TEST_TIMEOUT;
        config
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap()
    }

    pub fn received(&self) -> Vec<String> {
        self.state().received.clone()
    }

    /// Wait until the mock has seen `count` client disconnects
    pub async fn wait_for_close(&self, count: usize) -> bool {
        for _ in 0..50 {
            if self.state().closed >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

async fn serve(stream: TcpStream, state: Arc<Mutex<DeviceState>>) {
    let (read_half, mut write_half) = stream.into_split();

    let greeting = state.lock().unwrap().greeting.clone();
    if let Some(greeting) = greeting {
        let _ = write_half.write_all(&greeting).await;
    }

    let mut lines = BufReader::new(read_half).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let (reply, hang_up) = {
            let mut device = state.lock().unwrap();
            device.received.push(line.clone());
            let hang_up = device.hang_up_on.as_deref() == Some(line.as_str());
            (device.reply(&line), hang_up)
        };

        if hang_up {
            break;
        }
        if let Some(reply) = reply {
            if write_half.write_all(&reply).await.is_err() {
                break;
            }
        }
    }

    state.lock().unwrap().closed += 1;
}
