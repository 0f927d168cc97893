// src/types.rs
use serde::Deserialize;

// 连接模式
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    Simulation,
    #[default]
    Hardware,
}

// GUI 发给设备引擎的命令
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceCommand {
    SetDestination(f64),
    Shutdown,
}

// 设备引擎发给 GUI 的消息
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceEvent {
    Connected { device: usize, endpoint: String },
    Position { device: usize, timestamp: f64, value: f64 },
    Destination { device: usize, value: f64 },
    Limits { device: usize, min: f64, max: f64 },
    Error { device: usize, message: String },
}

impl DeviceEvent {
    pub fn device(&self) -> usize {
        match self {
            DeviceEvent::Connected { device, .. }
            | DeviceEvent::Position { device, .. }
            | DeviceEvent::Destination { device, .. }
            | DeviceEvent::Limits { device, .. }
            | DeviceEvent::Error { device, .. } => *device,
        }
    }
}

/// Current wall-clock time as UNIX seconds.
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1e6
}
