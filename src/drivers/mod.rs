// src/drivers/mod.rs
// 设备访问层：客户端、属性观察者、滚动缓冲
pub mod buffer;
pub mod client;
pub mod error;
pub mod property;
pub mod sim;
pub mod tcp;
pub use buffer::{Sample, SampleBuffer};
pub use client::MfcClient;
pub use error::DeviceError;
pub use property::{Property, Subscription};
pub use sim::SimulatedMfc;
pub use tcp::{LazyTcpClient, TcpClient};
