// src/engine.rs
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use crate::drivers::{DeviceError, MfcClient};
use crate::types::{unix_now, DeviceCommand, DeviceEvent};

/// Background worker for one device.
///
/// Connects through `connect`, reports limits and destination once per
/// connection, then keeps reporting position and destination every `period`
/// and applies setpoint commands. The thread ends on `Shutdown` or when the
/// command channel closes.
pub fn spawn_thread<C, F>(
    device: usize,
    endpoint: String,
    mut connect: F,
    period: Duration,
    tx: Sender<DeviceEvent>,
    rx_cmd: Receiver<DeviceCommand>,
) -> JoinHandle<()>
where
    C: MfcClient + 'static,
    F: FnMut() -> Result<C, DeviceError> + Send + 'static,
{
    thread::spawn(move || {
        let mut client: Option<C> = None;
        // 同一错误只报告一次，避免刷屏
        let mut last_error: Option<String> = None;

        loop {
            // 1. 连接 (或重连)
            if client.is_none() {
                match connect().and_then(|mut c| announce(device, &endpoint, &mut c, &tx).map(|_| c)) {
                    Ok(c) => {
                        log::info!("device {device}: connected to {endpoint}");
                        last_error = None;
                        client = Some(c);
                    }
                    Err(e) => report(device, &mut last_error, &tx, &e),
                }
            }

            // 2. 刷新属性
            if let Some(c) = client.as_mut() {
                if let Err(e) = refresh(device, c, &tx) {
                    report(device, &mut last_error, &tx, &e);
                    if e.is_connection_lost() {
                        client = None;
                    }
                }
            }

            // 3. 等待命令，同时作为刷新间隔
            match rx_cmd.recv_timeout(period) {
                Ok(DeviceCommand::SetDestination(value)) => {
                    let Some(c) = client.as_mut() else {
                        tx.send(DeviceEvent::Error {
                            device,
                            message: "not connected; setpoint dropped".to_owned(),
                        })
                        .ok();
                        continue;
                    };
                    match c.set_destination(value) {
                        Ok(()) => {
                            log::info!("device {device}: destination -> {value}");
                            tx.send(DeviceEvent::Destination { device, value }).ok();
                        }
                        Err(e) => {
                            // a rejected setpoint is always worth showing
                            last_error = None;
                            report(device, &mut last_error, &tx, &e);
                            if e.is_connection_lost() {
                                client = None;
                            }
                        }
                    }
                }
                Ok(DeviceCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
        log::debug!("device {device}: engine stopped");
    })
}

fn report(
    device: usize,
    last_error: &mut Option<String>,
    tx: &Sender<DeviceEvent>,
    err: &DeviceError,
) {
    let message = err.to_string();
    if last_error.as_deref() != Some(message.as_str()) {
        log::warn!("device {device}: {message}");
        tx.send(DeviceEvent::Error { device, message: message.clone() }).ok();
        *last_error = Some(message);
    }
}

fn announce<C: MfcClient>(
    device: usize,
    endpoint: &str,
    client: &mut C,
    tx: &Sender<DeviceEvent>,
) -> Result<(), DeviceError> {
    let (min, max) = client.get_limits()?;
    tx.send(DeviceEvent::Connected { device, endpoint: endpoint.to_owned() }).ok();
    tx.send(DeviceEvent::Limits { device, min, max }).ok();
    Ok(())
}

fn refresh<C: MfcClient>(
    device: usize,
    client: &mut C,
    tx: &Sender<DeviceEvent>,
) -> Result<(), DeviceError> {
    let value = client.get_position()?;
    tx.send(DeviceEvent::Position { device, timestamp: unix_now(), value }).ok();
    let value = client.get_destination()?;
    tx.send(DeviceEvent::Destination { device, value }).ok();
    Ok(())
}
