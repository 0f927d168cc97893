use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use crate::drivers::{DeviceError, MfcClient};
#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}
#[derive(Deserialize)]
struct Response {
    id: u64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}
/// Blocking RPC client for one MFC daemon.
///
/// Messages are single-line JSON objects terminated by `\n`. Every request
/// waits for the response carrying the same `id`.
pub struct TcpClient {
    endpoint: String,
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    next_id: u64,
}
impl TcpClient {
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, DeviceError> {
        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    stream.set_nodelay(true)?;
                    let writer = stream.try_clone()?;
                    log::debug!("connected to {host}:{port} via {addr}");
                    return Ok(Self {
                        endpoint: format!("{host}:{port}"),
                        reader: BufReader::new(stream),
                        writer,
                        next_id: 0,
                    });
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err
            .map(DeviceError::Io)
            .unwrap_or(DeviceError::Disconnected))
    }
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
    fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Value, DeviceError> {
        self.next_id += 1;
        let id = self.next_id;
        let mut line = serde_json::to_string(&Request { id, method, params })?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(DeviceError::Disconnected);
        }
        let response: Response = serde_json::from_str(reply.trim_end())?;
        if response.id != id {
            return Err(DeviceError::UnexpectedResponse {
                method: method.to_string(),
                detail: format!("expected id {id}, got {}", response.id),
            });
        }
        if let Some(message) = response.error {
            return Err(DeviceError::Remote(message));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }
    fn call_f64(&mut self, method: &str) -> Result<f64, DeviceError> {
        let value = self.call(method, Vec::new())?;
        value
            .as_f64()
            .ok_or_else(|| DeviceError::UnexpectedResponse {
                method: method.to_string(),
                detail: format!("expected a number, got {value}"),
            })
    }
}
impl MfcClient for TcpClient {
    fn get_position(&mut self) -> Result<f64, DeviceError> {
        self.call_f64("get_position")
    }
    fn get_native_position(&mut self) -> Result<f64, DeviceError> {
        self.call_f64("get_native_position")
    }
    fn get_destination(&mut self) -> Result<f64, DeviceError> {
        self.call_f64("get_destination")
    }
    fn set_destination(&mut self, destination: f64) -> Result<(), DeviceError> {
        self.call("set_position", vec![json!(destination)])?;
        Ok(())
    }
    fn get_limits(&mut self) -> Result<(f64, f64), DeviceError> {
        let value = self.call("get_limits", Vec::new())?;
        match value.as_array().map(|a| a.as_slice()) {
            Some([lo, hi]) => match (lo.as_f64(), hi.as_f64()) {
                (Some(lo), Some(hi)) => Ok((lo, hi)),
                _ => Err(DeviceError::UnexpectedResponse {
                    method: "get_limits".to_string(),
                    detail: format!("non-numeric limits {value}"),
                }),
            },
            _ => Err(DeviceError::UnexpectedResponse {
                method: "get_limits".to_string(),
                detail: format!("expected [min, max], got {value}"),
            }),
        }
    }
}
/// Client that connects on first use and drops the link after a transport
/// failure, so the next call reconnects.
///
/// Used for the data writer, whose clients must not block start-up when a
/// daemon is not running yet. Failures are still returned to the caller.
pub struct LazyTcpClient {
    host: String,
    port: u16,
    timeout: Duration,
    inner: Option<TcpClient>,
}
impl LazyTcpClient {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
            inner: None,
        }
    }
    fn with<T>(
        &mut self,
        op: impl FnOnce(&mut TcpClient) -> Result<T, DeviceError>,
    ) -> Result<T, DeviceError> {
        if self.inner.is_none() {
            self.inner = Some(TcpClient::connect(&self.host, self.port, self.timeout)?);
        }
        let client = self.inner.as_mut().ok_or(DeviceError::Disconnected)?;
        let result = op(client);
        if let Err(e) = &result {
            if e.is_connection_lost() {
                self.inner = None;
            }
        }
        result
    }
}
impl MfcClient for LazyTcpClient {
    fn get_position(&mut self) -> Result<f64, DeviceError> {
        self.with(|c| c.get_position())
    }
    fn get_native_position(&mut self) -> Result<f64, DeviceError> {
        self.with(|c| c.get_native_position())
    }
    fn get_destination(&mut self) -> Result<f64, DeviceError> {
        self.with(|c| c.get_destination())
    }
    fn set_destination(&mut self, destination: f64) -> Result<(), DeviceError> {
        self.with(|c| c.set_destination(destination))
    }
    fn get_limits(&mut self) -> Result<(f64, f64), DeviceError> {
        self.with(|c| c.get_limits())
    }
}
