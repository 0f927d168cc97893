use crate::drivers::DeviceError;
/// Measured/commanded values of a mass flow controller.
///
/// `position` is the calibrated flow, `native_position` the raw reading it was
/// derived from (usually a voltage) and `destination` the setpoint.
pub trait MfcClient: Send {
    fn get_position(&mut self) -> Result<f64, DeviceError>;
    fn get_native_position(&mut self) -> Result<f64, DeviceError>;
    fn get_destination(&mut self) -> Result<f64, DeviceError>;
    fn set_destination(&mut self, destination: f64) -> Result<(), DeviceError>;
    /// Lower and upper bound of the flow range.
    fn get_limits(&mut self) -> Result<(f64, f64), DeviceError>;
}
