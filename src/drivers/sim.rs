use std::sync::{Arc, Mutex, MutexGuard};
use rand::Rng;
use crate::drivers::{DeviceError, MfcClient};
#[derive(Clone, Debug)]
struct SimState {
    position: f64,
    destination: f64,
    limits: (f64, f64),
    volts_per_unit: f64,
    noise: f64,
}
/// In-process stand-in for an MFC daemon.
///
/// Every clone talks to the same simulated controller, so the engine and the
/// data writer see one device just like two connections to a real daemon.
#[derive(Clone, Debug)]
pub struct SimulatedMfc {
    state: Arc<Mutex<SimState>>,
}
impl SimulatedMfc {
    pub fn new(limits: (f64, f64)) -> Self {
        let span = (limits.1 - limits.0).abs().max(f64::EPSILON);
        Self {
            state: Arc::new(Mutex::new(SimState {
                position: limits.0,
                destination: limits.0,
                limits,
                // full scale maps onto 0..5 V
                volts_per_unit: 5.0 / span,
                noise: span * 0.002,
            })),
        }
    }
    /// Simulated device without jitter, reporting exactly what is set.
    pub fn fixed(position: f64, native_position: f64) -> Self {
        let sim = Self::new((0.0, 10.0));
        {
            let mut state = sim.lock();
            state.position = position;
            state.destination = position;
            state.noise = 0.0;
            state.volts_per_unit = if position == 0.0 {
                0.0
            } else {
                native_position / position
            };
        }
        sim
    }
    fn lock(&self) -> MutexGuard<'_, SimState> {
        // a panicked holder cannot leave the plain-data state inconsistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
impl MfcClient for SimulatedMfc {
    fn get_position(&mut self) -> Result<f64, DeviceError> {
        let mut state = self.lock();
        // first-order approach to the setpoint plus a little sensor noise
        let step = (state.destination - state.position) * 0.3;
        let jitter = if state.noise > 0.0 {
            rand::thread_rng().gen_range(-state.noise..state.noise)
        } else {
            0.0
        };
        state.position += step + jitter;
        Ok(state.position)
    }
    fn get_native_position(&mut self) -> Result<f64, DeviceError> {
        let state = self.lock();
        Ok(state.position * state.volts_per_unit)
    }
    fn get_destination(&mut self) -> Result<f64, DeviceError> {
        Ok(self.lock().destination)
    }
    fn set_destination(&mut self, destination: f64) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let (lo, hi) = state.limits;
        if destination < lo.min(hi) || destination > hi.max(lo) {
            return Err(DeviceError::Remote(format!(
                "destination {destination} outside limits [{lo}, {hi}]"
            )));
        }
        state.destination = destination;
        Ok(())
    }
    fn get_limits(&mut self) -> Result<(f64, f64), DeviceError> {
        Ok(self.lock().limits)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn clones_share_one_device() {
        let mut a = SimulatedMfc::new((0.0, 100.0));
        let mut b = a.clone();
        a.set_destination(40.0).unwrap();
        assert_eq!(b.get_destination().unwrap(), 40.0);
    }
    #[test]
    fn position_converges_to_destination() {
        let mut sim = SimulatedMfc::new((0.0, 100.0));
        sim.set_destination(50.0).unwrap();
        let mut last = 0.0;
        for _ in 0..60 {
            last = sim.get_position().unwrap();
        }
        assert!((last - 50.0).abs() < 1.0, "position {last}");
    }
    #[test]
    fn rejects_destination_outside_limits() {
        let mut sim = SimulatedMfc::new((0.0, 10.0));
        assert!(sim.set_destination(11.0).is_err());
        assert!(sim.set_destination(-0.5).is_err());
    }
    #[test]
    fn fixed_device_reports_exact_values() {
        let mut sim = SimulatedMfc::fixed(2.0, 2.1);
        assert_eq!(sim.get_position().unwrap(), 2.0);
        assert!((sim.get_native_position().unwrap() - 2.1).abs() < 1e-12);
    }
}
