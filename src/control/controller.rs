/// Trait for control laws driving the pendulum.
///
/// Implement this to plug a custom law into [`crate::sim::simulate_with`].
/// The measurement is the lean in degrees; the return value is a torque.
pub trait Controller {
    fn control(&mut self, setpoint: f64, measurement: f64, dt: f64) -> f64;

    /// Reset internal state (integrators, filters).
    fn reset(&mut self) {}

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}
