//! Fixed-step numerical integration schemes.
use serde::{Deserialize, Serialize};

/// The integration scheme used to advance a state by one fixed time step.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Integrator {
    /// Forward Euler: every component is updated from the pre-step
    /// derivative values.
    Euler,

    /// Semi-implicit (symplectic) Euler: velocity-like components are
    /// updated first and position-like components use the just-updated
    /// velocity. More stable for oscillatory systems.
    SemiImplicitEuler,

    /// Forward Euler with a linear drag penalty added to the translational
    /// acceleration, proportional to velocity.
    EulerFriction {
        /// Drag coefficient.
        drag: f64,
    },
}

impl Default for Integrator {
    fn default() -> Self {
        Integrator::Euler
    }
}

impl Integrator {
    /// The drag coefficient applied to translational acceleration, if this
    /// scheme carries one. Dynamics models consult this when computing
    /// accelerations.
    pub fn linear_drag(&self) -> Option<f64> {
        match self {
            Integrator::EulerFriction { drag } => Some(*drag),
            _ => None,
        }
    }

    /// Advances one position/velocity pair by `dt` given the acceleration.
    pub fn advance_pair(&self, dt: f64, pos: &mut f64, vel: &mut f64, acc: f64) {
        match self {
            Integrator::Euler | Integrator::EulerFriction { .. } => {
                *pos += dt * *vel;
                *vel += dt * acc;
            }
            Integrator::SemiImplicitEuler => {
                *vel += dt * acc;
                *pos += dt * *vel;
            }
        }
    }

    /// Advances one first-order component by `dt` given its derivative.
    pub fn advance(&self, dt: f64, x: &mut f64, dx: f64) {
        *x += dt * dx;
    }
}

#[cfg(test)]
mod tests {
    use super::Integrator;

    #[test]
    fn test_equivalence_at_rest() {
        // With zero velocity and zero acceleration the update order cannot
        // matter.
        let (mut p_e, mut v_e) = (0.3, 0.0);
        let (mut p_s, mut v_s) = (0.3, 0.0);
        Integrator::Euler.advance_pair(0.02, &mut p_e, &mut v_e, 0.0);
        Integrator::SemiImplicitEuler.advance_pair(0.02, &mut p_s, &mut v_s, 0.0);
        assert_eq!((p_e, v_e), (p_s, v_s));
    }

    #[test]
    fn test_semi_implicit_uses_new_velocity() {
        let (mut p, mut v) = (0.0, 0.0);
        Integrator::SemiImplicitEuler.advance_pair(0.1, &mut p, &mut v, 1.0);
        assert!((v - 0.1).abs() < 1e-12);
        assert!((p - 0.01).abs() < 1e-12);

        let (mut p, mut v) = (0.0, 0.0);
        Integrator::Euler.advance_pair(0.1, &mut p, &mut v, 1.0);
        assert_eq!(p, 0.0);
        assert!((v - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_drag_coefficient() {
        assert_eq!(Integrator::Euler.linear_drag(), None);
        assert_eq!(
            Integrator::EulerFriction { drag: 0.1 }.linear_drag(),
            Some(0.1)
        );
    }
}
