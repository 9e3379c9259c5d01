use std::{
    fmt::Debug,
    ops::{AddAssign, MulAssign},
};

use tolerance::Tolerance;

pub mod state_array;

/// Trait representing an integrable state for use in ODE solvers.
///
/// The solver only needs in-place scaling and accumulation, so a state and its
/// derivative share the same type. `Tolerance` supplies the error norm used by
/// adaptive step control.
pub trait Integrable:
    Clone + Debug + Default + MulAssign<f64> + for<'a> AddAssign<&'a Self> + 'static
{
    type Tolerance: Tolerance<State = Self>;

    /// False if any component is NaN or infinite.
    fn is_finite(&self) -> bool;
}
