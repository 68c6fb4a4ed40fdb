//! Operator trait and descriptors.

use crate::problem::{Problem, Solution};
use crate::random::GaaRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The pool an operator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorFamily {
    Constructive,
    LocalSearch,
    Perturbation,
    Repair,
}

impl OperatorFamily {
    pub const ALL: [OperatorFamily; 4] = [
        OperatorFamily::Constructive,
        OperatorFamily::LocalSearch,
        OperatorFamily::Perturbation,
        OperatorFamily::Repair,
    ];
}

impl fmt::Display for OperatorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperatorFamily::Constructive => "constructive",
            OperatorFamily::LocalSearch => "local-search",
            OperatorFamily::Perturbation => "perturbation",
            OperatorFamily::Repair => "repair",
        })
    }
}

/// Parameters forwarded from an action node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpParams {
    pub max_iter: Option<u32>,
    pub intensity: Option<f64>,
}

impl OpParams {
    pub fn max_iter_or(&self, default: u32) -> u32 {
        self.max_iter.unwrap_or(default)
    }

    /// Intensity clamped to `[0, 1]`.
    pub fn intensity_or(&self, default: f64) -> f64 {
        self.intensity.unwrap_or(default).clamp(0.0, 1.0)
    }
}

/// A fault raised inside an operator body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct OperatorFault(pub String);

impl OperatorFault {
    pub fn new(cause: impl Into<String>) -> Self {
        Self(cause.into())
    }
}

/// A state transformer registered under a string key.
///
/// Operators are pure: the output depends only on the problem, the input
/// state, the parameters and the generator they are handed. Any closure
/// with the matching signature is an operator.
///
/// # Examples
///
/// ```
/// use u_gaa::problem::{Problem, Solution};
/// use u_gaa::random::GaaRng;
/// use u_gaa::registry::{OpParams, Operator, OperatorFault};
///
/// fn identity(
///     _p: &Problem,
///     s: &Solution,
///     _params: &OpParams,
///     _rng: &mut GaaRng,
/// ) -> Result<Solution, OperatorFault> {
///     Ok(s.clone())
/// }
///
/// let op: Box<dyn Operator> = Box::new(identity);
/// # let _ = op;
/// ```
pub trait Operator: Send + Sync {
    fn apply(
        &self,
        problem: &Problem,
        state: &Solution,
        params: &OpParams,
        rng: &mut GaaRng,
    ) -> Result<Solution, OperatorFault>;
}

impl<F> Operator for F
where
    F: Fn(&Problem, &Solution, &OpParams, &mut GaaRng) -> Result<Solution, OperatorFault>
        + Send
        + Sync,
{
    fn apply(
        &self,
        problem: &Problem,
        state: &Solution,
        params: &OpParams,
        rng: &mut GaaRng,
    ) -> Result<Solution, OperatorFault> {
        self(problem, state, params, rng)
    }
}

/// A registered operator and its behavioural flags.
pub struct OperatorDescriptor {
    op: Box<dyn Operator>,
    may_return_infeasible: bool,
    is_stochastic: bool,
}

impl OperatorDescriptor {
    pub fn new(op: impl Operator + 'static) -> Self {
        Self {
            op: Box::new(op),
            may_return_infeasible: false,
            is_stochastic: false,
        }
    }

    pub fn with_infeasible_output(mut self, may: bool) -> Self {
        self.may_return_infeasible = may;
        self
    }

    pub fn with_stochastic(mut self, stochastic: bool) -> Self {
        self.is_stochastic = stochastic;
        self
    }

    pub fn may_return_infeasible(&self) -> bool {
        self.may_return_infeasible
    }

    pub fn is_stochastic(&self) -> bool {
        self.is_stochastic
    }

    pub fn apply(
        &self,
        problem: &Problem,
        state: &Solution,
        params: &OpParams,
        rng: &mut GaaRng,
    ) -> Result<Solution, OperatorFault> {
        self.op.apply(problem, state, params, rng)
    }
}

impl fmt::Debug for OperatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorDescriptor")
            .field("may_return_infeasible", &self.may_return_infeasible)
            .field("is_stochastic", &self.is_stochastic)
            .finish_non_exhaustive()
    }
}
