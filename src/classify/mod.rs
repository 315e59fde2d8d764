//! Natural-breaks classification.
//!
//! The break computation sits behind [`BreakComputer`] so the pipeline does
//! not care which algorithm produces the boundaries; [`NaturalBreaks`]
//! (backed by the `ckmeans` crate) is the default.

mod natural;

pub use natural::NaturalBreaks;

use crate::data::model::{BreakSet, ClassCount};
use crate::error::ClassifyError;

/// Computes class boundaries for a numeric sequence.
///
/// Implementations receive at least `classes` finite values and must return
/// `classes + 1` non-decreasing boundaries, starting at the minimum and
/// ending at the maximum.
pub trait BreakComputer {
    fn compute_breaks(&self, values: &[f64], classes: usize) -> Result<Vec<f64>, ClassifyError>;
}

/// Output of [`classify`].
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub breaks: BreakSet,
    /// The input values in ascending order, ready for plotting.
    pub sorted: Vec<f64>,
}

/// Split `values` into `classes` natural-break classes.
///
/// `classes == values.len()` is accepted and puts every value in its own
/// class.
pub fn classify<C>(computer: &C, values: &[f64], classes: ClassCount) -> Result<Classified, ClassifyError>
where
    C: BreakComputer + ?Sized,
{
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(ClassifyError::NonFinite { index });
    }
    let k = classes.get();
    if values.len() < k {
        return Err(ClassifyError::InvalidClassCount {
            classes: k,
            len: values.len(),
        });
    }

    let breaks = BreakSet::new(computer.compute_breaks(values, k)?);
    debug_assert_eq!(breaks.len(), k + 1);

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(Classified { breaks, sorted })
}
