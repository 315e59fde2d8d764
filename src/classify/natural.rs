use crate::error::ClassifyError;

use super::BreakComputer;

/// Natural breaks from the `ckmeans` crate.
///
/// Ckmeans finds the optimal 1-D partition under the same objective as
/// Jenks (least within-class squared deviation) in `O(k * n * log n)`.
/// Each class contributes its upper bound; the dataset minimum is prepended.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalBreaks;

impl BreakComputer for NaturalBreaks {
    fn compute_breaks(&self, values: &[f64], classes: usize) -> Result<Vec<f64>, ClassifyError> {
        let nclusters = u8::try_from(classes).map_err(|_| {
            ClassifyError::Backend(format!("at most {} classes are supported", u8::MAX))
        })?;
        let clusters = ::ckmeans::ckmeans(values, nclusters)
            .map_err(|e| ClassifyError::Backend(format!("ckmeans: {e:?}")))?;
        Ok(upper_bounds(&clusters, classes))
    }
}

/// `classes + 1` boundaries from the clusters, lowest first.
///
/// Repeated values can leave fewer distinct clusters than classes; the
/// missing classes collapse onto the minimum.
fn upper_bounds(clusters: &[Vec<f64>], classes: usize) -> Vec<f64> {
    let Some(min) = clusters.iter().find_map(|c| c.first().copied()) else {
        return Vec::new();
    };
    let uppers: Vec<f64> = clusters.iter().filter_map(|c| c.last().copied()).collect();

    let mut breaks = vec![min; classes + 1 - uppers.len().min(classes)];
    breaks.extend(uppers);
    breaks
}
