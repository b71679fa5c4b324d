/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Index of the value closest to `target` (minimum absolute difference).
///
/// Ties resolve to the first index. NaN entries never win. Returns `None`
/// for an empty input or one that holds only NaN.
pub fn closest_index<'a, I>(values: I, target: Real) -> Option<usize>
where
    I: IntoIterator<Item = &'a Real>,
{
    let mut best: Option<(usize, Real)> = None;
    for (idx, v) in values.into_iter().enumerate() {
        let diff = (v - target).abs();
        if diff.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, best_diff)| diff < best_diff) {
            best = Some((idx, diff));
        }
    }
    best.map(|(idx, _)| idx)
}
