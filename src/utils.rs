/// Mean of `values` over the instances in `subset`, `None` when the subset is empty.
#[inline]
pub fn subset_mean(values: &[f64], subset: &[usize]) -> Option<f64> {
    if subset.is_empty() {
        return None;
    }
    let sum: f64 = subset.iter().map(|i| values[*i]).sum();
    Some(sum / subset.len() as f64)
}

/// Sum of squared differences between `y` and `yhat` over the instances in `subset`.
#[inline]
pub fn subset_squared_error(y: &[f64], yhat: &[f64], subset: &[usize]) -> f64 {
    subset
        .iter()
        .map(|i| {
            let d = y[*i] - yhat[*i];
            d * d
        })
        .sum()
}

/// Set `yhat` to the mean of `y` over the instances in `subset`.
/// Leaves `yhat` untouched when the subset is empty.
#[inline]
pub fn assign_subset_mean(y: &[f64], yhat: &mut [f64], subset: &[usize]) {
    if let Some(mean) = subset_mean(y, subset) {
        subset.iter().for_each(|i| yhat[*i] = mean);
    }
}

#[inline]
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
