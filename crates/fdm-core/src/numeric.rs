/// True if every element is finite and strictly greater than its predecessor.
pub fn is_strictly_increasing(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite()) && values.windows(2).all(|w| w[0] < w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_increasing_rejects_repeats_and_nan() {
        assert!(is_strictly_increasing(&[-1.0, 0.0, 2.5]));
        assert!(is_strictly_increasing(&[3.0]));
        assert!(!is_strictly_increasing(&[0.0, 0.0, 1.0]));
        assert!(!is_strictly_increasing(&[0.0, f64::NAN]));
    }
}
