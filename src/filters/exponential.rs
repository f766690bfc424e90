use super::SignalFilter;

/// Exponential smoothing filter
///
/// `value = value * (1 - alpha) + sample * alpha`, seeded by the first sample.
#[derive(Debug, Clone)]
pub struct ExponentialFilter {
    alpha: f64,
    value: Option<f64>,
}

impl ExponentialFilter {
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, value: None }
    }
}

impl SignalFilter for ExponentialFilter {
    fn apply(&mut self, sample: f64) -> f64 {
        let filtered = match self.value {
            Some(last) => last * (1.0 - self.alpha) + sample * self.alpha,
            None => sample,
        };
        self.value = Some(filtered);
        filtered
    }

    fn current(&self) -> Option<f64> {
        self.value
    }

    fn snap(&mut self, sample: f64) {
        self.value = Some(sample);
    }

    fn reset(&mut self) {
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_filter() {
        let mut filter = ExponentialFilter::new(0.5);

        // First value passes through
        assert_eq!(filter.apply(10.0), 10.0);

        // Second value is smoothed
        assert_eq!(filter.apply(20.0), 15.0); // 0.5 * 10 + 0.5 * 20
    }

    #[test]
    fn test_alpha_bounds() {
        // High alpha = less smoothing
        let mut filter1 = ExponentialFilter::new(0.9);
        filter1.apply(10.0);
        assert!((filter1.apply(20.0) - 19.0).abs() < 0.001);

        // Low alpha = more smoothing
        let mut filter2 = ExponentialFilter::new(0.1);
        filter2.apply(10.0);
        assert!((filter2.apply(20.0) - 11.0).abs() < 0.001);
    }

    #[test]
    fn test_reset_and_snap() {
        let mut filter = ExponentialFilter::new(0.3);
        filter.apply(0.4);
        filter.apply(0.6);
        filter.reset();
        assert!(filter.current().is_none());
        assert_eq!(filter.apply(0.55), 0.55);

        filter.snap(0.9);
        assert_eq!(filter.current(), Some(0.9));
    }

    #[test]
    #[should_panic(expected = "Alpha must be in (0, 1]")]
    fn test_zero_alpha() {
        let _ = ExponentialFilter::new(0.0);
    }
}
