use crate::error::EmptyAccumulator;

/// Running count and mean of a stream of observations
///
/// Uses the incremental update `mean += (x - mean) / (count + 1)` so no
/// samples are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Averager {
    count: usize,
    mean: f64,
}

impl Averager {
    pub fn new() -> Averager {
        Averager::default()
    }

    pub fn record(&mut self, value: f64) {
        self.mean += (value - self.mean) / (self.count + 1) as f64;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> Result<f64, EmptyAccumulator> {
        if self.count == 0 {
            return Err(EmptyAccumulator);
        }
        Ok(self.mean)
    }
}
