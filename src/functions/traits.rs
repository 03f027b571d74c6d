/// Per-bar view of the indicator catalog, as seen by genes.
///
/// Readings are already normalized to [-50, 50]. An index outside the
/// catalog reads as neutral (0).
pub trait IndicatorSource {
    fn count(&self) -> usize;

    fn normalized(&self, id: usize) -> f64;

    fn name(&self, _id: usize) -> Option<&str> {
        None
    }
}

impl IndicatorSource for [f64] {
    fn count(&self) -> usize {
        self.len()
    }

    fn normalized(&self, id: usize) -> f64 {
        self.get(id).copied().unwrap_or(0.0)
    }
}

impl IndicatorSource for Vec<f64> {
    fn count(&self) -> usize {
        self.len()
    }

    fn normalized(&self, id: usize) -> f64 {
        self.as_slice().normalized(id)
    }
}
