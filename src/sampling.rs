/// State that accumulates samples over frames and must restart when the light set changes.
pub trait TemporalAccumulation {
    fn reset(&mut self);
}

/// Progressive sample counter.
#[derive(Debug, Clone, Default)]
pub struct Sampling {
    sample: u64,
    reset_count: u64,
}

impl Sampling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances to the next sample. Call once per rendered frame.
    pub fn step(&mut self) {
        self.sample += 1;
    }

    /// Samples accumulated since the last reset.
    pub fn sample_index(&self) -> u64 {
        self.sample
    }

    pub fn is_reset(&self) -> bool {
        self.sample == 0
    }

    pub fn reset_count(&self) -> u64 {
        self.reset_count
    }
}

impl TemporalAccumulation for Sampling {
    fn reset(&mut self) {
        log::debug!("Sampling reset after {} samples", self.sample);
        self.sample = 0;
        self.reset_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restarts_accumulation() {
        let mut sampling = Sampling::new();
        sampling.step();
        sampling.step();
        assert_eq!(sampling.sample_index(), 2);
        assert!(!sampling.is_reset());

        sampling.reset();
        assert!(sampling.is_reset());
        assert_eq!(sampling.reset_count(), 1);
    }
}
