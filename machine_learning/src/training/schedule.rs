use std::num::NonZeroUsize;

/// Defines which windows get reported.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    every: NonZeroUsize,
}

impl Schedule {
    pub fn new(every: NonZeroUsize) -> Self {
        Self { every }
    }

    /// Returns true for the first window of an epoch and every `every` windows after it.
    #[inline]
    pub fn should_report(&self, window: usize) -> bool {
        window % self.every.get() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_schedule() {
        let s = Schedule::new(NonZeroUsize::new(3).unwrap());
        assert!(s.should_report(0));
        assert!(!s.should_report(1));
        assert!(!s.should_report(2));
        assert!(s.should_report(3));
        assert!(!s.should_report(4));
        assert!(s.should_report(6));
    }
}
