//! Series primitives used by the feature engine.
//!
//! Every function is forward-only: the value at index `i` depends on inputs
//! `0..=i` and nothing later. Windows that have not yet seen enough
//! observations yield `None` instead of failing.

pub mod ema;
pub mod returns;
pub mod rolling;

/// A rolling window length together with the minimum number of
/// observations required before a value is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub size: usize,
    pub min_periods: usize,
}

impl Window {
    pub const fn new(size: usize, min_periods: usize) -> Self {
        Window { size, min_periods }
    }

    /// Start index of the window that ends at `i`.
    pub fn start(&self, i: usize) -> usize {
        (i + 1).saturating_sub(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_start_clamps_at_zero() {
        let w = Window::new(20, 10);
        assert_eq!(w.start(0), 0);
        assert_eq!(w.start(19), 0);
        assert_eq!(w.start(20), 1);
    }
}
