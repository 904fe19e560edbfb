//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Sliding-window median filter (spec §4.2). Deliberately returns the
//! middle stored element rather than averaging the two central values on an
//! even-sized buffered window, to preserve sharp edges.

use std::collections::VecDeque;

use crate::error::{DspError, DspResult};
use crate::filters::StreamFilter;

#[derive(Clone, Debug)]
pub struct MedianFilter {
    window_size: usize,
    history: VecDeque<f64>,
}

impl MedianFilter {
    pub fn new(window_size: usize) -> DspResult<Self> {
        if window_size == 0 {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "median filter window_size must be > 0",
            ));
        }
        Ok(Self {
            window_size,
            history: VecDeque::with_capacity(window_size),
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

impl StreamFilter for MedianFilter {
    fn process(&mut self, sample: f64) -> f64 {
        if self.history.len() < self.window_size {
            self.history.push_back(sample);
        } else {
            self.history.pop_front();
            self.history.push_back(sample);
        }

        let mut sorted: Vec<f64> = self.history.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let n = sorted.len();
        sorted[(n - 1) / 2]
    }

    fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_window() {
        assert!(MedianFilter::new(0).is_err());
    }

    /// Median symmetry / edge preservation (spec §8, scenario 3): window
    /// 5, step input `[0,0,0,0,0,1,1,1,1,1]`, output[5] == 0, output[7] == 1.
    #[test]
    fn edge_preservation_scenario() {
        let mut f = MedianFilter::new(5).unwrap();
        let input = [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let output = f.process_array(&input);
        assert_eq!(output[5], 0.0);
        assert_eq!(output[7], 1.0);
    }

    #[test]
    fn full_window_monotonic_input_returns_middle_element() {
        let mut f = MedianFilter::new(5).unwrap();
        let input = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = f.process_array(&input);
        assert_eq!(*out.last().unwrap(), 3.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut f = MedianFilter::new(3).unwrap();
        f.process_array(&[1.0, 2.0, 3.0]);
        f.reset();
        assert_eq!(f.process(9.0), 9.0);
    }
}
