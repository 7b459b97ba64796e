use heapless::Deque;

pub const ALTITUDE_HISTORY_LEN: usize = 10;

/// The most recent barometric altitude samples, oldest first.
#[derive(Debug, Clone)]
pub struct AltitudeHistory {
    samples: Deque<f32, ALTITUDE_HISTORY_LEN>,
}

impl AltitudeHistory {
    pub const fn new() -> Self {
        Self {
            samples: Deque::new(),
        }
    }

    /// Evicts the oldest sample once full.
    pub fn push(&mut self, altitude: f32) {
        if self.samples.is_full() {
            self.samples.pop_front();
        }
        // a slot is always free here
        self.samples.push_back(altitude).ok();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.is_full()
    }

    pub fn latest(&self) -> Option<f32> {
        self.samples.back().copied()
    }

    /// All slots oldest to newest. Slots not written yet read as zero and sit
    /// at the oldest end.
    pub fn ordered_view(&self) -> [f32; ALTITUDE_HISTORY_LEN] {
        let mut view = [0.0; ALTITUDE_HISTORY_LEN];
        let unwritten = ALTITUDE_HISTORY_LEN - self.samples.len();
        for (slot, sample) in view[unwritten..].iter_mut().zip(self.samples.iter()) {
            *slot = *sample;
        }
        view
    }

    /// Number of consecutive pairs where the altitude dropped by more than
    /// `noise_margin`.
    pub fn descending_pairs(&self, noise_margin: f32) -> usize {
        self.ordered_view()
            .windows(2)
            .filter(|pair| pair[0] - pair[1] > noise_margin)
            .count()
    }

    /// max - min of the written samples.
    pub fn spread(&self) -> Option<f32> {
        let mut samples = self.samples.iter().copied();
        let first = samples.next()?;
        let (min, max) = samples.fold((first, first), |(min, max), sample| {
            (min.min(sample), max.max(sample))
        });
        Some(max - min)
    }

    /// Moves every stored sample into a frame whose zero is `offset`.
    pub fn rebase(&mut self, offset: f32) {
        for sample in self.samples.iter_mut() {
            *sample -= offset;
        }
    }
}

impl Default for AltitudeHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    fn history_of(samples: &[f32]) -> AltitudeHistory {
        let mut history = AltitudeHistory::new();
        for sample in samples {
            history.push(*sample);
        }
        history
    }

    #[test]
    fn partially_filled_view_is_zero_padded() {
        let history = history_of(&[5.0, 6.0, 7.0]);
        assert_eq!(history.len(), 3);
        assert!(!history.is_full());
        assert_eq!(
            history.ordered_view(),
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0, 6.0, 7.0]
        );
        assert_eq!(history.latest(), Some(7.0));
    }

    #[test]
    fn wraps_keeping_most_recent_samples() {
        let samples: Vec<f32> = (0..25).map(|i| i as f32).collect();
        let history = history_of(&samples);
        assert!(history.is_full());
        assert_eq!(
            history.ordered_view(),
            [15.0, 16.0, 17.0, 18.0, 19.0, 20.0, 21.0, 22.0, 23.0, 24.0]
        );
    }

    #[test]
    fn ordered_view_does_not_mutate() {
        let history = history_of(&[1.0, 2.0]);
        let first = history.ordered_view();
        let second = history.ordered_view();
        assert_eq!(first, second);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn counts_descending_pairs_beyond_margin() {
        // 9 pairs: 8 drop by 1.0, one drops by only 0.5
        let history = history_of(&[100.0, 99.0, 98.0, 97.0, 96.0, 95.5, 94.5, 93.5, 92.5, 91.5]);
        assert_eq!(history.descending_pairs(0.5), 8);

        // rising samples never count
        let history = history_of(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        assert_eq!(history.descending_pairs(0.5), 0);
    }

    #[test]
    fn spread_and_rebase() {
        let mut history = AltitudeHistory::new();
        assert_eq!(history.spread(), None);

        history.push(300.2);
        history.push(299.8);
        history.push(300.5);
        assert_relative_eq!(history.spread().unwrap(), 0.7, epsilon = 1e-3);

        history.rebase(300.0);
        let view = history.ordered_view();
        assert_relative_eq!(view[7], 0.2, epsilon = 1e-3);
        assert_relative_eq!(view[8], -0.2, epsilon = 1e-3);
        assert_relative_eq!(view[9], 0.5, epsilon = 1e-3);
    }
}
