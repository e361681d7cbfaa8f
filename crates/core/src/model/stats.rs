/// Whole-number percentage of `part` over `whole`, rounded half up.
///
/// Returns 0 when `whole` is 0.
#[must_use]
pub fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = u64::from(part.min(whole));
    let whole = u64::from(whole);
    let rounded = (part * 200 + whole) / (whole * 2);
    u32::try_from(rounded).unwrap_or(100)
}

/// Ephemeral counters for one practice run.
///
/// Reset whenever a run starts and dropped when it ends; only the derived
/// accuracy leaves the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    correct: u32,
    total: u32,
}

impl SessionStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one judged item.
    pub fn record(&mut self, was_correct: bool) {
        self.total = self.total.saturating_add(1);
        if was_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Accuracy for the run as a rounded whole percent (0 for an empty run).
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        percent(self.correct, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(5, 5), 100);
    }

    #[test]
    fn percent_of_nothing_is_zero() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(SessionStats::new().accuracy_percent(), 0);
    }

    #[test]
    fn stats_count_correct_and_total() {
        let mut stats = SessionStats::new();
        stats.record(false);
        stats.record(true);
        stats.record(false);
        assert_eq!(stats.correct(), 1);
        assert_eq!(stats.total(), 3);
        assert_eq!(stats.accuracy_percent(), 33);
    }
}
