use std::time::Duration;

/// The four timed phases of an atmosphere tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    GridProcessing,
    Load,
    Unload,
    Movement,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::GridProcessing,
        Phase::Load,
        Phase::Unload,
        Phase::Movement,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Phase::GridProcessing => "Atmos grid processing",
            Phase::Load => "Atmos grid load",
            Phase::Unload => "Atmos grid unload",
            Phase::Movement => "Atmos move processing",
        }
    }

    fn slot(self) -> usize {
        match self {
            Phase::GridProcessing => 0,
            Phase::Load => 1,
            Phase::Unload => 2,
            Phase::Movement => 3,
        }
    }
}

/// Smoothed phase durations in nanoseconds.
///
/// Each sample is folded in as `(old + sample) / 2`: recent ticks dominate
/// while a single slow tick only moves the value halfway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimings {
    nanos: [u64; 4],
}

impl PhaseTimings {
    pub fn record(&mut self, phase: Phase, sample: Duration) {
        let sample = u64::try_from(sample.as_nanos()).unwrap_or(u64::MAX);
        let slot = &mut self.nanos[phase.slot()];
        *slot = (*slot / 2).saturating_add(sample / 2) + (*slot % 2 + sample % 2) / 2;
    }

    pub fn nanos(&self, phase: Phase) -> u64 {
        self.nanos[phase.slot()]
    }

    pub fn millis(&self, phase: Phase) -> f64 {
        self.nanos(phase) as f64 / 1_000_000.0
    }

    pub fn reset(&mut self) {
        self.nanos = [0; 4];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_halves_towards_sample() {
        let mut timings = PhaseTimings::default();
        timings.record(Phase::Load, Duration::from_nanos(1000));
        assert_eq!(timings.nanos(Phase::Load), 500);

        timings.record(Phase::Load, Duration::from_nanos(1000));
        assert_eq!(timings.nanos(Phase::Load), 750);

        timings.record(Phase::Load, Duration::from_nanos(250));
        assert_eq!(timings.nanos(Phase::Load), 500);
    }

    #[test]
    fn test_record_matches_plain_average_for_odd_values() {
        let mut timings = PhaseTimings::default();
        timings.record(Phase::Unload, Duration::from_nanos(7));
        assert_eq!(timings.nanos(Phase::Unload), 3);
        timings.record(Phase::Unload, Duration::from_nanos(9));
        assert_eq!(timings.nanos(Phase::Unload), (3 + 9) / 2);
        timings.record(Phase::Unload, Duration::from_nanos(0));
        assert_eq!(timings.nanos(Phase::Unload), 3);
    }

    #[test]
    fn test_phases_are_independent() {
        let mut timings = PhaseTimings::default();
        timings.record(Phase::Movement, Duration::from_millis(4));
        assert_eq!(timings.nanos(Phase::GridProcessing), 0);
        assert_eq!(timings.millis(Phase::Movement), 2.0);
    }

    #[test]
    fn test_huge_samples_saturate() {
        let mut timings = PhaseTimings::default();
        timings.record(Phase::GridProcessing, Duration::MAX);
        timings.record(Phase::GridProcessing, Duration::MAX);
        assert!(timings.nanos(Phase::GridProcessing) > u64::MAX / 2);
    }

    #[test]
    fn test_reset_zeroes_all_phases() {
        let mut timings = PhaseTimings::default();
        for phase in Phase::ALL {
            timings.record(phase, Duration::from_micros(10));
        }
        timings.reset();
        assert_eq!(timings, PhaseTimings::default());
    }
}
