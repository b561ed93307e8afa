use std::time::Duration;

use bevy::prelude::*;

use crate::AtmosSettings;
use crate::atmosphere::Atmosphere;
use crate::timing::{Phase, PhaseTimings};

/// Human-readable phase timings, one line per phase.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct AtmosPerfText(pub String);

impl AtmosPerfText {
    /// Rebuilds the text from the latest smoothed timings.
    pub fn refresh(&mut self, timings: &PhaseTimings) {
        self.0 = Phase::ALL
            .iter()
            .map(|&phase| format!("{}: {:.3} ms", phase.label(), timings.millis(phase)))
            .collect::<Vec<_>>()
            .join("\n");
    }
}

/// Throttles [`AtmosPerfText`] refreshes.
#[derive(Resource)]
pub struct PerfRefreshTimer(pub Timer);

impl PerfRefreshTimer {
    pub fn from_seconds(secs: f32) -> Self {
        Self(Timer::from_seconds(secs, TimerMode::Repeating))
    }
}

impl Default for PerfRefreshTimer {
    fn default() -> Self {
        Self::from_seconds(crate::DEFAULT_PERF_REFRESH_SECS)
    }
}

pub(crate) fn refresh_perf_text(
    time: Res<Time>,
    settings: Res<AtmosSettings>,
    mut timer: ResMut<PerfRefreshTimer>,
    atmosphere: Res<Atmosphere>,
    mut text: ResMut<AtmosPerfText>,
) {
    if settings.is_changed() {
        let secs = settings.validated().perf_refresh_secs;
        timer.0.set_duration(Duration::from_secs_f32(secs));
    }
    if !timer.0.tick(time.delta()).just_finished() {
        return;
    }

    text.refresh(atmosphere.timings());
    debug!("{}", text.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_lists_every_phase_in_order() {
        let mut timings = PhaseTimings::default();
        timings.record(Phase::GridProcessing, Duration::from_micros(3000));
        timings.record(Phase::Movement, Duration::from_micros(500));

        let mut text = AtmosPerfText::default();
        text.refresh(&timings);

        assert_eq!(
            text.0,
            "Atmos grid processing: 1.500 ms\n\
             Atmos grid load: 0.000 ms\n\
             Atmos grid unload: 0.000 ms\n\
             Atmos move processing: 0.250 ms"
        );
    }

    #[test]
    fn test_refresh_replaces_previous_text() {
        let mut text = AtmosPerfText("stale".to_string());
        text.refresh(&PhaseTimings::default());
        assert!(!text.0.contains("stale"));
        assert_eq!(text.0.lines().count(), 4);
    }
}
