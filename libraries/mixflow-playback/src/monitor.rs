//! Segment skip monitor
//!
//! Watches playback position against a track's skip segments and decides
//! when to seek. Scheduling is dynamic: checks land just before the next
//! segment instead of on a fixed interval, bounding trigger latency
//! without busy polling.

use mixflow_core::{normalize_segments, SkipSegment};
use std::time::Duration;

/// How far before a segment's start its detection window opens
const EARLY_WINDOW_MS: u64 = 500;

/// Fire-time staleness guard: do not seek while still more than this far
/// ahead of the segment start (delayed callbacks can land early)
const FIRE_GUARD_MS: u64 = 100;

/// Upper bound on the delay to the next check while segments remain ahead
const MAX_POLL: Duration = Duration::from_millis(1000);

/// Cadence once no unvisited segment is ahead (covers backward seeks)
const IDLE_POLL: Duration = Duration::from_millis(2000);

/// Outcome of a monitor check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorAction {
    /// Seek to this position (a segment fired)
    Seek { to_ms: u64, category: String },

    /// Nothing to do; check again after this delay
    Poll(Duration),
}

/// Per-track skip segment watcher
///
/// Re-armed whenever the active track changes. Visited segments never
/// re-fire, even if the user seeks back into them; once every segment has
/// been visited the monitor keeps polling at a slow cadence.
#[derive(Debug, Clone, Default)]
pub struct SegmentMonitor {
    segments: Vec<SkipSegment>,
    visited: Vec<bool>,
}

impl SegmentMonitor {
    /// Create a disarmed monitor (no segments)
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new segment list and clear the visited set
    ///
    /// The list is normalized defensively; upstream does not guarantee
    /// ordering or non-overlap.
    pub fn arm(&mut self, segments: &[SkipSegment]) {
        self.segments = normalize_segments(segments.to_vec());
        self.visited = vec![false; self.segments.len()];
    }

    /// Whether the monitor has no segments to watch
    pub fn is_disabled(&self) -> bool {
        self.segments.is_empty()
    }

    /// Run one check against the current position
    ///
    /// Fires the earliest unvisited segment whose window
    /// `[start - 500ms, end)` contains the position, provided the position
    /// has actually reached `start - 100ms` (the fire-time drift guard).
    /// Otherwise schedules the next check relative to the nearest segment
    /// still ahead.
    pub fn check(&mut self, position_ms: u64) -> MonitorAction {
        for (i, seg) in self.segments.iter().enumerate() {
            if self.visited[i] {
                continue;
            }

            let window_open = seg.start_ms.saturating_sub(EARLY_WINDOW_MS);
            if position_ms >= window_open && position_ms < seg.end_ms {
                if position_ms + FIRE_GUARD_MS >= seg.start_ms {
                    self.visited[i] = true;
                    return MonitorAction::Seek {
                        to_ms: seg.end_ms,
                        category: seg.category.clone(),
                    };
                }
                // Inside the wide window but ahead of the guard; fall
                // through to schedule a near-term re-check.
                break;
            }
        }

        MonitorAction::Poll(self.next_delay(position_ms))
    }

    /// Delay until the next check should run, given the current position
    pub fn next_delay(&self, position_ms: u64) -> Duration {
        let mut nearest: Option<u64> = None;
        for (i, seg) in self.segments.iter().enumerate() {
            if self.visited[i] || seg.start_ms <= position_ms {
                continue;
            }
            let distance = seg.start_ms - position_ms;
            nearest = Some(nearest.map_or(distance, |d: u64| d.min(distance)));
        }

        match nearest {
            Some(distance) => Duration::from_millis(distance).min(MAX_POLL),
            None => IDLE_POLL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start_ms: u64, end_ms: u64, category: &str) -> SkipSegment {
        SkipSegment {
            start_ms,
            end_ms,
            category: category.to_string(),
        }
    }

    fn armed(segments: &[SkipSegment]) -> SegmentMonitor {
        let mut monitor = SegmentMonitor::new();
        monitor.arm(segments);
        monitor
    }

    #[test]
    fn disarmed_monitor_idles() {
        let mut monitor = SegmentMonitor::new();
        assert!(monitor.is_disabled());
        assert_eq!(monitor.check(0), MonitorAction::Poll(IDLE_POLL));
    }

    #[test]
    fn intro_and_sponsor_scenario() {
        let mut monitor = armed(&[seg(0, 15_000, "intro"), seg(590_000, 610_000, "sponsor")]);

        // Position 0: intro fires immediately
        assert!(matches!(
            monitor.check(0),
            MonitorAction::Seek { to_ms: 15_000, .. }
        ));

        // After the seek, polling is bounded by MAX_POLL until the sponsor
        assert_eq!(monitor.next_delay(15_000), MAX_POLL);
        assert_eq!(
            monitor.check(500_000),
            MonitorAction::Poll(Duration::from_millis(1000))
        );

        // Closing in: delay shrinks to the actual distance
        assert_eq!(
            monitor.check(589_700),
            MonitorAction::Poll(Duration::from_millis(300))
        );

        // At the sponsor start it fires
        assert!(matches!(
            monitor.check(590_000),
            MonitorAction::Seek { to_ms: 610_000, .. }
        ));

        // Manual seek back to 300000: nothing re-fires, slow cadence
        assert_eq!(monitor.check(300_000), MonitorAction::Poll(IDLE_POLL));
    }

    #[test]
    fn visited_segment_never_refires() {
        let mut monitor = armed(&[seg(10_000, 20_000, "sponsor")]);

        assert!(matches!(
            monitor.check(10_000),
            MonitorAction::Seek { to_ms: 20_000, .. }
        ));

        // Re-entering the window after a backward seek does nothing
        assert!(matches!(monitor.check(12_000), MonitorAction::Poll(_)));
        assert!(matches!(monitor.check(9_800), MonitorAction::Poll(_)));
    }

    #[test]
    fn fire_guard_blocks_early_callbacks() {
        let mut monitor = armed(&[seg(10_000, 20_000, "sponsor")]);

        // Inside the wide window (start - 500) but ahead of the guard
        // (start - 100): no seek, re-check soon.
        assert_eq!(
            monitor.check(9_600),
            MonitorAction::Poll(Duration::from_millis(400))
        );

        // At the guard boundary the segment fires
        assert!(matches!(
            monitor.check(9_900),
            MonitorAction::Seek { to_ms: 20_000, .. }
        ));
    }

    #[test]
    fn fires_mid_segment_after_inward_seek() {
        let mut monitor = armed(&[seg(10_000, 20_000, "sponsor")]);

        // A user seek landed inside the segment; skip to its end
        assert!(matches!(
            monitor.check(15_000),
            MonitorAction::Seek { to_ms: 20_000, .. }
        ));
    }

    #[test]
    fn rearm_clears_visited() {
        let mut monitor = armed(&[seg(0, 5_000, "intro")]);
        assert!(matches!(
            monitor.check(0),
            MonitorAction::Seek { to_ms: 5_000, .. }
        ));

        monitor.arm(&[seg(0, 5_000, "intro")]);
        assert!(matches!(
            monitor.check(0),
            MonitorAction::Seek { to_ms: 5_000, .. }
        ));
    }

    #[test]
    fn overlapping_input_is_merged_before_watching() {
        let mut monitor = armed(&[seg(5_000, 9_000, "sponsor"), seg(8_000, 12_000, "selfpromo")]);

        // One merged segment; a single seek covers both ranges
        assert!(matches!(
            monitor.check(5_000),
            MonitorAction::Seek { to_ms: 12_000, .. }
        ));
        assert_eq!(monitor.check(8_500), MonitorAction::Poll(IDLE_POLL));
    }
}
