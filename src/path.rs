//! Path representation and deterministic playback.
//!
//! A [`PathSegment`] is the immutable record of one march; a
//! [`TrajectoryPrediction`] chains segments across bounces. Playback
//! interpolates the recorded samples by time, independent of whatever
//! integrator the host physics engine runs.

use serde::{Deserialize, Serialize};

use crate::types::{Impact, KinematicState, Vector};

/// One marched stretch of flight, ending at an impact or at exhaustion of
/// the distance budget.
///
/// Invariants: `steps` is non-empty, starts at time zero, is ordered by
/// time, and its last sample's time equals [`PathSegment::flight_time`].
/// When an impact is present the last sample sits at the impact position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathSegment<V, O> {
    steps: Vec<KinematicState<V>>,
    distance: f32,
    impact: Option<Impact<V, O>>,
}

impl<V: Vector, O: Copy> PathSegment<V, O> {
    /// The canonical empty segment: a single sample at `position`, no
    /// distance, no time, no impact.
    pub fn empty(position: V) -> Self {
        Self {
            steps: vec![KinematicState::launch(position, V::ZERO)],
            distance: 0.0,
            impact: None,
        }
    }

    pub(crate) fn from_steps(
        steps: Vec<KinematicState<V>>,
        distance: f32,
        impact: Option<Impact<V, O>>,
    ) -> Self {
        debug_assert!(!steps.is_empty());
        debug_assert!(steps.windows(2).all(|pair| pair[0].time <= pair[1].time));
        Self {
            steps,
            distance,
            impact,
        }
    }

    /// Recorded samples, launch first.
    pub fn steps(&self) -> &[KinematicState<V>] {
        &self.steps
    }

    /// Arc length travelled.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Time from launch to the last sample.
    pub fn flight_time(&self) -> f32 {
        self.end_state().time
    }

    /// Alias of [`PathSegment::flight_time`].
    pub fn duration(&self) -> f32 {
        self.flight_time()
    }

    /// The impact that ended this segment, if any.
    pub fn impact(&self) -> Option<&Impact<V, O>> {
        self.impact.as_ref()
    }

    /// Launch sample.
    pub fn start_state(&self) -> KinematicState<V> {
        self.steps[0]
    }

    /// Last recorded sample.
    pub fn end_state(&self) -> KinematicState<V> {
        self.steps[self.steps.len() - 1]
    }

    /// Whether this is the canonical empty segment.
    pub fn is_empty(&self) -> bool {
        self.steps.len() == 1 && self.impact.is_none()
    }

    /// Interpolate the recorded samples at `time` (segment-local).
    ///
    /// Times outside `[0, flight_time]` clamp to the first/last sample.
    pub fn lerp(&self, time: f32) -> KinematicState<V> {
        let first = self.start_state();
        let last = self.end_state();
        if time.is_nan() || time <= first.time {
            return first;
        }
        if time >= last.time {
            return last;
        }

        let upper = self.steps.partition_point(|step| step.time <= time);
        let before = self.steps[upper - 1];
        let after = self.steps[upper];
        let span = after.time - before.time;
        let fraction = if span > 0.0 {
            (time - before.time) / span
        } else {
            0.0
        };

        KinematicState {
            position: before.position.lerp(after.position, fraction),
            velocity: before.velocity.lerp(after.velocity, fraction),
            time,
        }
    }
}

/// An ordered bounce chain of segments.
///
/// Segment `i + 1` starts at segment `i`'s impact position with the
/// reflected, damped velocity. Rebuilt wholesale per prediction request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPrediction<V, O> {
    segments: Vec<PathSegment<V, O>>,
}

impl<V, O> Default for TrajectoryPrediction<V, O> {
    fn default() -> Self {
        Self {
            segments: Vec::new(),
        }
    }
}

/// Where a global playback time lands inside a prediction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSample<V> {
    /// Interpolated state; `time` is the global playback time
    pub state: KinematicState<V>,
    /// Index of the segment containing the sample
    pub segment: usize,
    /// Whether the sample lies at or past the end of the prediction
    pub finished: bool,
}

impl<V: Vector, O: Copy> TrajectoryPrediction<V, O> {
    /// Wrap already-chained segments.
    pub fn new(segments: Vec<PathSegment<V, O>>) -> Self {
        Self { segments }
    }

    /// All segments in chain order.
    pub fn segments(&self) -> &[PathSegment<V, O>] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the prediction holds no segment at all.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total flight time across all segments.
    pub fn duration(&self) -> f32 {
        self.segments.iter().map(PathSegment::flight_time).sum()
    }

    /// Total arc length across all segments.
    pub fn distance(&self) -> f32 {
        self.segments.iter().map(PathSegment::distance).sum()
    }

    /// Global time at which segment `index` starts.
    pub fn segment_start_time(&self, index: usize) -> f32 {
        self.segments[..index.min(self.segments.len())]
            .iter()
            .map(PathSegment::flight_time)
            .sum()
    }

    /// Index of the segment whose time window contains `elapsed`, or the
    /// last segment once playback has run past the end.
    pub fn segment_at(&self, elapsed: f32) -> Option<usize> {
        self.sample(elapsed).map(|sample| sample.segment)
    }

    /// Last recorded state of the last segment.
    pub fn final_state(&self) -> Option<KinematicState<V>> {
        self.segments.last().map(PathSegment::end_state)
    }

    /// Every recorded position in chain order, for drawing.
    pub fn points(&self) -> impl Iterator<Item = V> + '_ {
        self.segments
            .iter()
            .flat_map(|segment| segment.steps().iter().map(|step| step.position))
    }

    /// Interpolated state at global playback time `elapsed`.
    ///
    /// Walks cumulative segment durations and delegates to the owning
    /// segment's [`PathSegment::lerp`]. Pure: repeated calls with the same
    /// time return the same sample.
    pub fn sample(&self, elapsed: f32) -> Option<PathSample<V>> {
        let last_index = self.segments.len().checked_sub(1)?;
        let elapsed = elapsed.max(0.0);

        let mut segment_start = 0.0;
        for (index, segment) in self.segments.iter().enumerate() {
            let segment_end = segment_start + segment.flight_time();
            if elapsed < segment_end {
                let mut state = segment.lerp(elapsed - segment_start);
                state.time = elapsed;
                return Some(PathSample {
                    state,
                    segment: index,
                    finished: false,
                });
            }
            segment_start = segment_end;
        }

        let mut state = self.segments[last_index].end_state();
        state.time = segment_start;
        Some(PathSample {
            state,
            segment: last_index,
            finished: true,
        })
    }
}

/// A bounce reached during playback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImpactNotice<V, O> {
    /// Obstacle that was hit
    pub obstacle: O,
    /// Impact position
    pub position: V,
    /// Incoming velocity at the impact
    pub velocity: V,
    /// Global playback time of the impact
    pub time: f32,
    /// Segment that ended with this impact
    pub segment: usize,
}

/// Result of one [`PathPlayer::advance`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackFrame<V, O> {
    /// Interpolated state at the requested time
    pub state: KinematicState<V>,
    /// Segment containing `state`
    pub segment: usize,
    /// Bounces reached since the previous call, in order
    pub impacts: Vec<ImpactNotice<V, O>>,
    /// Terminal state once playback has reached the end of the path
    pub completed: Option<KinematicState<V>>,
}

/// Replays a [`TrajectoryPrediction`] against accumulated wall time.
///
/// Impact notices are queued per bounce and released exactly once, when
/// playback actually reaches the impact time, decoupled from when the
/// prediction was computed.
#[derive(Clone, Debug)]
pub struct PathPlayer<V, O> {
    prediction: TrajectoryPrediction<V, O>,
    next_impact: usize,
}

impl<V: Vector, O: Copy> PathPlayer<V, O> {
    /// Start playback of `prediction` from its beginning.
    pub fn new(prediction: TrajectoryPrediction<V, O>) -> Self {
        Self {
            prediction,
            next_impact: 0,
        }
    }

    /// The prediction being replayed.
    pub fn prediction(&self) -> &TrajectoryPrediction<V, O> {
        &self.prediction
    }

    /// Whether every queued impact has been released.
    pub fn impacts_drained(&self) -> bool {
        self.next_impact >= self.prediction.len()
    }

    /// Pure sample at `elapsed`, without releasing impacts.
    pub fn sample(&self, elapsed: f32) -> Option<PathSample<V>> {
        self.prediction.sample(elapsed)
    }

    /// Move playback to `elapsed`, releasing every impact whose time has
    /// been reached and reporting completion with the exact terminal
    /// state once the whole path has been played.
    ///
    /// Returns `None` for a prediction without segments.
    pub fn advance(&mut self, elapsed: f32) -> Option<PlaybackFrame<V, O>> {
        let sample = self.prediction.sample(elapsed)?;

        let mut impacts = Vec::new();
        let mut segment_end = self.prediction.segment_start_time(self.next_impact);
        while self.next_impact < self.prediction.len() {
            let segment = &self.prediction.segments[self.next_impact];
            segment_end += segment.flight_time();
            if elapsed < segment_end {
                break;
            }
            if let Some(impact) = segment.impact() {
                let end = segment.end_state();
                impacts.push(ImpactNotice {
                    obstacle: impact.obstacle,
                    position: impact.position,
                    velocity: end.velocity,
                    time: segment_end,
                    segment: self.next_impact,
                });
            }
            self.next_impact += 1;
        }

        Some(PlaybackFrame {
            state: sample.state,
            segment: sample.segment,
            impacts,
            completed: sample.finished.then_some(sample.state),
        })
    }
}
