//! Animation timing: the persisted phase offset, the wrapped frame clock,
//! and the loop state machine.
//!
//! Time is always derived from the absolute wall clock plus the phase
//! offset, never from accumulated per-frame deltas, so dropped frames or
//! compositor throttling can never cause drift or speed-up.

use rand::Rng;

/// Wrap bound for the absolute clock. Keeps the time uniform small enough
/// that single-precision trigonometry stays accurate over long uptimes.
pub const TIME_WRAP: f64 = 100_000.0;

/// Scale applied to wall-clock seconds before they reach the shader.
pub const TIME_SPEED: f64 = 0.1;

/// Upper bound (exclusive) of a freshly generated phase offset.
pub const PHASE_RANGE: f64 = 1000.0;

/// Where the per-installation phase offset lives between sessions.
///
/// The binary backs this with a TOML state file; tests use an in-memory
/// implementation.
pub trait PhaseStore {
    fn load(&self) -> Option<f64>;
    fn store(&mut self, phase: f64);
}

/// Reads the persisted phase, generating and persisting a fresh one when the
/// stored value is absent or not finite.
///
/// The phase gives each installation a distinct, stable animation offset
/// across sessions instead of restarting from time zero on every launch.
pub fn load_or_create_phase<S: PhaseStore>(store: &mut S) -> f64 {
    match store.load() {
        Some(phase) if phase.is_finite() => {
            tracing::debug!(phase, "reusing persisted animation phase");
            phase
        }
        stored => {
            if stored.is_some() {
                tracing::warn!("persisted animation phase was not finite; regenerating");
            }
            let phase = rand::thread_rng().gen_range(0.0..PHASE_RANGE);
            store.store(phase);
            tracing::debug!(phase, "generated fresh animation phase");
            phase
        }
    }
}

/// Derives the shader time value from the wall clock and the phase offset.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    phase: f64,
}

impl FrameClock {
    pub fn new(phase: f64) -> Self {
        Self { phase }
    }

    /// Wall-clock seconds plus the phase offset, before wrapping.
    fn raw_time(&self) -> f64 {
        let millis = chrono::Utc::now().timestamp_millis();
        millis as f64 * 0.001 + self.phase
    }

    /// Absolute time wrapped to [`TIME_WRAP`].
    pub fn current_time(&self) -> f64 {
        self.raw_time() % TIME_WRAP
    }

    /// Shader time for the next frame: `0.0` under reduced motion (the
    /// visual freezes), otherwise the wrapped absolute time slowed by
    /// [`TIME_SPEED`].
    pub fn tick(&self, reduced_motion: bool) -> f64 {
        if reduced_motion {
            0.0
        } else {
            self.current_time() * TIME_SPEED
        }
    }
}

/// Lifecycle of the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Rendering every frame callback and scheduling the next one.
    Running,
    /// Reduced motion: exactly one frame was rendered, nothing further is
    /// scheduled.
    Paused,
    /// The surface was lost permanently. Terminal; no reacquisition.
    Stopped,
}

/// Inputs that drive [`LoopState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopInput {
    FrameTick,
    ResizeEvent,
    ContextLostEvent,
}

impl LoopState {
    /// The loop always starts Running, even under reduced motion, so the
    /// single static frame is drawn; the first FrameTick parks it.
    pub fn new(_reduced_motion: bool) -> Self {
        Self::Running
    }

    /// Applies one input. `reduced_motion` is the preference captured at
    /// startup; it is not re-polled.
    pub fn apply(self, input: LoopInput, reduced_motion: bool) -> Self {
        match (self, input) {
            (LoopState::Stopped, _) => LoopState::Stopped,
            (_, LoopInput::ContextLostEvent) => LoopState::Stopped,
            (LoopState::Running, LoopInput::FrameTick) if reduced_motion => LoopState::Paused,
            (state, LoopInput::FrameTick) => state,
            (state, LoopInput::ResizeEvent) => state,
        }
    }

    /// Whether another frame callback should be requested.
    pub fn should_schedule(self) -> bool {
        matches!(self, LoopState::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        phase: Option<f64>,
        writes: usize,
    }

    impl PhaseStore for MemoryStore {
        fn load(&self) -> Option<f64> {
            self.phase
        }

        fn store(&mut self, phase: f64) {
            self.phase = Some(phase);
            self.writes += 1;
        }
    }

    #[test]
    fn first_run_generates_and_persists_a_phase() {
        let mut store = MemoryStore::default();
        let phase = load_or_create_phase(&mut store);
        assert!((0.0..PHASE_RANGE).contains(&phase));
        assert_eq!(store.phase, Some(phase));
        assert_eq!(store.writes, 1);
    }

    #[test]
    fn subsequent_runs_reuse_the_stored_phase() {
        let mut store = MemoryStore {
            phase: Some(123.456),
            writes: 0,
        };
        assert_eq!(load_or_create_phase(&mut store), 123.456);
        assert_eq!(store.writes, 0);
    }

    #[test]
    fn non_finite_stored_phase_is_regenerated() {
        let mut store = MemoryStore {
            phase: Some(f64::NAN),
            writes: 0,
        };
        let phase = load_or_create_phase(&mut store);
        assert!(phase.is_finite());
        assert!((0.0..PHASE_RANGE).contains(&phase));
        assert_eq!(store.writes, 1);
    }

    #[test]
    fn raw_time_is_monotonic_within_a_wrap_period() {
        let clock = FrameClock::new(42.0);
        let first = clock.raw_time();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = clock.raw_time();
        assert!(second > first);
    }

    #[test]
    fn current_time_stays_below_the_wrap_bound() {
        let clock = FrameClock::new(999.0);
        let t = clock.current_time();
        assert!((0.0..TIME_WRAP).contains(&t));
    }

    #[test]
    fn reduced_motion_tick_is_always_zero() {
        let clock = FrameClock::new(500.0);
        assert_eq!(clock.tick(true), 0.0);
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert_eq!(clock.tick(true), 0.0);
    }

    #[test]
    fn animated_tick_applies_the_speed_factor() {
        let clock = FrameClock::new(0.0);
        let t = clock.tick(false);
        let reference = clock.current_time() * TIME_SPEED;
        assert!((t - reference).abs() < 0.1);
    }

    #[test]
    fn reduced_motion_parks_after_one_frame() {
        let state = LoopState::new(true);
        assert!(state.should_schedule());
        let state = state.apply(LoopInput::FrameTick, true);
        assert_eq!(state, LoopState::Paused);
        assert!(!state.should_schedule());
        // Further ticks never resume it.
        let state = state.apply(LoopInput::FrameTick, true);
        assert_eq!(state, LoopState::Paused);
    }

    #[test]
    fn running_loop_keeps_scheduling() {
        let mut state = LoopState::new(false);
        for _ in 0..3 {
            state = state.apply(LoopInput::FrameTick, false);
            assert_eq!(state, LoopState::Running);
            assert!(state.should_schedule());
        }
    }

    #[test]
    fn resize_does_not_change_the_state() {
        assert_eq!(
            LoopState::Running.apply(LoopInput::ResizeEvent, false),
            LoopState::Running
        );
        assert_eq!(
            LoopState::Paused.apply(LoopInput::ResizeEvent, true),
            LoopState::Paused
        );
    }

    #[test]
    fn context_loss_is_terminal() {
        let state = LoopState::Running.apply(LoopInput::ContextLostEvent, false);
        assert_eq!(state, LoopState::Stopped);
        assert!(!state.should_schedule());
        assert_eq!(
            state.apply(LoopInput::FrameTick, false),
            LoopState::Stopped
        );
        assert_eq!(
            state.apply(LoopInput::ResizeEvent, false),
            LoopState::Stopped
        );
    }
}
