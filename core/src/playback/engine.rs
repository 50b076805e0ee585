use crate::math::interp::InterpHelper;
use crate::playback::clock::{Clock, SystemClock};
use crate::playback::interpolate::pose_at;
use crate::playback::scheduler::{RenderLoop, TickToken};
use crate::playback::trail::TrailSampler;
use crate::prelude::{AgentPose, Point, ReplayError, ReplayResult, SimulationData};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
}

/// Time-driven player for one [`SimulationData`].
///
/// The engine owns a virtual clock: while running, the current time is
/// `(now - baseline) * speed`, clamped to the timeline. Every control keeps
/// the baseline consistent so that pausing, seeking, or changing speed never
/// makes the visible position jump.
pub struct PlaybackEngine<C: Clock = SystemClock> {
    data: SimulationData,
    clock: C,
    state: PlaybackState,
    current_ms: f64,
    speed: f64,
    baseline_ms: Option<f64>,
    render_loop: RenderLoop,
    trail: TrailSampler,
}

impl PlaybackEngine<SystemClock> {
    pub fn with_system_clock(data: SimulationData) -> ReplayResult<Self> {
        Self::new(data, SystemClock::new())
    }
}

impl<C: Clock> PlaybackEngine<C> {
    /// Rejects data whose frames break the ordering or agent-set invariants.
    pub fn new(data: SimulationData, clock: C) -> ReplayResult<Self> {
        data.validate()?;
        Ok(Self {
            data,
            clock,
            state: PlaybackState::Idle,
            current_ms: 0.0,
            speed: 1.0,
            baseline_ms: None,
            render_loop: RenderLoop::new(),
            trail: TrailSampler::default(),
        })
    }

    pub fn data(&self) -> &SimulationData {
        &self.data
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn current_ms(&self) -> f64 {
        self.current_ms
    }

    pub fn duration_ms(&self) -> f64 {
        self.data.duration_ms() as f64
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn play(&mut self) {
        if self.is_running() {
            return;
        }
        if self.current_ms >= self.duration_ms() {
            self.current_ms = 0.0;
        }
        self.baseline_ms = Some(self.derive_baseline());
        self.state = PlaybackState::Running;
        debug!("play from {:.0}ms at {}x", self.current_ms, self.speed);
    }

    pub fn pause(&mut self) {
        if self.is_running() {
            self.current_ms = self.elapsed_ms();
        }
        self.stop();
    }

    /// Advances the clock while running and returns the current time. Reaching
    /// the end of the timeline stops playback.
    pub fn tick(&mut self) -> f64 {
        if self.is_running() {
            self.current_ms = self.elapsed_ms();
            if self.current_ms >= self.duration_ms() {
                debug!("playback reached end at {:.0}ms", self.current_ms);
                self.stop();
            }
        }
        self.current_ms
    }

    /// Jumps to `time_ms` (clamped) and stops. The next `play` resumes from
    /// here at the current speed.
    pub fn seek(&mut self, time_ms: f64) -> ReplayResult<()> {
        if time_ms.is_nan() {
            return Err(ReplayError::InvalidSeek(time_ms));
        }
        self.current_ms = InterpHelper::clamp_time(time_ms, self.duration_ms());
        self.stop();
        Ok(())
    }

    pub fn reset(&mut self) {
        self.current_ms = 0.0;
        self.stop();
    }

    pub fn set_speed(&mut self, speed: f64) -> ReplayResult<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ReplayError::InvalidSpeed(speed));
        }
        if self.is_running() {
            self.current_ms = self.elapsed_ms();
            self.speed = speed;
            self.baseline_ms = Some(self.derive_baseline());
        } else {
            self.speed = speed;
        }
        Ok(())
    }

    /// Pose at the current time. Does not advance the clock.
    pub fn pose(&self) -> Vec<AgentPose> {
        self.pose_at(self.current_ms)
    }

    pub fn pose_at(&self, time_ms: f64) -> Vec<AgentPose> {
        pose_at(&self.data.frames, time_ms)
    }

    /// Recent positions of every agent, ending at the current time.
    pub fn trails(&self) -> Vec<Vec<Point>> {
        self.trail.sample(&self.data.frames, self.current_ms)
    }

    /// Schedules the next repaint. Returns `None` when idle or when a tick
    /// is already in flight.
    pub fn request_tick(&mut self) -> Option<TickToken> {
        if self.is_running() {
            self.render_loop.request()
        } else {
            None
        }
    }

    /// Runs one scheduled tick. Stale or cancelled tokens are ignored and
    /// leave the engine untouched.
    pub fn complete_tick(&mut self, token: TickToken) -> bool {
        if !self.render_loop.complete(token) {
            return false;
        }
        self.tick();
        true
    }

    pub fn tick_pending(&self) -> bool {
        self.render_loop.is_pending()
    }

    fn elapsed_ms(&self) -> f64 {
        match self.baseline_ms {
            Some(baseline) => InterpHelper::clamp_time(
                (self.clock.now_ms() - baseline) * self.speed,
                self.duration_ms(),
            ),
            None => self.current_ms,
        }
    }

    fn derive_baseline(&self) -> f64 {
        self.clock.now_ms() - self.current_ms / self.speed
    }

    fn stop(&mut self) {
        self.state = PlaybackState::Idle;
        self.baseline_ms = None;
        self.render_loop.cancel();
    }
}

impl<C: Clock> Drop for PlaybackEngine<C> {
    fn drop(&mut self) {
        self.render_loop.cancel();
    }
}
