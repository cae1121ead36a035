use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use anyhow::Result;
use log::debug;

/// Source of monotonic scene time in seconds.
pub trait TimeSource {
    fn elapsed(&self) -> f32;
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl TimeSource for SystemClock {
    fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

/// Clock sample taken once at the start of a tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    elapsed: f32,
    frame: u64,
}

impl FrameTime {
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Raised on teardown; the loop checks it before scheduling another frame.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The per-frame work, called in this order on every tick.
pub trait FrameHandler {
    fn update_time(&mut self, time: FrameTime);
    fn update_controls(&mut self);
    fn render(&mut self) -> Result<()>;
}

pub struct FrameLoop<T = SystemClock> {
    clock: T,
    stop: StopHandle,
    last_elapsed: f32,
    frames: u64,
}

impl<T: TimeSource> FrameLoop<T> {
    pub fn new(clock: T) -> Self {
        Self {
            clock,
            stop: StopHandle::default(),
            last_elapsed: 0.,
            frames: 0,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> LoopState {
        if self.stop.is_stopped() {
            LoopState::Stopped
        } else {
            LoopState::Running
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn sample(&mut self) -> FrameTime {
        // Never hand out a time earlier than the previous frame's.
        let elapsed = self.clock.elapsed().max(self.last_elapsed);
        self.last_elapsed = elapsed;
        let time = FrameTime {
            elapsed,
            frame: self.frames,
        };
        self.frames += 1;
        time
    }

    /// Runs one frame. The returned state tells the host whether to request another.
    pub fn tick<H>(&mut self, handler: &mut H) -> Result<LoopState>
    where
        H: FrameHandler + ?Sized,
    {
        if self.stop.is_stopped() {
            return Ok(LoopState::Stopped);
        }

        let time = self.sample();
        debug!("frame {} at {:.3}s", time.frame, time.elapsed);

        handler.update_time(time);
        handler.update_controls();
        handler.render()?;

        Ok(self.state())
    }

    /// Ticks until `max_frames` have run or the stop handle is raised.
    #[cfg(test)]
    pub fn run_for<H>(&mut self, max_frames: u64, handler: &mut H) -> Result<u64>
    where
        H: FrameHandler + ?Sized,
    {
        let mut ran = 0;
        while ran < max_frames && self.state() == LoopState::Running {
            self.tick(handler)?;
            ran += 1;
        }
        debug!("Frame loop ran {} frames", ran);
        Ok(ran)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use anyhow::bail;

    use super::*;
    use crate::{config::Config, entity::Scene, window::Viewport};

    /// Advances by `step` seconds every time it is read.
    struct SteppingClock {
        now: Cell<f32>,
        step: f32,
    }

    impl SteppingClock {
        fn new(step: f32) -> Self {
            Self {
                now: Cell::new(0.),
                step,
            }
        }
    }

    impl TimeSource for SteppingClock {
        fn elapsed(&self) -> f32 {
            let now = self.now.get() + self.step;
            self.now.set(now);
            now
        }
    }

    struct ScriptedClock(Cell<usize>, Vec<f32>);

    impl TimeSource for ScriptedClock {
        fn elapsed(&self) -> f32 {
            let i = self.0.get();
            self.0.set(i + 1);
            self.1[i.min(self.1.len() - 1)]
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        times: Vec<f32>,
    }

    impl FrameHandler for Recorder {
        fn update_time(&mut self, time: FrameTime) {
            self.calls.push("time");
            self.times.push(time.elapsed());
        }

        fn update_controls(&mut self) {
            self.calls.push("controls");
        }

        fn render(&mut self) -> Result<()> {
            self.calls.push("render");
            Ok(())
        }
    }

    struct SceneHandler {
        scene: Scene,
        seen: Vec<(f32, f32)>,
    }

    impl FrameHandler for SceneHandler {
        fn update_time(&mut self, time: FrameTime) {
            self.scene.set_time(time.elapsed());
        }

        fn update_controls(&mut self) {}

        fn render(&mut self) -> Result<()> {
            self.seen
                .push((self.scene.fireflies.time, self.scene.portal.time));
            Ok(())
        }
    }

    #[test]
    fn tick_runs_steps_in_order() {
        let mut frame_loop = FrameLoop::new(SteppingClock::new(0.016));
        let mut recorder = Recorder::default();
        assert_eq!(frame_loop.tick(&mut recorder).unwrap(), LoopState::Running);
        assert_eq!(recorder.calls, ["time", "controls", "render"]);
    }

    #[test]
    fn clock_is_sampled_once_per_tick() {
        let mut frame_loop = FrameLoop::new(SteppingClock::new(0.5));
        let mut handler = SceneHandler {
            scene: Scene::new(&Config::default(), Viewport::new(800., 600., 1.)),
            seen: Vec::new(),
        };
        frame_loop.run_for(3, &mut handler).unwrap();
        assert_eq!(handler.seen, [(0.5, 0.5), (1.0, 1.0), (1.5, 1.5)]);
    }

    #[test]
    fn elapsed_never_decreases() {
        let clock = ScriptedClock(Cell::new(0), vec![1.0, 2.0, 1.5, 3.0, 0.0, 3.5]);
        let mut frame_loop = FrameLoop::new(clock);
        let mut recorder = Recorder::default();
        frame_loop.run_for(6, &mut recorder).unwrap();
        assert_eq!(recorder.times, [1.0, 2.0, 2.0, 3.0, 3.0, 3.5]);
        assert!(recorder.times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn stop_handle_halts_the_loop() {
        let mut frame_loop = FrameLoop::new(SteppingClock::new(0.1));
        let stop = frame_loop.stop_handle();
        let mut recorder = Recorder::default();

        assert_eq!(frame_loop.run_for(2, &mut recorder).unwrap(), 2);
        stop.stop();
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        assert_eq!(frame_loop.tick(&mut recorder).unwrap(), LoopState::Stopped);
        assert_eq!(frame_loop.run_for(10, &mut recorder).unwrap(), 0);
        assert_eq!(recorder.times.len(), 2);
        assert_eq!(frame_loop.frames(), 2);
    }

    #[test]
    fn stop_during_frame_ends_after_it() {
        struct StopsOnRender(StopHandle, u32);

        impl FrameHandler for StopsOnRender {
            fn update_time(&mut self, _: FrameTime) {}
            fn update_controls(&mut self) {}
            fn render(&mut self) -> Result<()> {
                self.1 += 1;
                self.0.stop();
                Ok(())
            }
        }

        let mut frame_loop = FrameLoop::new(SteppingClock::new(0.1));
        let mut handler = StopsOnRender(frame_loop.stop_handle(), 0);
        assert_eq!(frame_loop.tick(&mut handler).unwrap(), LoopState::Stopped);
        assert_eq!(frame_loop.run_for(5, &mut handler).unwrap(), 0);
        assert_eq!(handler.1, 1);
    }

    #[test]
    fn render_errors_propagate() {
        struct Failing;

        impl FrameHandler for Failing {
            fn update_time(&mut self, _: FrameTime) {}
            fn update_controls(&mut self) {}
            fn render(&mut self) -> Result<()> {
                bail!("device lost")
            }
        }

        let mut frame_loop = FrameLoop::new(SteppingClock::new(0.1));
        let err = frame_loop.run_for(3, &mut Failing).unwrap_err();
        assert_eq!(err.to_string(), "device lost");
        assert_eq!(frame_loop.frames(), 1);
    }
}
