//! Lifecycle Runner: drives every script of the active scene once per frame.
//!
//! Frame order:
//! 1. `start` for scripts not yet started
//! 2. settle parked `start` futures (one poll each)
//! 3. `fixed_update` passes for accumulated fixed steps
//! 4. `update` pass, then `late_update` pass
//! 5. `on_pre_render` pass, one coordinator render, `on_post_render` pass
//!
//! Each pass visits scene scripts first, then object scripts grouped by
//! object. A `start` that returns a pending future does not hold back the
//! frame: `update` can reach a script before its `start` has resolved.

use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::FutureExt;
use scenescript_common::Viewport;
use scenescript_events::{EventBus, EventData, names};
use scenescript_render::{RenderCoordinator, RenderOutcome, SkipReason};
use scenescript_scene::{ScriptHandle, StartFuture, StartOutcome};
use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::perf::PerformanceSampler;
use crate::registry::SceneRegistry;

struct PendingStart {
    script: ScriptHandle,
    future: StartFuture,
}

fn poll_once(future: &mut StartFuture) -> Poll<anyhow::Result<()>> {
    let waker = futures::task::noop_waker();
    let mut cx = Context::from_waker(&waker);
    future.poll_unpin(&mut cx)
}

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Frames stepped so far, including this one.
    pub frame: u64,
    /// Scripts visited this frame.
    pub scripts: usize,
    /// Scripts whose `start` ran this frame.
    pub started: usize,
    pub fixed_steps: u32,
    /// `start` futures still pending after this frame.
    pub pending_starts: usize,
    pub render: RenderOutcome,
}

/// Per-frame driver for the active scene's scripts.
pub struct LifecycleRunner {
    fixed_step: f32,
    max_fixed_steps: u32,
    accumulator: f32,
    frames: u64,
    pending: Vec<PendingStart>,
    sampler: PerformanceSampler,
    bus: Option<Rc<EventBus>>,
}

impl Default for LifecycleRunner {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl LifecycleRunner {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            fixed_step: config.fixed_step,
            max_fixed_steps: config.max_fixed_steps.max(1),
            accumulator: 0.0,
            frames: 0,
            pending: Vec::new(),
            sampler: PerformanceSampler::new(config.frame_history, config.sample_interval),
            bus: None,
        }
    }

    /// Publish performance samples and resize notifications on `bus`.
    pub fn with_event_bus(mut self, bus: Rc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pending_starts(&self) -> usize {
        self.pending.len()
    }

    pub fn fixed_step(&self) -> f32 {
        self.fixed_step
    }

    /// Step one frame of `dt` seconds.
    pub fn frame(
        &mut self,
        registry: &mut SceneRegistry,
        coordinator: &mut RenderCoordinator,
        dt: f32,
    ) -> FrameReport {
        self.frames += 1;

        let mut started = 0;
        let scripts = match registry.active_mut() {
            Some(record) => {
                let scripts = record.ordered_scripts();
                for script in &scripts {
                    if !script.is_active() || !record.started_scripts.insert(script.id()) {
                        continue;
                    }
                    started += 1;
                    self.run_start(script);
                }
                scripts
            }
            None => Vec::new(),
        };
        self.settle_pending();

        let fixed_steps = self.fixed_passes(&scripts, dt);

        for script in &scripts {
            script.update(dt);
        }
        for script in &scripts {
            script.late_update(dt);
        }

        for script in &scripts {
            script.pre_render();
        }
        let render = coordinator.render();
        if render == RenderOutcome::Skipped(SkipReason::ContextLost) {
            trace!(frame = self.frames, "frame not drawn: context lost");
        }
        for script in &scripts {
            script.post_render();
        }

        self.sample(dt);

        FrameReport {
            frame: self.frames,
            scripts: scripts.len(),
            started,
            fixed_steps,
            pending_starts: self.pending.len(),
            render,
        }
    }

    fn run_start(&mut self, script: &ScriptHandle) {
        let Some(StartOutcome::Pending(mut future)) = script.start() else {
            return;
        };
        match poll_once(&mut future) {
            Poll::Ready(result) => report_start(script, result),
            Poll::Pending => {
                debug!(script = script.label(), "start pending; frame loop continues");
                self.pending.push(PendingStart {
                    script: script.clone(),
                    future,
                });
            }
        }
    }

    /// Poll each parked start future once. Futures of detached scripts are
    /// still driven to completion; they cannot be cancelled.
    fn settle_pending(&mut self) {
        self.pending.retain_mut(|pending| match poll_once(&mut pending.future) {
            Poll::Ready(result) => {
                report_start(&pending.script, result);
                false
            }
            Poll::Pending => true,
        });
    }

    fn fixed_passes(&mut self, scripts: &[ScriptHandle], dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut steps = 0;
        while self.accumulator >= self.fixed_step && steps < self.max_fixed_steps {
            for script in scripts {
                script.fixed_update(self.fixed_step);
            }
            self.accumulator -= self.fixed_step;
            steps += 1;
        }
        if self.accumulator >= self.fixed_step {
            debug!(
                dropped = self.accumulator,
                "fixed step budget exhausted; dropping accumulated time"
            );
            self.accumulator = 0.0;
        }
        steps
    }

    fn sample(&mut self, dt: f32) {
        let Some(sample) = self.sampler.record(Duration::from_secs_f32(dt.max(0.0))) else {
            return;
        };
        trace!(fps = sample.fps, avg_ms = sample.avg_frame_ms, "performance sample");
        if let Some(bus) = &self.bus {
            bus.emit(names::PERFORMANCE_SAMPLE, &EventData::PerformanceSample(sample));
        }
    }

    /// Propagate a surface resize: cameras, device, composer, then `on_resize`
    /// on the active scene's scripts.
    pub fn resize(
        &mut self,
        registry: &mut SceneRegistry,
        coordinator: &mut RenderCoordinator,
        width: u32,
        height: u32,
    ) {
        registry.set_viewport(Viewport::new(width, height));
        coordinator.resize(width, height);
        if let Some(record) = registry.active() {
            for script in record.ordered_scripts() {
                script.resize(width, height);
            }
        }
        if let Some(bus) = &self.bus {
            bus.emit(names::VIEWPORT_RESIZED, &EventData::Resized { width, height });
        }
    }
}

fn report_start(script: &ScriptHandle, result: anyhow::Result<()>) {
    match result {
        Ok(()) if script.is_attached() => debug!(script = script.label(), "start resolved"),
        Ok(()) => debug!(script = script.label(), "start resolved after detach"),
        Err(err) => warn!(script = script.label(), error = %err, "start failed"),
    }
}

impl std::fmt::Debug for LifecycleRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleRunner")
            .field("fixed_step", &self.fixed_step)
            .field("max_fixed_steps", &self.max_fixed_steps)
            .field("accumulator", &self.accumulator)
            .field("frames", &self.frames)
            .field("pending_starts", &self.pending.len())
            .finish()
    }
}
