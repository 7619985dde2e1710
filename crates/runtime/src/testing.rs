//! Recording scripts shared by the runtime tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::poll_fn;
use scenescript_scene::{HookSet, Script, ScriptHandle, ScriptHost, StartOutcome};
use std::task::Poll;

/// Shared call log. Entries look like `"<name>.<hook>"`.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    log: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, name: &str) -> RecordingScript {
        RecordingScript {
            name: name.to_string(),
            hooks: HookSet::all(),
            log: self.log.clone(),
            fail_destroy: false,
            gate: None,
            me: None,
        }
    }

    pub fn handle(&self, name: &str) -> ScriptHandle {
        ScriptHandle::new(self.script(name))
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    /// Entries of one hook, in order.
    pub fn calls(&self, hook: &str) -> Vec<String> {
        let suffix = format!(".{hook}");
        self.log
            .borrow()
            .iter()
            .filter(|e| e.ends_with(&suffix))
            .cloned()
            .collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.log.borrow().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

pub struct RecordingScript {
    name: String,
    hooks: HookSet,
    log: Rc<RefCell<Vec<String>>>,
    fail_destroy: bool,
    /// When set, `start` stays pending until the cell turns true.
    gate: Option<Rc<Cell<bool>>>,
    /// When set, `update` disables the script's own handle.
    me: Option<Rc<RefCell<Option<ScriptHandle>>>>,
}

impl RecordingScript {
    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn failing_destroy(mut self) -> Self {
        self.fail_destroy = true;
        self
    }

    pub fn gated_start(mut self, gate: Rc<Cell<bool>>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn disables_itself_in_update(mut self) -> Self {
        self.me = Some(Rc::new(RefCell::new(None)));
        self
    }

    pub fn into_handle(self) -> ScriptHandle {
        let me = self.me.clone();
        let handle = ScriptHandle::new(self);
        if let Some(me) = me {
            *me.borrow_mut() = Some(handle.clone());
        }
        handle
    }

    fn record(&self, hook: &str) {
        self.log.borrow_mut().push(format!("{}.{hook}", self.name));
    }
}

impl Script for RecordingScript {
    fn host(&self) -> ScriptHost {
        ScriptHost::Scene
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn hooks(&self) -> HookSet {
        self.hooks
    }

    fn awake(&mut self) -> anyhow::Result<()> {
        self.record("awake");
        Ok(())
    }

    fn on_enable(&mut self) {
        self.record("enable");
    }

    fn start(&mut self) -> anyhow::Result<StartOutcome> {
        self.record("start");
        let Some(gate) = self.gate.clone() else {
            return Ok(StartOutcome::Ready);
        };
        let log = self.log.clone();
        let name = self.name.clone();
        Ok(StartOutcome::pending(poll_fn(move |_| {
            if gate.get() {
                log.borrow_mut().push(format!("{name}.started"));
                Poll::Ready(Ok(()))
            } else {
                Poll::Pending
            }
        })))
    }

    fn update(&mut self, _dt: f32) {
        self.record("update");
        let me = self.me.as_ref().and_then(|me| me.borrow().clone());
        if let Some(me) = me {
            crate::attach::set_script_enabled(&me, false);
        }
    }

    fn late_update(&mut self, _dt: f32) {
        self.record("lateUpdate");
    }

    fn fixed_update(&mut self, _step: f32) {
        self.record("fixedUpdate");
    }

    fn on_pre_render(&mut self) {
        self.record("preRender");
    }

    fn on_post_render(&mut self) {
        self.record("postRender");
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.record(&format!("resize({width}x{height})"));
    }

    fn on_disable(&mut self) {
        self.record("disable");
    }

    fn destroy(&mut self) -> anyhow::Result<()> {
        self.record("destroy");
        if self.fail_destroy {
            anyhow::bail!("{} refused to die", self.name);
        }
        Ok(())
    }
}
