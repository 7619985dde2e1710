use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use bitflags::bitflags;
use futures::future::LocalBoxFuture;
use scenescript_common::{ObjectId, ScriptId};
use tracing::{debug, warn};

/// The entity a script's behaviour belongs to.
///
/// The registry only records this; it never owns the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptHost {
    Scene,
    Object(ObjectId),
    Camera,
    Renderer,
}

bitflags! {
    /// Lifecycle hooks a script actually implements.
    ///
    /// Dispatch checks this set before invoking a hook, so a script that
    /// leaves a hook out is never called for it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HookSet: u16 {
        const AWAKE = 1 << 0;
        const ON_ENABLE = 1 << 1;
        const START = 1 << 2;
        const UPDATE = 1 << 3;
        const LATE_UPDATE = 1 << 4;
        const FIXED_UPDATE = 1 << 5;
        const PRE_RENDER = 1 << 6;
        const POST_RENDER = 1 << 7;
        const RESIZE = 1 << 8;
        const ON_DISABLE = 1 << 9;
        const DESTROY = 1 << 10;
    }
}

/// Future returned by an asynchronous `start`.
pub type StartFuture = LocalBoxFuture<'static, anyhow::Result<()>>;

/// Result of a script's `start` hook.
pub enum StartOutcome {
    /// Initialization finished synchronously.
    Ready,
    /// Initialization continues in the background; the frame loop will not wait.
    Pending(StartFuture),
}

impl StartOutcome {
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<()>> + 'static,
    {
        Self::Pending(Box::pin(future))
    }
}

impl fmt::Debug for StartOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => f.write_str("Ready"),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// An attachable behaviour driven by the lifecycle runner.
///
/// Every hook defaults to a no-op. Implementors narrow [`Script::hooks`] to
/// the hooks they provide.
pub trait Script {
    fn host(&self) -> ScriptHost;

    fn name(&self) -> Option<&str> {
        None
    }

    fn hooks(&self) -> HookSet {
        HookSet::all()
    }

    /// Called once, immediately when the script is attached.
    fn awake(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_enable(&mut self) {}

    /// Called once on the first frame after attachment.
    fn start(&mut self) -> anyhow::Result<StartOutcome> {
        Ok(StartOutcome::Ready)
    }

    fn update(&mut self, _dt: f32) {}

    fn late_update(&mut self, _dt: f32) {}

    fn fixed_update(&mut self, _step: f32) {}

    fn on_pre_render(&mut self) {}

    fn on_post_render(&mut self) {}

    fn on_resize(&mut self, _width: u32, _height: u32) {}

    fn on_disable(&mut self) {}

    /// Called exactly once when the script is removed.
    fn destroy(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
struct Lifecycle {
    enabled: Cell<bool>,
    attached: Cell<bool>,
    destroyed: Cell<bool>,
    /// Enable/disable notification raised while one of the script's own hooks
    /// was running. Delivered once that hook returns.
    pending_toggle: Cell<Option<bool>>,
}

/// Shared, identity-compared reference to an attached script.
///
/// Cloning the handle does not clone the script. The attachment manager and
/// the lifecycle runner drive hooks through the handle, which enforces the
/// once-only semantics of `awake` and `destroy`.
#[derive(Clone)]
pub struct ScriptHandle {
    id: ScriptId,
    label: Rc<str>,
    hooks: HookSet,
    host: ScriptHost,
    script: Rc<RefCell<dyn Script>>,
    lifecycle: Rc<Lifecycle>,
}

impl ScriptHandle {
    pub fn new<S: Script + 'static>(script: S) -> Self {
        Self::from_shared(Rc::new(RefCell::new(script)))
    }

    /// Wrap a script the caller keeps its own typed reference to.
    pub fn from_shared(script: Rc<RefCell<dyn Script>>) -> Self {
        let id = ScriptId::new();
        let (label, hooks, host) = {
            let s = script.borrow();
            let label = s
                .name()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("script-{id}"));
            (label, s.hooks(), s.host())
        };
        Self {
            id,
            label: label.into(),
            hooks,
            host,
            script,
            lifecycle: Rc::new(Lifecycle {
                enabled: Cell::new(true),
                attached: Cell::new(false),
                destroyed: Cell::new(false),
                pending_toggle: Cell::new(None),
            }),
        }
    }

    /// Same as [`ScriptHandle::new`] but starts disabled.
    pub fn disabled<S: Script + 'static>(script: S) -> Self {
        let handle = Self::new(script);
        handle.lifecycle.enabled.set(false);
        handle
    }

    pub fn id(&self) -> ScriptId {
        self.id
    }

    /// The script's name, or a generated `script-<id>` label.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn host(&self) -> ScriptHost {
        self.host
    }

    pub fn hooks(&self) -> HookSet {
        self.hooks
    }

    pub fn has_hook(&self, hook: HookSet) -> bool {
        self.hooks.contains(hook)
    }

    pub fn is_enabled(&self) -> bool {
        self.lifecycle.enabled.get()
    }

    pub fn is_attached(&self) -> bool {
        self.lifecycle.attached.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle.destroyed.get()
    }

    /// Attached, enabled and not yet destroyed: eligible for frame callbacks.
    pub fn is_active(&self) -> bool {
        self.is_attached() && self.is_enabled() && !self.is_destroyed()
    }

    /// Mark attached and run `awake` then, if enabled, `on_enable`.
    ///
    /// Returns false if the handle was already attached or already destroyed.
    pub fn attach(&self) -> bool {
        if self.is_attached() || self.is_destroyed() {
            return false;
        }
        self.lifecycle.attached.set(true);
        if self.has_hook(HookSet::AWAKE) {
            if let Err(err) = self.invoke(|s| s.awake()) {
                warn!(script = %self.label, error = %err, "awake failed");
            }
        }
        if self.is_enabled() && !self.is_destroyed() {
            self.notify_toggle(true);
        }
        true
    }

    /// Mark detached, run `on_disable` if enabled, then `destroy` once.
    ///
    /// A failing `destroy` is logged and swallowed. Returns false if the
    /// handle was not attached.
    pub fn detach(&self) -> bool {
        if !self.is_attached() {
            return false;
        }
        self.lifecycle.attached.set(false);
        self.lifecycle.pending_toggle.set(None);
        if self.is_enabled() && self.has_hook(HookSet::ON_DISABLE) {
            self.invoke(|s| s.on_disable());
        }
        self.destroy_once();
        true
    }

    fn destroy_once(&self) {
        if self.lifecycle.destroyed.replace(true) {
            return;
        }
        if !self.has_hook(HookSet::DESTROY) {
            return;
        }
        match self.invoke(|s| s.destroy()) {
            Ok(()) => debug!(script = %self.label, "script destroyed"),
            Err(err) => warn!(script = %self.label, error = %err, "destroy failed"),
        }
    }

    /// Flip the enabled flag, running `on_enable`/`on_disable` on real
    /// transitions of an attached script. Returns whether the flag changed.
    ///
    /// The flag changes immediately. When called from inside one of the
    /// script's own hooks, the notification runs after that hook returns;
    /// toggling back and forth within one hook cancels out.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        if self.lifecycle.enabled.replace(enabled) == enabled {
            return false;
        }
        if !self.is_attached() || self.is_destroyed() {
            return true;
        }
        let in_hook = self.script.try_borrow_mut().is_err();
        if in_hook {
            let pending = &self.lifecycle.pending_toggle;
            pending.set(match pending.get() {
                Some(previous) if previous != enabled => None,
                _ => Some(enabled),
            });
        } else {
            self.notify_toggle(enabled);
        }
        true
    }

    fn notify_toggle(&self, enabled: bool) {
        if enabled && self.has_hook(HookSet::ON_ENABLE) {
            self.invoke(|s| s.on_enable());
        } else if !enabled && self.has_hook(HookSet::ON_DISABLE) {
            self.invoke(|s| s.on_disable());
        }
    }

    /// Run one hook, then deliver toggles the hook raised on its own handle.
    fn invoke<R>(&self, hook: impl FnOnce(&mut dyn Script) -> R) -> R {
        let result = {
            let mut script = self.script.borrow_mut();
            hook(&mut *script)
        };
        while let Some(enabled) = self.lifecycle.pending_toggle.take() {
            if self.is_attached() && !self.is_destroyed() {
                self.notify_toggle(enabled);
            }
        }
        result
    }

    /// Run `start`. `None` when the hook is absent or failed.
    pub fn start(&self) -> Option<StartOutcome> {
        if !self.has_hook(HookSet::START) {
            return None;
        }
        match self.invoke(|s| s.start()) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!(script = %self.label, error = %err, "start failed");
                None
            }
        }
    }

    pub fn update(&self, dt: f32) {
        if self.is_active() && self.has_hook(HookSet::UPDATE) {
            self.invoke(|s| s.update(dt));
        }
    }

    pub fn late_update(&self, dt: f32) {
        if self.is_active() && self.has_hook(HookSet::LATE_UPDATE) {
            self.invoke(|s| s.late_update(dt));
        }
    }

    pub fn fixed_update(&self, step: f32) {
        if self.is_active() && self.has_hook(HookSet::FIXED_UPDATE) {
            self.invoke(|s| s.fixed_update(step));
        }
    }

    pub fn pre_render(&self) {
        if self.is_active() && self.has_hook(HookSet::PRE_RENDER) {
            self.invoke(|s| s.on_pre_render());
        }
    }

    pub fn post_render(&self) {
        if self.is_active() && self.has_hook(HookSet::POST_RENDER) {
            self.invoke(|s| s.on_post_render());
        }
    }

    pub fn resize(&self, width: u32, height: u32) {
        if self.is_active() && self.has_hook(HookSet::RESIZE) {
            self.invoke(|s| s.on_resize(width, height));
        }
    }
}

impl PartialEq for ScriptHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ScriptHandle {}

impl fmt::Debug for ScriptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptHandle")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("host", &self.host)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Journal {
        calls: Vec<&'static str>,
        fail_destroy: bool,
    }

    impl Script for Journal {
        fn host(&self) -> ScriptHost {
            ScriptHost::Scene
        }

        fn name(&self) -> Option<&str> {
            Some("journal")
        }

        fn awake(&mut self) -> anyhow::Result<()> {
            self.calls.push("awake");
            Ok(())
        }

        fn on_enable(&mut self) {
            self.calls.push("enable");
        }

        fn update(&mut self, _dt: f32) {
            self.calls.push("update");
        }

        fn on_disable(&mut self) {
            self.calls.push("disable");
        }

        fn destroy(&mut self) -> anyhow::Result<()> {
            self.calls.push("destroy");
            if self.fail_destroy {
                anyhow::bail!("destroy exploded");
            }
            Ok(())
        }
    }

    struct UpdateOnly(Rc<Cell<u32>>);

    impl Script for UpdateOnly {
        fn host(&self) -> ScriptHost {
            ScriptHost::Camera
        }

        fn hooks(&self) -> HookSet {
            HookSet::UPDATE
        }

        fn update(&mut self, _dt: f32) {
            self.0.set(self.0.get() + 1);
        }

        fn destroy(&mut self) -> anyhow::Result<()> {
            panic!("destroy is not advertised and must not be called");
        }
    }

    fn journal(fail_destroy: bool) -> (Rc<RefCell<Journal>>, ScriptHandle) {
        let journal = Rc::new(RefCell::new(Journal {
            fail_destroy,
            ..Journal::default()
        }));
        let handle = ScriptHandle::from_shared(journal.clone());
        (journal, handle)
    }

    #[test]
    fn attach_runs_awake_then_enable() {
        let (journal, handle) = journal(false);
        assert!(handle.attach());
        assert!(!handle.attach());
        assert_eq!(journal.borrow().calls, ["awake", "enable"]);
        assert_eq!(handle.label(), "journal");
    }

    #[test]
    fn disabled_handle_skips_enable_and_update() {
        let journal = Rc::new(RefCell::new(Journal::default()));
        let handle = ScriptHandle::from_shared(journal.clone());
        handle.set_enabled(false);
        handle.attach();
        handle.update(0.016);
        assert_eq!(journal.borrow().calls, ["awake"]);
    }

    #[test]
    fn detach_destroys_exactly_once() {
        let (journal, handle) = journal(true);
        handle.attach();
        assert!(handle.detach());
        assert!(!handle.detach());
        assert!(handle.is_destroyed());
        assert_eq!(journal.borrow().calls, ["awake", "enable", "disable", "destroy"]);
    }

    #[test]
    fn destroyed_handle_cannot_be_reattached() {
        let (_journal, handle) = journal(false);
        handle.attach();
        handle.detach();
        assert!(!handle.attach());
    }

    #[test]
    fn set_enabled_only_fires_on_transitions() {
        let (journal, handle) = journal(false);
        handle.attach();
        assert!(!handle.set_enabled(true));
        assert!(handle.set_enabled(false));
        assert!(handle.set_enabled(true));
        assert_eq!(journal.borrow().calls, ["awake", "enable", "disable", "enable"]);
    }

    #[test]
    fn hooks_outside_the_set_are_never_invoked() {
        let count = Rc::new(Cell::new(0));
        let handle = ScriptHandle::new(UpdateOnly(count.clone()));
        handle.attach();
        handle.update(0.1);
        handle.detach();
        assert_eq!(count.get(), 1);
        assert!(handle.start().is_none());
        assert_eq!(handle.host(), ScriptHost::Camera);
        assert!(handle.label().starts_with("script-"));
    }

    #[test]
    fn clones_share_identity_and_lifecycle() {
        let (_journal, handle) = journal(false);
        let clone = handle.clone();
        handle.attach();
        assert_eq!(handle, clone);
        assert!(clone.is_attached());
        assert_ne!(handle, journal(false).1);
    }

    /// Toggles its own handle from inside `update`.
    struct SelfToggle {
        me: Rc<RefCell<Option<ScriptHandle>>>,
        sequence: Vec<bool>,
        calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Script for SelfToggle {
        fn host(&self) -> ScriptHost {
            ScriptHost::Scene
        }

        fn update(&mut self, _dt: f32) {
            self.calls.borrow_mut().push("update");
            if let Some(me) = self.me.borrow().as_ref() {
                for enabled in &self.sequence {
                    me.set_enabled(*enabled);
                }
            }
        }

        fn on_enable(&mut self) {
            self.calls.borrow_mut().push("enable");
        }

        fn on_disable(&mut self) {
            self.calls.borrow_mut().push("disable");
        }
    }

    fn self_toggle(sequence: Vec<bool>) -> (ScriptHandle, Rc<RefCell<Vec<&'static str>>>) {
        let me = Rc::new(RefCell::new(None));
        let calls = Rc::new(RefCell::new(Vec::new()));
        let handle = ScriptHandle::new(SelfToggle {
            me: me.clone(),
            sequence,
            calls: calls.clone(),
        });
        *me.borrow_mut() = Some(handle.clone());
        handle.attach();
        calls.borrow_mut().clear();
        (handle, calls)
    }

    #[test]
    fn disabling_from_own_hook_is_delivered_after_the_hook() {
        let (handle, calls) = self_toggle(vec![false]);
        handle.update(0.016);
        assert!(!handle.is_enabled());
        assert!(!handle.is_active());
        assert_eq!(*calls.borrow(), ["update", "disable"]);

        handle.update(0.016);
        assert_eq!(*calls.borrow(), ["update", "disable"]);
    }

    #[test]
    fn toggling_off_and_on_within_one_hook_cancels_out() {
        let (handle, calls) = self_toggle(vec![false, true]);
        handle.update(0.016);
        assert!(handle.is_enabled());
        assert_eq!(*calls.borrow(), ["update"]);
    }
}
