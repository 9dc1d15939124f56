/// Per-context summary lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Triggered,
    Succeeded,
    Failed,
    /// The pending summary of the latest request was persisted.
    Saved,
    Dismissed,
}

impl LifecycleState {
    pub fn apply(self, event: LifecycleEvent) -> Self {
        match (self, event) {
            (_, LifecycleEvent::Triggered) => Self::Loading,
            (_, LifecycleEvent::Succeeded) => Self::Ready,
            (_, LifecycleEvent::Failed) => Self::Failed,
            // A request still in flight keeps the context loading.
            (Self::Loading, LifecycleEvent::Saved | LifecycleEvent::Dismissed) => Self::Loading,
            (_, LifecycleEvent::Saved | LifecycleEvent::Dismissed) => Self::Idle,
        }
    }
}
