use crate::{
    events::{PageEvent, PageHandler, Subscription},
    filter::FilterContext,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootstrapState {
    #[default]
    Waiting,
    Done,
}

#[derive(Debug, Default)]
pub struct BootstrapWatcher {
    state: BootstrapState,
}

impl BootstrapWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }
}

impl PageHandler for BootstrapWatcher {
    fn name(&self) -> &'static str {
        "bootstrap-watcher"
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut FilterContext) -> Subscription {
        if self.state == BootstrapState::Done {
            return Subscription::Detach;
        }
        let PageEvent::NodesInserted(_) = event else {
            return Subscription::Keep;
        };

        let posts = ctx.document.posts().len();
        if posts == 0 {
            return Subscription::Keep;
        }

        tracing::info!(target: "watcher", posts, "first posts detected");
        self.state = BootstrapState::Done;
        ctx.queue(PageEvent::BootstrapDetected);
        Subscription::Detach
    }
}

/// Only invalidates; classification waits for the next reconcile trigger.
#[derive(Debug, Default)]
pub struct SteadyStateWatcher;

impl PageHandler for SteadyStateWatcher {
    fn name(&self) -> &'static str {
        "steady-state-watcher"
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut FilterContext) -> Subscription {
        match event {
            PageEvent::NodesInserted(nodes) => {
                let mut invalidated = 0;
                for node in nodes {
                    for post in ctx.document.posts_within(*node) {
                        ctx.markers.invalidate(post);
                        invalidated += 1;
                    }
                }
                if invalidated > 0 {
                    tracing::trace!(target: "watcher", invalidated, "inserted posts marked unchecked");
                }
            }
            PageEvent::NodesRemoved(nodes) => {
                for node in nodes {
                    ctx.markers.invalidate(*node);
                }
            }
            _ => {}
        }
        Subscription::Keep
    }
}
