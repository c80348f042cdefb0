use std::fmt;

use crate::{domain::Rules, filter::FilterContext, page::NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    NodesInserted(Vec<NodeId>),
    NodesRemoved(Vec<NodeId>),
    BootstrapDetected,
    ScrollSettled,
    ConfigChanged(Rules),
}

impl PageEvent {
    pub fn label(&self) -> &'static str {
        match self {
            PageEvent::NodesInserted(_) => "nodes-inserted",
            PageEvent::NodesRemoved(_) => "nodes-removed",
            PageEvent::BootstrapDetected => "bootstrap-detected",
            PageEvent::ScrollSettled => "scroll-settled",
            PageEvent::ConfigChanged(_) => "config-changed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    Keep,
    Detach,
}

pub trait PageHandler: Send {
    fn name(&self) -> &'static str;

    fn handle(&mut self, event: &PageEvent, ctx: &mut FilterContext) -> Subscription;
}

#[derive(Default)]
pub struct EventBus {
    handlers: Vec<Box<dyn PageHandler>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field(
                "handlers",
                &self.handlers.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<H>(&mut self, handler: H)
    where
        H: PageHandler + 'static,
    {
        tracing::debug!(target: "events", handler = handler.name(), "handler subscribed");
        self.handlers.push(Box::new(handler));
    }

    /// Follow-ups queued during dispatch are delivered after `event` reached
    /// every handler. Returns the number of events dispatched.
    pub fn publish(&mut self, event: PageEvent, ctx: &mut FilterContext) -> usize {
        let mut dispatched = 0;
        let mut next = Some(event);
        while let Some(event) = next {
            self.dispatch(&event, ctx);
            dispatched += 1;
            next = ctx.take_queued();
        }
        dispatched
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn dispatch(&mut self, event: &PageEvent, ctx: &mut FilterContext) {
        tracing::trace!(target: "events", event = event.label(), "dispatching");
        self.handlers.retain_mut(|handler| match handler.handle(event, ctx) {
            Subscription::Keep => true,
            Subscription::Detach => {
                tracing::debug!(target: "events", handler = handler.name(), "handler detached");
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
        detach_on: Option<&'static str>,
        emit_on_first: Option<PageEvent>,
    }

    impl PageHandler for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle(&mut self, event: &PageEvent, ctx: &mut FilterContext) -> Subscription {
            self.seen
                .lock()
                .push(format!("{}:{}", self.name, event.label()));
            if let Some(follow_up) = self.emit_on_first.take() {
                ctx.queue(follow_up);
            }
            if self.detach_on == Some(event.label()) {
                Subscription::Detach
            } else {
                Subscription::Keep
            }
        }
    }

    #[test]
    fn dispatches_in_order_and_drains_follow_ups_afterwards() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.subscribe(Recorder {
            name: "first",
            seen: seen.clone(),
            detach_on: Some("bootstrap-detected"),
            emit_on_first: Some(PageEvent::BootstrapDetected),
        });
        bus.subscribe(Recorder {
            name: "second",
            seen: seen.clone(),
            detach_on: None,
            emit_on_first: None,
        });

        let mut ctx = FilterContext::new(Rules::default());
        let dispatched = bus.publish(PageEvent::ScrollSettled, &mut ctx);

        assert_eq!(dispatched, 2);
        assert_eq!(
            *seen.lock(),
            vec![
                "first:scroll-settled",
                "second:scroll-settled",
                "first:bootstrap-detected",
                "second:bootstrap-detected",
            ]
        );
        assert_eq!(bus.handler_names(), vec!["second"]);

        bus.publish(PageEvent::ScrollSettled, &mut ctx);
        assert_eq!(seen.lock().last().map(String::as_str), Some("second:scroll-settled"));
        assert_eq!(seen.lock().len(), 5);
    }
}
