use anyhow::Result;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

use crate::{
    config::PageConfig,
    domain::Rules,
    events::{EventBus, PageEvent},
    filter::{
        rules_source::{load_rules, on_rules_change},
        BootstrapWatcher, FilterContext, FilterStats, Reconciler, SteadyStateWatcher,
    },
    infrastructure::lifetime::{PageLifetime, UnloadListener},
    page::{snapshot, Document},
    storage::Store,
    tasks::debounce::Debouncer,
};

#[derive(Debug)]
pub enum PageSignal {
    /// More markup rendered at the end of the feed.
    Render(String),
    Scroll,
}

#[derive(Debug)]
enum LoopMessage {
    ScrollSettled,
    RulesChanged(Rules),
}

pub struct BotFilterApp {
    config: PageConfig,
    ctx: FilterContext,
    bus: EventBus,
    debouncer: Debouncer,
    loop_tx: UnboundedSender<LoopMessage>,
    loop_rx: UnboundedReceiver<LoopMessage>,
    tasks: Vec<JoinHandle<()>>,
}

impl BotFilterApp {
    pub async fn initialize(config: PageConfig, store: &Store, lifetime: &PageLifetime) -> Self {
        let rules = load_rules(store).await;

        let mut bus = EventBus::new();
        bus.subscribe(BootstrapWatcher::new());
        bus.subscribe(SteadyStateWatcher);
        bus.subscribe(Reconciler);

        let (loop_tx, loop_rx) = mpsc::unbounded_channel();
        let rules_tx = loop_tx.clone();
        let rules_task = on_rules_change(store, lifetime.listener(), move |rules| {
            let _ = rules_tx.send(LoopMessage::RulesChanged(rules));
        });

        tracing::info!(
            target: "app",
            handlers = ?bus.handler_names(),
            debounce_ms = config.scroll_debounce.as_millis() as u64,
            "content filter attached"
        );

        Self {
            config,
            ctx: FilterContext::new(rules),
            bus,
            debouncer: Debouncer::new(),
            loop_tx,
            loop_rx,
            tasks: vec![rules_task],
        }
    }

    pub fn context(&self) -> &FilterContext {
        &self.ctx
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.ctx.document
    }

    pub fn flush_mutations(&mut self) {
        let Some(batch) = self.ctx.document.take_mutations() else {
            return;
        };
        if !batch.added.is_empty() {
            self.bus
                .publish(PageEvent::NodesInserted(batch.added), &mut self.ctx);
        }
        if !batch.removed.is_empty() {
            self.bus
                .publish(PageEvent::NodesRemoved(batch.removed), &mut self.ctx);
        }
    }

    pub fn scroll(&mut self) {
        let tx = self.loop_tx.clone();
        self.debouncer.schedule(self.config.scroll_debounce, move || {
            let _ = tx.send(LoopMessage::ScrollSettled);
        });
    }

    pub async fn run(
        mut self,
        mut signals: mpsc::Receiver<PageSignal>,
        mut lifetime: UnloadListener,
    ) -> Result<FilterStats> {
        let mut signals_open = true;
        loop {
            tokio::select! {
                _ = lifetime.unloaded() => break,
                Some(message) = self.loop_rx.recv() => self.on_message(message),
                signal = signals.recv(), if signals_open => match signal {
                    Some(signal) => self.on_signal(signal)?,
                    None => signals_open = false,
                },
            }
        }

        self.debouncer.cancel_pending();
        for task in self.tasks.drain(..) {
            task.abort();
        }

        let stats = self.ctx.stats;
        tracing::info!(
            target: "app",
            passes = stats.passes,
            examined = stats.examined,
            hidden = stats.hidden,
            "page unloaded"
        );
        Ok(stats)
    }

    fn on_signal(&mut self, signal: PageSignal) -> Result<()> {
        match signal {
            PageSignal::Render(html) => {
                let nodes = snapshot::render_html(&mut self.ctx.document, &html)?;
                tracing::debug!(target: "app", nodes = nodes.len(), "page rendered");
                self.flush_mutations();
            }
            PageSignal::Scroll => self.scroll(),
        }
        Ok(())
    }

    fn on_message(&mut self, message: LoopMessage) {
        let event = match message {
            LoopMessage::ScrollSettled => PageEvent::ScrollSettled,
            LoopMessage::RulesChanged(rules) => PageEvent::ConfigChanged(rules),
        };
        self.bus.publish(event, &mut self.ctx);
        if let Some(report) = &self.ctx.last_report {
            if report.examined > 0 {
                tracing::info!(
                    target: "app",
                    examined = report.examined,
                    hidden = report.hidden,
                    "posts filtered"
                );
            }
        }
    }
}
