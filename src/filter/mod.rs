pub mod classifier;
pub mod extract;
pub mod markers;
pub mod reconciler;
pub mod rules_source;
pub mod watcher;

use std::collections::VecDeque;

use crate::{domain::Rules, events::PageEvent, page::Document};

pub use markers::CheckedMarkers;
pub use reconciler::{ReconcileReport, Reconciler};
pub use rules_source::RulesCell;
pub use watcher::{BootstrapWatcher, SteadyStateWatcher};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub passes: u64,
    pub examined: u64,
    pub hidden: u64,
}

#[derive(Debug)]
pub struct FilterContext {
    pub document: Document,
    pub markers: CheckedMarkers,
    pub rules: RulesCell,
    pub stats: FilterStats,
    pub last_report: Option<ReconcileReport>,
    queued: VecDeque<PageEvent>,
}

impl FilterContext {
    pub fn new(rules: Rules) -> Self {
        Self::with_document(Document::new(), rules)
    }

    pub fn with_document(document: Document, rules: Rules) -> Self {
        Self {
            document,
            markers: CheckedMarkers::new(),
            rules: RulesCell::new(rules),
            stats: FilterStats::default(),
            last_report: None,
            queued: VecDeque::new(),
        }
    }

    pub fn queue(&mut self, event: PageEvent) {
        self.queued.push_back(event);
    }

    pub(crate) fn take_queued(&mut self) -> Option<PageEvent> {
        self.queued.pop_front()
    }

    pub(crate) fn record(&mut self, report: ReconcileReport) {
        self.stats.passes += 1;
        self.stats.examined += report.examined as u64;
        self.stats.hidden += report.hidden as u64;
        self.last_report = Some(report);
    }
}
