use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    domain::{ClassificationResult, Rules},
    events::{PageEvent, PageHandler, Subscription},
    filter::{classifier, extract::extract_text, markers::CheckedMarkers, FilterContext},
    page::{Document, NodeId},
};

pub const DIAGNOSTICS_TARGET: &str = "botfilter";

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub examined: usize,
    pub hidden: usize,
    pub shown: usize,
    pub diagnostics: Vec<DiagnosticRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticRecord {
    pub post: NodeId,
    pub symbol_tags: usize,
    pub result: ClassificationResult,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Already-checked posts are skipped.
pub fn reconcile(doc: &mut Document, markers: &mut CheckedMarkers, rules: &Rules) -> ReconcileReport {
    markers.retain_live(doc);

    let mut report = ReconcileReport::default();
    for post in doc.posts() {
        if markers.is_checked(post) {
            continue;
        }

        let text = extract_text(doc, post);
        let result = classifier::classify(&text, rules);
        doc.set_hidden(post, result.hide);
        markers.mark(post);

        report.examined += 1;
        if result.hide {
            report.hidden += 1;
        } else {
            report.shown += 1;
        }

        if rules.debug_logging {
            report.diagnostics.push(diagnose(post, result, text));
        }
    }

    if report.examined > 0 {
        tracing::debug!(
            target: "reconciler",
            examined = report.examined,
            hidden = report.hidden,
            "reconcile pass finished"
        );
    }
    report
}

pub fn reset(doc: &mut Document, markers: &mut CheckedMarkers) {
    markers.clear();
    for post in doc.posts() {
        doc.set_hidden(post, false);
    }
}

#[derive(Debug, Default)]
pub struct Reconciler;

impl PageHandler for Reconciler {
    fn name(&self) -> &'static str {
        "reconciler"
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut FilterContext) -> Subscription {
        match event {
            PageEvent::BootstrapDetected | PageEvent::ScrollSettled => {
                run_pass(ctx);
            }
            PageEvent::ConfigChanged(rules) => {
                ctx.rules.replace(rules.clone());
                reset(&mut ctx.document, &mut ctx.markers);
                tracing::info!(
                    target: "reconciler",
                    posts = ctx.document.posts().len(),
                    "rules replaced; re-evaluating every post"
                );
                run_pass(ctx);
            }
            PageEvent::NodesInserted(_) | PageEvent::NodesRemoved(_) => {}
        }
        Subscription::Keep
    }
}

fn run_pass(ctx: &mut FilterContext) {
    let rules = ctx.rules.current();
    let report = reconcile(&mut ctx.document, &mut ctx.markers, &rules);
    ctx.record(report);
}

fn diagnose(post: NodeId, result: ClassificationResult, text: String) -> DiagnosticRecord {
    let symbol_tags = classifier::count_symbol_tags(&text);
    tracing::info!(
        target: DIAGNOSTICS_TARGET,
        post = %post,
        hidden = result.hide,
        symbol_tags,
        reason = %result.reason,
        text = %text,
        "post classified"
    );
    DiagnosticRecord {
        post,
        symbol_tags,
        result,
        text,
        at: Utc::now(),
    }
}
