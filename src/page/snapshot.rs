use std::path::Path;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use super::{Document, NodeId, PageError};

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("valid body selector"));

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read page snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Page(#[from] PageError),
}

pub async fn read_snapshot(path: &Path) -> Result<String, SnapshotError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })
}

pub fn render_html(doc: &mut Document, html: &str) -> Result<Vec<NodeId>, SnapshotError> {
    let parsed = Html::parse_document(html);
    let Some(body) = parsed.select(&BODY_SELECTOR).next() else {
        return Ok(Vec::new());
    };

    let mut appended = Vec::new();
    for child in body.children() {
        let node = if let Some(element) = ElementRef::wrap(child) {
            build_element(doc, element)?
        } else if let Some(text) = child.value().as_text() {
            Some(doc.create_text(text))
        } else {
            None
        };
        if let Some(node) = node {
            doc.append_child(doc.root(), node)?;
            appended.push(node);
        }
    }

    tracing::debug!(target: "page", nodes = appended.len(), "snapshot rendered");
    Ok(appended)
}

fn build_element(doc: &mut Document, element: ElementRef<'_>) -> Result<Option<NodeId>, PageError> {
    let value = element.value();
    if SKIPPED_TAGS.contains(&value.name()) {
        return Ok(None);
    }

    let attrs = value.attrs().collect::<Vec<_>>();
    let node = doc.create_element(value.name(), &attrs);
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if let Some(child_node) = build_element(doc, child_element)? {
                doc.append_child(node, child_node)?;
            }
        } else if let Some(text) = child.value().as_text() {
            let text_node = doc.create_text(text);
            doc.append_child(node, text_node)?;
        }
    }
    Ok(Some(node))
}
