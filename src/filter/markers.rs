use std::collections::HashSet;

use crate::page::{Document, NodeId};

#[derive(Debug, Default)]
pub struct CheckedMarkers {
    checked: HashSet<NodeId>,
}

impl CheckedMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_checked(&self, post: NodeId) -> bool {
        self.checked.contains(&post)
    }

    pub fn mark(&mut self, post: NodeId) {
        self.checked.insert(post);
    }

    pub fn invalidate(&mut self, post: NodeId) -> bool {
        self.checked.remove(&post)
    }

    pub fn clear(&mut self) {
        self.checked.clear();
    }

    pub fn retain_live(&mut self, doc: &Document) -> usize {
        let before = self.checked.len();
        self.checked.retain(|id| doc.contains(*id));
        before - self.checked.len()
    }

    pub fn len(&self) -> usize {
        self.checked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_nodes_are_swept() {
        let mut doc = Document::new();
        let kept = doc.create_post("a").unwrap();
        let dropped = doc.create_post("b").unwrap();
        doc.append_child(doc.root(), kept).unwrap();
        doc.append_child(doc.root(), dropped).unwrap();

        let mut markers = CheckedMarkers::new();
        markers.mark(kept);
        markers.mark(dropped);
        doc.remove(dropped).unwrap();

        assert_eq!(markers.retain_live(&doc), 1);
        assert!(markers.is_checked(kept));
        assert!(!markers.is_checked(dropped));
        assert_eq!(markers.len(), 1);
    }
}
