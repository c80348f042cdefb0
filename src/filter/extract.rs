use crate::page::{Document, NodeId, POST_TEXT_TEST_ID, TEST_ID_ATTR};

pub fn extract_text(doc: &Document, post: NodeId) -> String {
    match doc.find_by_attr(post, TEST_ID_ATTR, POST_TEXT_TEST_ID) {
        Some(text_node) => doc.text_content(text_node),
        None => doc.text_content(post),
    }
}
