//! Collecting phone numbers from a `/checkbio` message.

use teloxide::types::{Document, Message};

use crate::numbers::extract_numbers;

/// File extensions accepted as number lists.
const TEXT_EXTENSIONS: [&str; 3] = ["txt", "csv", "text"];

/// Documents attached to the message or to the message it replies to.
pub fn attached_documents(msg: &Message) -> Vec<&Document> {
    let mut docs = Vec::with_capacity(2);
    if let Some(doc) = msg.document() {
        docs.push(doc);
    }
    if let Some(doc) = msg.reply_to_message().and_then(Message::document) {
        docs.push(doc);
    }
    docs
}

/// Returns true if the document looks like a plain text number list.
pub fn is_text_document(file_name: Option<&str>, mime_type: Option<&str>) -> bool {
    if mime_type.is_some_and(|m| m.starts_with("text/")) {
        return true;
    }

    file_name
        .and_then(|name| name.rsplit_once('.'))
        .is_some_and(|(_, ext)| {
            TEXT_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Extracts numbers from the inline arguments followed by each document body.
pub fn collect_numbers<S: AsRef<str>>(inline: &str, documents: &[S]) -> Vec<String> {
    let mut numbers = extract_numbers(inline);
    for body in documents {
        numbers.extend(extract_numbers(body.as_ref()));
    }
    numbers
}
