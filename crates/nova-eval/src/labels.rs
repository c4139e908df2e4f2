use std::sync::Arc;

use nova_jdwp::{JdwpValue, ObjectRef};
use parking_lot::RwLock;

/// Objects the user marked with a label during a debug session.
///
/// Cloning yields another handle to the same registry; separate sessions
/// create separate registries.
#[derive(Clone, Debug, Default)]
pub struct DebugLabels {
    marks: Arc<RwLock<Vec<(ObjectRef, String)>>>,
}

impl DebugLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels `object`, replacing any label it already had.
    pub fn mark(&self, object: ObjectRef, label: impl Into<String>) {
        let label = label.into();
        let mut marks = self.marks.write();
        match marks.iter_mut().find(|(marked, _)| marked.id == object.id) {
            Some(entry) => entry.1 = label,
            None => marks.push((object, label)),
        }
    }

    pub fn unmark(&self, object: &ObjectRef) -> bool {
        let mut marks = self.marks.write();
        let before = marks.len();
        marks.retain(|(marked, _)| marked.id != object.id);
        marks.len() != before
    }

    pub fn find(&self, label: &str) -> Option<JdwpValue> {
        self.marks
            .read()
            .iter()
            .find(|(_, text)| text == label)
            .map(|(object, _)| JdwpValue::Object(object.clone()))
    }

    pub fn labels(&self) -> Vec<(String, ObjectRef)> {
        self.marks
            .read()
            .iter()
            .map(|(object, text)| (text.clone(), object.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.read().is_empty()
    }
}
