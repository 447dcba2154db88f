//! Session context: the active session id and the document's section list.

use crate::types::Section;

/// The backend review session the client is working against.
///
/// Created from a successful upload (or restored from the session mirror) and
/// held until reset. The section list never changes for the life of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub document_name: String,
    pub sections: Vec<Section>,
}

impl Session {
    /// Builds a session from the upload response's ordered section names.
    pub fn new(id: impl Into<String>, document_name: impl Into<String>, names: Vec<String>) -> Self {
        let sections = names
            .into_iter()
            .enumerate()
            .map(|(order, name)| Section { name, order })
            .collect();
        Self {
            id: id.into(),
            document_name: document_name.into(),
            sections,
        }
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn section_name(&self, index: usize) -> Option<&str> {
        self.sections.get(index).map(|s| s.name.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == name)
    }

    pub fn section_names(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.name.clone()).collect()
    }
}
