//! Chart records keyed by definition text.
//!
//! The cache is owned by [`MermaidPlugin`](crate::MermaidPlugin) and lent to
//! each document's processor, so identical definitions across documents are
//! rendered once. With caching disabled the cache only lives for a single
//! document and every occurrence gets its own record.

use std::collections::HashMap;

use uuid::Uuid;

use crate::directives::{self, Directives};

/// Lifecycle of a chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChartState {
    /// Registered during parsing, not yet handed to the tool.
    Pending,
    /// SVG produced and post-processed.
    Rendered(String),
    /// Final figure markup.
    Assembled(String),
    /// Rendering failed with the given message. Terminal, never retried.
    Failed(String),
}

/// One distinct chart definition.
#[derive(Clone, Debug)]
pub struct ChartRecord {
    /// 32 lowercase hex characters, used for file names and placeholders.
    pub id: String,
    /// Definition as written in the document (trimmed).
    pub original: String,
    /// Definition with figure directives removed.
    pub definition: String,
    pub caption: Option<String>,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub state: ChartState,
}

impl ChartRecord {
    fn new(original: &str) -> Self {
        let Directives {
            definition,
            caption,
            alt,
            title,
        } = directives::extract(original);

        Self {
            id: new_id(),
            original: original.to_owned(),
            definition,
            caption,
            alt,
            title,
            state: ChartState::Pending,
        }
    }

    /// Whether the chart still has to be rendered.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == ChartState::Pending
    }
}

/// Generate a chart identifier.
fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Chart records indexed by id and by original definition text.
#[derive(Debug, Default)]
pub struct ChartCache {
    enabled: bool,
    records: HashMap<String, ChartRecord>,
    by_text: HashMap<String, String>,
}

impl ChartCache {
    /// Create an empty cache.
    ///
    /// When `enabled` is false, lookups by text never hit and
    /// [`begin_document`](Self::begin_document) drops all records.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Prepare for a new document.
    pub fn begin_document(&mut self) {
        if !self.enabled {
            self.clear();
        }
    }

    /// Return the id for `text`, creating a pending record if needed.
    pub fn register(&mut self, text: &str) -> String {
        if self.enabled
            && let Some(id) = self.by_text.get(text)
        {
            return id.clone();
        }

        let record = ChartRecord::new(text);
        let id = record.id.clone();
        if self.enabled {
            self.by_text.insert(text.to_owned(), id.clone());
        }
        self.records.insert(id.clone(), record);
        id
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ChartRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ChartRecord> {
        self.records.get_mut(id)
    }

    /// Ids among `ids` whose records are still pending, in the given order.
    #[must_use]
    pub fn pending(&self, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter(|id| self.get(id).is_some_and(ChartRecord::is_pending))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.by_text.clear();
    }
}
