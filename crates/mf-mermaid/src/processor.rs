//! Code block processor for mermaid charts.
//!
//! This module provides [`MermaidProcessor`], which implements the
//! [`CodeBlockProcessor`] trait. During parsing it registers every mermaid
//! block with the [`ChartCache`] and leaves a `{{MERMAID_<id>}}` placeholder.
//! In `post_process` it renders all pending charts of the document, assembles
//! their figures and swaps the placeholders in one pass.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use mf_config::Settings;
use mf_renderer::{CodeBlockProcessor, ProcessError, ProcessResult};
use regex::{Captures, Regex};

use crate::cache::{ChartCache, ChartState};
use crate::consts::LANGUAGE;
use crate::error::MermaidError;
use crate::invoker::{CommandRunner, Invoker};
use crate::output;
use crate::svg::{self, SvgLabels};
use crate::workspace::Workspace;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{MERMAID_([0-9a-f]{32})\}\}").unwrap());

fn placeholder(id: &str) -> String {
    format!("{{{{MERMAID_{id}}}}}")
}

/// Code block processor for mermaid charts of a single document.
///
/// Borrows the cache and workspace from [`MermaidPlugin`](crate::MermaidPlugin),
/// which hands out one processor per document.
pub struct MermaidProcessor<'a> {
    settings: &'a Settings,
    workspace: &'a Workspace,
    runner: &'a dyn CommandRunner,
    cache: &'a mut ChartCache,
    /// Chart ids in document order, without duplicates.
    ids: Vec<String>,
    warnings: Vec<String>,
}

impl<'a> MermaidProcessor<'a> {
    /// Create a processor for a new document.
    pub fn new(
        settings: &'a Settings,
        workspace: &'a Workspace,
        runner: &'a dyn CommandRunner,
        cache: &'a mut ChartCache,
    ) -> Self {
        cache.begin_document();
        Self {
            settings,
            workspace,
            runner,
            cache,
            ids: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Ids of the charts found so far, in document order.
    #[must_use]
    pub fn chart_ids(&self) -> &[String] {
        &self.ids
    }

    /// Render every pending chart of the document.
    ///
    /// Failures are recorded on the chart and logged. Under strict error
    /// handling the first failed chart of the document is returned as an error.
    pub fn render(&mut self) -> Result<(), MermaidError> {
        let pending = self.cache.pending(&self.ids);
        if !pending.is_empty() {
            if self.settings.batch {
                self.render_batch(&pending);
            } else {
                for id in &pending {
                    self.render_one(id);
                }
            }
            for id in &pending {
                self.assemble(id);
            }
        }

        if self.settings.throw_on_error {
            for id in &self.ids {
                if let Some(ChartState::Failed(message)) = self.cache.get(id).map(|r| &r.state) {
                    return Err(MermaidError::ChartFailed {
                        id: id.clone(),
                        message: message.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Replace chart placeholders with figure or fallback markup.
    pub fn replace_placeholders(&self, html: &mut String) {
        let replaced = PLACEHOLDER_RE.replace_all(html, |caps: &Captures| {
            let id = &caps[1];
            match self.cache.get(id) {
                Some(record) => match &record.state {
                    ChartState::Assembled(markup) => markup.clone(),
                    _ => output::fallback(&record.original),
                },
                None => caps[0].to_owned(),
            }
        });
        if let Cow::Owned(replaced) = replaced {
            *html = replaced;
        }
    }

    fn invoker(&self) -> Invoker<'a> {
        Invoker::new(self.settings, self.workspace, self.runner)
    }

    /// One tool invocation for all pending charts.
    fn render_batch(&mut self, ids: &[String]) {
        let written = {
            let charts: Vec<(&str, &str)> = ids
                .iter()
                .filter_map(|id| {
                    let record = self.cache.get(id)?;
                    Some((id.as_str(), record.definition.as_str()))
                })
                .collect();
            self.workspace.write_batch(&charts)
        };
        let batch = match written {
            Ok(batch) => batch,
            Err(e) => {
                let message = e.to_string();
                for id in ids {
                    self.fail(id, &message);
                }
                return;
            }
        };

        tracing::debug!(charts = batch.len(), dir = %batch.dir().display(), "Rendering mermaid batch");
        match self.invoker().run_batch(&batch) {
            Ok(()) => {
                for (index, id) in batch.ids().iter().enumerate() {
                    self.read_output(id, batch.read_output(index));
                }
            }
            Err(e) => {
                let message = e.to_string();
                for id in batch.ids() {
                    self.fail(id, &message);
                }
            }
        }
    }

    /// One tool invocation for a single chart.
    fn render_one(&mut self, id: &str) {
        if let Err(e) = self.write_input(id) {
            self.fail(id, &e.to_string());
            return;
        }

        tracing::debug!(chart = id, "Rendering mermaid chart");
        match self.invoker().run_single(id) {
            Ok(()) => {
                let raw = self.workspace.take_output(id);
                self.read_output(id, raw);
            }
            Err(e) => {
                self.workspace.discard(id);
                self.fail(id, &e.to_string());
            }
        }
    }

    fn write_input(&self, id: &str) -> Result<(), MermaidError> {
        let record = self
            .cache
            .get(id)
            .ok_or_else(|| MermaidError::UnknownChart(id.to_owned()))?;
        self.workspace.write_input(id, &record.definition)?;
        Ok(())
    }

    /// Post-process the tool output of a chart.
    fn read_output(&mut self, id: &str, raw: Result<String, MermaidError>) {
        let result = raw.and_then(|raw| {
            let record = self.cache.get(id);
            let labels = SvgLabels {
                alt: record.and_then(|r| r.alt.as_deref()),
                title: record.and_then(|r| r.title.as_deref()),
            };
            svg::annotate(&raw, labels)
        });

        match result {
            Ok(svg) => {
                if let Some(record) = self.cache.get_mut(id) {
                    record.state = ChartState::Rendered(svg);
                }
            }
            Err(e) => self.fail(id, &e.to_string()),
        }
    }

    /// Turn a rendered chart into its final figure markup.
    fn assemble(&mut self, id: &str) {
        let Some(record) = self.cache.get(id) else {
            return;
        };
        let ChartState::Rendered(svg) = &record.state else {
            return;
        };

        match output::embed(svg, record, self.settings) {
            Ok(content) => {
                let markup = output::figure(&content, record.caption.as_deref());
                if let Some(record) = self.cache.get_mut(id) {
                    record.state = ChartState::Assembled(markup);
                }
            }
            Err(e) => self.fail(id, &e.to_string()),
        }
    }

    fn fail(&mut self, id: &str, message: &str) {
        let Some(record) = self.cache.get_mut(id) else {
            return;
        };
        tracing::error!(
            chart = id,
            error = message,
            "Failed to render mermaid chart:\n{}",
            record.original
        );
        record.state = ChartState::Failed(message.to_owned());
        self.warnings
            .push(format!("mermaid chart {id} failed: {message}"));
    }
}

impl CodeBlockProcessor for MermaidProcessor<'_> {
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult {
        if !language.eq_ignore_ascii_case(LANGUAGE) {
            return ProcessResult::PassThrough;
        }

        for key in attrs.keys() {
            self.warnings.push(format!(
                "mermaid block {index}: unknown attribute '{key}' ignored"
            ));
        }

        let id = self.cache.register(source.trim());
        let placeholder = placeholder(&id);
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
        ProcessResult::Placeholder(placeholder)
    }

    fn post_process(&mut self, html: &mut String) -> Result<(), ProcessError> {
        self.render()?;
        self.replace_placeholders(html);
        Ok(())
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
