//! Long-lived mermaid plugin.
//!
//! [`MermaidPlugin`] owns everything that outlives a single document: the
//! settings, the prepared [`Workspace`], the command runner and the
//! [`ChartCache`]. Each document gets a fresh [`MermaidProcessor`] borrowing
//! them.

use mf_config::Settings;
use mf_renderer::{HtmlBackend, MarkdownRenderer, RenderError, RenderResult};
use pulldown_cmark::{Options, Parser};

use crate::cache::ChartCache;
use crate::error::MermaidError;
use crate::invoker::{CommandRunner, SystemRunner};
use crate::processor::MermaidProcessor;
use crate::workspace::Workspace;

/// Mermaid rendering for a sequence of markdown documents.
pub struct MermaidPlugin {
    settings: Settings,
    runner: Box<dyn CommandRunner>,
    workspace: Workspace,
    cache: ChartCache,
}

impl MermaidPlugin {
    /// Create a plugin that runs the configured command as a subprocess.
    ///
    /// # Errors
    ///
    /// Returns an error if the working or output directory cannot be prepared.
    pub fn new(settings: Settings) -> Result<Self, MermaidError> {
        Self::with_runner(settings, Box::new(SystemRunner))
    }

    /// Create a plugin with a custom command runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the working or output directory cannot be prepared.
    pub fn with_runner(
        settings: Settings,
        runner: Box<dyn CommandRunner>,
    ) -> Result<Self, MermaidError> {
        if settings.verbose {
            tracing::info!(
                working_dir = %settings.working_dir.display(),
                output_dir = %settings.output_dir.display(),
                command = %settings.command,
                args = ?settings.args,
                mode = %settings.mode,
                batch = settings.batch,
                cache = settings.cache,
                throw_on_error = settings.throw_on_error,
                "Mermaid settings"
            );
        }

        let workspace = Workspace::prepare(&settings)?;
        let cache = ChartCache::new(settings.cache);
        Ok(Self {
            settings,
            runner,
            workspace,
            cache,
        })
    }

    /// Processor for the next document.
    pub fn processor(&mut self) -> MermaidProcessor<'_> {
        MermaidProcessor::new(
            &self.settings,
            &self.workspace,
            self.runner.as_ref(),
            &mut self.cache,
        )
    }

    /// Render a markdown document to HTML with mermaid charts.
    ///
    /// # Errors
    ///
    /// Returns an error if a chart fails while `throw_on_error` is set.
    pub fn render_markdown(&mut self, markdown: &str) -> Result<RenderResult, RenderError> {
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let parser = Parser::new_ext(markdown, options);
        MarkdownRenderer::<HtmlBackend>::new()
            .with_processor(self.processor())
            .render(parser)
    }

    /// Forget all charts, so the next documents render them again.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn cache(&self) -> &ChartCache {
        &self.cache
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }
}
