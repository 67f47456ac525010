//! Destinations for standalone plots.

use super::ChartError;
use plotly::Plot;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Receives finished plots.
pub trait ChartSink {
    /// Accept a plot named `name`.
    fn emit(&mut self, name: &str, plot: Plot) -> Result<(), ChartError>;
}

/// Writes each plot to `<dir>/<name>.html`, numbering repeated names.
#[derive(Debug, Clone)]
pub struct HtmlDirSink {
    dir: PathBuf,
    counts: HashMap<String, usize>,
    written: Vec<PathBuf>,
}

impl HtmlDirSink {
    /// Create a sink writing into `dir`; the directory is created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counts: HashMap::new(),
            written: Vec::new(),
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ChartSink for HtmlDirSink {
    fn emit(&mut self, name: &str, plot: Plot) -> Result<(), ChartError> {
        fs::create_dir_all(&self.dir)?;
        let count = self.counts.entry(name.to_string()).or_insert(0);
        *count += 1;
        let file = if *count == 1 {
            format!("{name}.html")
        } else {
            format!("{name}_{count}.html")
        };
        let path = self.dir.join(file);
        fs::write(&path, plot.to_html())?;
        info!(path = %path.display(), "chart written");
        self.written.push(path);
        Ok(())
    }
}

/// Opens every plot in the default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSink;

impl ChartSink for BrowserSink {
    fn emit(&mut self, _name: &str, plot: Plot) -> Result<(), ChartError> {
        plot.show();
        Ok(())
    }
}

/// Keeps plots in memory as JSON.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    plots: Vec<(String, String)>,
}

impl MemorySink {
    /// Names of the collected plots, in emission order.
    pub fn names(&self) -> Vec<&str> {
        self.plots.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// JSON of the first plot named `name`.
    pub fn json(&self, name: &str) -> Option<&str> {
        self.plots
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, json)| json.as_str())
    }

    /// Number of collected plots.
    pub fn len(&self) -> usize {
        self.plots.len()
    }

    /// Whether nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }
}

impl ChartSink for MemorySink {
    fn emit(&mut self, name: &str, plot: Plot) -> Result<(), ChartError> {
        self.plots.push((name.to_string(), plot.to_json()));
        Ok(())
    }
}
