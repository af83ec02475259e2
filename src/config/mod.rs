use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::magic::DEFAULT_TECH;

/// Settings for rendering cell layouts with MAGIC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// MAGIC technology name.
    #[serde(default = "default_tech")]
    pub tech: String,
    /// Directory containing the generated `.mag` files.
    pub build_dir: PathBuf,
    /// Cells to render.
    #[serde(default)]
    pub cells: Vec<String>,
    /// If set, rendered images are copied here.
    #[serde(default)]
    pub docs_dir: Option<PathBuf>,
    /// Command that regenerates the layouts, e.g.
    /// `["cargo", "run", "--release", "--", "configs/sram_16x16.toml"]`.
    #[serde(default)]
    pub generator: Option<Vec<String>>,
    /// Path to the MAGIC binary. Defaults to `magic` on the `PATH`.
    #[serde(default)]
    pub magic: Option<PathBuf>,
}

fn default_tech() -> String {
    DEFAULT_TECH.to_string()
}

/// Describes a testbench's simulation output and what to do with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TbConfig {
    /// Name of the testbench. Used for default output file names.
    pub name: String,
    /// Tabular data file written by the simulator.
    pub data: PathBuf,
    /// Name of the sweep variable in the first column.
    #[serde(default = "default_sweep")]
    pub sweep: String,
    /// Saved signals, in the order they appear in the data file.
    /// Accepts bus shorthand such as `decode[127:0]`.
    pub saved: Vec<String>,
    /// Signals to plot. Defaults to all saved signals.
    #[serde(default)]
    pub plot: Option<Vec<String>>,
    /// Output image. Defaults to `<name>.png` next to the data file.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Image resolution, in dots per inch.
    #[serde(default)]
    pub dpi: Option<u32>,
    /// Whether to draw a legend.
    #[serde(default = "default_true")]
    pub legend: bool,
    /// Signals whose 20%-80% rise time should be reported.
    #[serde(default)]
    pub rise_time: Vec<String>,
    /// Signals whose 80%-20% fall time should be reported.
    #[serde(default)]
    pub fall_time: Vec<String>,
    /// Capacitance extraction from AC admittance data.
    #[serde(default)]
    pub capacitance: Option<CapConfig>,
}

/// Names the imaginary current column of an AC admittance measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapConfig {
    pub imag: String,
}

fn default_sweep() -> String {
    "time".to_string()
}

fn default_true() -> bool {
    true
}

impl TbConfig {
    /// Resolves the output image path.
    pub fn output_path(&self) -> PathBuf {
        match self.output {
            Some(ref output) => output.clone(),
            None => {
                let dir = self.data.parent().unwrap_or_else(|| Path::new(""));
                crate::paths::out_png(dir, &self.name)
            }
        }
    }
}

pub fn parse_render_config(path: impl AsRef<Path>) -> Result<RenderConfig> {
    let contents = fs::read_to_string(path)?;
    let data = toml::from_str(&contents)?;
    Ok(data)
}

/// Parses a testbench configuration, resolving relative paths
/// against the directory containing the configuration file.
pub fn parse_tb_config(path: impl AsRef<Path>) -> Result<TbConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let mut data: TbConfig = toml::from_str(&contents)?;
    if let Some(dir) = path.parent() {
        if data.data.is_relative() {
            data.data = dir.join(&data.data);
        }
        if let Some(ref mut output) = data.output {
            if output.is_relative() {
                *output = dir.join(&*output);
            }
        }
    }
    Ok(data)
}
