use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::gds::DEFAULT_SCALE;
use crate::netlist::NetlistFormat;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about,
    help_template(
        "{before-help}{name} {version}\n{author-with-newline}{about-with-newline}\n{usage-heading} {usage}\n\n{all-args}{after-help}"
    )
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render cell layouts to SVG with MAGIC.
    Render(RenderArgs),
    /// Regenerate a layout and open an SVG of one cell.
    Watch(WatchArgs),
    /// Convert a cell of a GDSII file to SVG.
    #[command(name = "gds2svg")]
    Gds2Svg(Gds2SvgArgs),
    /// Plot testbench waveforms.
    Plot(TbArgs),
    /// Measure rise times, fall times, and capacitance from testbench data.
    Analyze(AnalyzeArgs),
    /// Plot vectors of serialized simulation data.
    PlotSim(PlotSimArgs),
    /// Netlist a serialized VLSIR simulation input.
    Netlist(NetlistArgs),
    /// Write ngspice and SPICE netlists for every cell in a build directory.
    NetlistAll(NetlistAllArgs),
}

#[derive(ClapArgs, Debug)]
pub struct RenderArgs {
    /// Path to TOML render configuration file.
    #[arg(short, long, default_value = "render.toml")]
    pub config: PathBuf,

    /// Cells to render, overriding those in the configuration file.
    #[arg(long, num_args = 1..)]
    pub cells: Vec<String>,

    /// Do not run the layout generator first.
    #[arg(long)]
    pub no_generate: bool,
}

#[derive(ClapArgs, Debug)]
pub struct WatchArgs {
    /// Path to TOML render configuration file.
    #[arg(short, long, default_value = "render.toml")]
    pub config: PathBuf,

    /// The cell to display.
    pub cell: String,

    /// Write the image without opening a viewer.
    #[arg(long)]
    pub no_open: bool,
}

#[derive(ClapArgs, Debug)]
pub struct Gds2SvgArgs {
    /// The input file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// The cell to convert to SVG.
    #[arg(short, long)]
    pub cell: String,

    /// The output file. Defaults to `<cell>.svg`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pixels per user unit.
    #[arg(short, long, default_value_t = DEFAULT_SCALE)]
    pub scale: f64,
}

#[derive(ClapArgs, Debug)]
pub struct TbArgs {
    /// Path to TOML testbench configuration file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Output image, overriding the configuration file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub tb: TbArgs,

    /// Print results as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug)]
pub struct PlotSimArgs {
    /// Serialized `SimulationData` file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Index of the analysis to plot.
    #[arg(short, long, default_value_t = 0)]
    pub analysis: usize,

    /// Vectors to plot.
    #[arg(short, long, num_args = 1.., required = true)]
    pub signals: Vec<String>,

    /// Output image.
    #[arg(short, long, default_value = "plot.png")]
    pub output: PathBuf,

    /// Image resolution, in dots per inch.
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Plot title.
    #[arg(long)]
    pub title: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct NetlistArgs {
    /// Serialized `SimInput` file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output netlist. Defaults to the input path with a `.spice` or `.scs`
    /// extension.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Netlist format: `spice`, `ngspice`, or `spectre`.
    #[arg(short, long, default_value = "spice")]
    pub format: NetlistFormat,

    /// Prepend the SKY130 open-source to commercial device prelude.
    #[arg(long, conflicts_with = "prelude")]
    pub sky130_commercial: bool,

    /// Prepend the contents of this file.
    #[arg(long)]
    pub prelude: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct NetlistAllArgs {
    /// Build directory containing a `pb` subdirectory.
    #[arg(short, long, default_value = "build")]
    pub build_dir: PathBuf,

    /// Cells to netlist. Defaults to every cell in `<build_dir>/pb`.
    pub cells: Vec<String>,
}
