use std::fs::canonicalize;

use clap::Parser;
use log::info;

use crate::cli::args::{
    AnalyzeArgs, Args, Command, Gds2SvgArgs, NetlistAllArgs, NetlistArgs, PlotSimArgs,
    RenderArgs, TbArgs, WatchArgs,
};
use crate::cli::progress::StepContext;
use crate::config::{parse_render_config, parse_tb_config};
use crate::netlist::{available_cells, netlist_step, write_netlist, Prelude};
use crate::plot::{plot_sim_data, PlotParams, DEFAULT_DPI};
use crate::render::{open_file, render_docs, render_steps, watch};
use crate::testbench::{analyze_tb, load_tb_data, plot_tb};
use crate::Result;

pub mod args;
pub mod progress;

pub const BANNER: &str = r"
 ________  ________  ________  _____ ______     _______   _______
|\   ____\|\   __  \|\   __  \|\   _ \  _   \  /  ___  \ /  ___  \
\ \  \___|\ \  \|\  \ \  \|\  \ \  \\\__\ \  \/__/|_/  //__/|_/  /|
 \ \_____  \ \   _  _\ \   __  \ \  \\|__| \  \__|//  / /__|//  / /
  \|____|\  \ \  \\  \\ \  \ \  \ \  \    \ \  \  /  /_/__  /  /_/__
    ____\_\  \ \__\\ _\\ \__\ \__\ \__\    \ \__\|\________\\________\
   |\_________\|__|\|__|\|__|\|__|\|__|     \|__| \|_______|\|_______|
   \|_________|


SRAM22 tools v0.2
";

pub fn run() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Render(args) => render(args),
        Command::Watch(args) => watch_cell(args),
        Command::Gds2Svg(args) => gds2svg(args),
        Command::Plot(args) => plot(args),
        Command::Analyze(args) => analyze(args),
        Command::PlotSim(args) => plot_sim(args),
        Command::Netlist(args) => netlist(args),
        Command::NetlistAll(args) => netlist_all(args),
    }
}

fn render(args: RenderArgs) -> Result<()> {
    let config_path = canonicalize(&args.config)?;
    println!("{BANNER}");

    println!("Reading configuration file...\n");
    let mut config = parse_render_config(&config_path)?;
    if !args.cells.is_empty() {
        config.cells = args.cells;
    }
    if args.no_generate {
        config.generator = None;
    }

    println!("Configuration file: {:?}", &config_path);
    println!("Render parameters:");
    println!("\tTechnology: {}", config.tech);
    println!("\tBuild directory: {:?}", config.build_dir);
    println!("\tCells: {}", config.cells.join(", "));

    let mut ctx = StepContext::new(render_steps(&config));
    let res = render_docs(&config, Some(&mut ctx));
    let images = ctx.check(res)?;

    println!("Images saved to:");
    for image in images {
        println!("\t{image:?}");
    }
    Ok(())
}

fn watch_cell(args: WatchArgs) -> Result<()> {
    let config = parse_render_config(&args.config)?;
    let image = watch(&config, &args.cell)?;
    println!("Image saved to: {:?}", &image);
    if !args.no_open {
        open_file(&image)?;
    }
    Ok(())
}

fn gds2svg(args: Gds2SvgArgs) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| crate::gds::default_output(&args.cell));
    crate::gds::gds2svg(&args.input, &args.cell, &output, args.scale)?;
    println!("SVG saved to: {:?}", &output);
    Ok(())
}

fn plot(args: TbArgs) -> Result<()> {
    let mut config = parse_tb_config(&args.config)?;
    if args.output.is_some() {
        config.output = args.output;
    }
    let data = load_tb_data(&config)?;
    let output = plot_tb(&config, &data)?;
    println!("Plot saved to: {:?}", &output);
    Ok(())
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let mut config = parse_tb_config(&args.tb.config)?;
    let data = load_tb_data(&config)?;
    let report = analyze_tb(&config, &data)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }

    if args.tb.output.is_some() {
        config.output = args.tb.output;
    }
    if config.output.is_some() || config.plot.is_some() {
        let output = plot_tb(&config, &data)?;
        info!("plot saved to {:?}", output);
    }
    Ok(())
}

fn plot_sim(args: PlotSimArgs) -> Result<()> {
    let params = PlotParams {
        title: args.title,
        dpi: args.dpi.unwrap_or(DEFAULT_DPI),
        ..Default::default()
    };
    plot_sim_data(
        &args.input,
        args.analysis,
        &args.signals,
        &args.output,
        &params,
    )?;
    println!("Plot saved to: {:?}", &args.output);
    Ok(())
}

fn netlist(args: NetlistArgs) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("").with_extension(args.format.extension()));
    let prelude = match (args.sky130_commercial, args.prelude) {
        (true, _) => Prelude::Sky130Commercial,
        (false, Some(path)) => Prelude::File(path),
        (false, None) => Prelude::None,
    };

    write_netlist(&args.input, &output, args.format, &prelude)?;
    println!("Netlist saved to: {:?}", &output);
    Ok(())
}

fn netlist_all(args: NetlistAllArgs) -> Result<()> {
    let cells = if args.cells.is_empty() {
        available_cells(&args.build_dir)?
    } else {
        args.cells
    };
    println!("{BANNER}");

    let mut ctx = StepContext::new(cells.iter().map(|cell| (netlist_step(cell), true)));
    let res = crate::netlist::netlist_all(&args.build_dir, &cells, Some(&mut ctx));
    let written = ctx.check(res)?;
    info!("wrote {} netlists", written.len());
    println!("Netlists saved to: {:?}", canonicalize(&args.build_dir)?);
    Ok(())
}
