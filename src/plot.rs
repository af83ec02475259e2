use std::path::Path;

use arcstr::ArcStr;
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use prost::Message;

use crate::protos::edatool::sim::v1::analysis_mode::Mode;
use crate::protos::edatool::sim::v1::sim_vector::Values;
use crate::protos::edatool::sim::v1::{AnalysisData, SimulationData};
use crate::waveform::SimData;
use crate::{anyhow, Result};

/// Name of the sweep vector in serialized simulation data.
pub const SWEEP_VAR: &str = "sweep_var";

pub const DEFAULT_DPI: u32 = 100;

/// Figure size in inches, matching the usual matplotlib default.
const FIGURE_SIZE_IN: (f64, f64) = (6.4, 4.8);

#[derive(Debug, Clone, PartialEq)]
pub struct PlotParams {
    pub title: Option<String>,
    pub dpi: u32,
    pub legend: bool,
    pub y_desc: Option<String>,
}

impl Default for PlotParams {
    fn default() -> Self {
        Self {
            title: None,
            dpi: DEFAULT_DPI,
            legend: true,
            y_desc: None,
        }
    }
}

impl PlotParams {
    pub fn size(&self) -> (u32, u32) {
        let dpi = self.dpi as f64;
        (
            (FIGURE_SIZE_IN.0 * dpi).round() as u32,
            (FIGURE_SIZE_IN.1 * dpi).round() as u32,
        )
    }
}

fn bounds<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|x| x.is_finite())
        .fold(None, |acc, &x| match acc {
            None => Some((x, x)),
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
        })
}

fn padded(lo: f64, hi: f64, frac: f64) -> std::ops::Range<f64> {
    if hi > lo {
        let pad = (hi - lo) * frac;
        (lo - pad)..(hi + pad)
    } else {
        (lo - 0.5)..(hi + 0.5)
    }
}

/// Plots each of `signals` against the sweep variable of `data`.
///
/// Writes an SVG if `output` ends in `.svg`, and a bitmap otherwise.
pub fn plot_signals<S: AsRef<str>>(
    data: &SimData,
    signals: &[S],
    output: impl AsRef<Path>,
    params: &PlotParams,
) -> Result<()> {
    let output = output.as_ref();
    if signals.is_empty() {
        return Err(anyhow!("no signals to plot"));
    }
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let size = params.size();
    let is_svg = output
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);

    if is_svg {
        let root = SVGBackend::new(output, size).into_drawing_area();
        draw(root, data, signals, params)?;
    } else {
        let root = BitMapBackend::new(output, size).into_drawing_area();
        draw(root, data, signals, params)?;
    }

    info!("plot saved to {:?}", output);
    Ok(())
}

fn draw<DB, S>(
    root: DrawingArea<DB, Shift>,
    data: &SimData,
    signals: &[S],
    params: &PlotParams,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
    S: AsRef<str>,
{
    let series = signals
        .iter()
        .map(|name| {
            let name = name.as_ref();
            Ok((name, data.signal(name)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let (x_lo, x_hi) =
        bounds(data.sweep()).ok_or_else(|| anyhow!("simulation data has no points"))?;
    let (y_lo, y_hi) = bounds(series.iter().flat_map(|(_, v)| v.iter()))
        .ok_or_else(|| anyhow!("signals have no finite values"))?;

    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60);
    if let Some(ref title) = params.title {
        builder.caption(title, ("sans-serif", 24));
    }
    let mut chart =
        builder.build_cartesian_2d(padded(x_lo, x_hi, 0.0), padded(y_lo, y_hi, 0.05))?;

    let x_fmt = |x: &f64| format!("{x:.2e}");
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(data.sweep_name()).x_label_formatter(&x_fmt);
    if let Some(ref y_desc) = params.y_desc {
        mesh.y_desc(y_desc.as_str());
    }
    mesh.draw()?;

    for (i, (name, values)) in series.into_iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        let points = data
            .sweep()
            .iter()
            .zip(values)
            .map(|(x, y)| (*x, *y));
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    if params.legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Reads serialized `SimulationData`.
pub fn read_sim_data(path: impl AsRef<Path>) -> Result<SimulationData> {
    let bytes = std::fs::read(path)?;
    Ok(SimulationData::decode(bytes.as_slice())?)
}

fn describe_mode(analysis: &AnalysisData) -> &'static str {
    match analysis.mode.as_ref().and_then(|m| m.mode.as_ref()) {
        Some(Mode::Tran(_)) => "transient",
        Some(Mode::Ac(_)) => "ac",
        Some(Mode::Dc(_)) => "dc",
        Some(Mode::Op(_)) => "operating point",
        None => "unknown",
    }
}

/// Extracts the real-valued vectors of one analysis as [`SimData`],
/// using [`SWEEP_VAR`] as the sweep.
///
/// Complex vectors contribute their real part.
pub fn analysis_to_sim_data<S: AsRef<str>>(
    data: &SimulationData,
    index: usize,
    signals: &[S],
) -> Result<SimData> {
    let analysis = data.analyses.get(index).ok_or_else(|| {
        anyhow!(
            "analysis {index} requested, but `{}` has {} analyses",
            data.name,
            data.analyses.len()
        )
    })?;
    info!(
        "using {} analysis {index} of `{}`",
        describe_mode(analysis),
        data.name
    );

    let real = |name: &str| -> Result<Vec<f64>> {
        let vector = analysis
            .values
            .get(name)
            .ok_or_else(|| anyhow!("no vector named `{name}` in analysis {index}"))?;
        match vector.values {
            Some(Values::Real(ref r)) => Ok(r.v.clone()),
            Some(Values::Complex(ref c)) => Ok(c.a.clone()),
            None => Err(anyhow!("vector `{name}` is empty")),
        }
    };

    let sweep = real(SWEEP_VAR)?;
    let columns = signals
        .iter()
        .map(|name| {
            let name = name.as_ref();
            Ok((ArcStr::from(name), real(name)?))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SimData::from_columns(SWEEP_VAR, sweep, columns)?)
}

/// Plots named vectors of a serialized `SimulationData` file.
pub fn plot_sim_data<S: AsRef<str>>(
    input: impl AsRef<Path>,
    index: usize,
    signals: &[S],
    output: impl AsRef<Path>,
    params: &PlotParams,
) -> Result<()> {
    let data = read_sim_data(input)?;
    let data = analysis_to_sim_data(&data, index, signals)?;
    plot_signals(&data, signals, output, params)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::protos::edatool::sim::v1::{
        AnalysisMode, RealVector, SimVector, TranParams,
    };

    fn real_vector(name: &str, v: Vec<f64>) -> (String, SimVector) {
        (
            name.to_string(),
            SimVector {
                name: name.to_string(),
                values: Some(Values::Real(RealVector { v })),
            },
        )
    }

    fn sim_data() -> SimulationData {
        let values = BTreeMap::from([
            real_vector(SWEEP_VAR, vec![0.0, 1e-9, 2e-9, 3e-9]),
            real_vector("a", vec![0.0, 1.8, 1.8, 0.0]),
            real_vector("b", vec![1.8, 1.8, 0.0, 0.0]),
            real_vector("y", vec![1.8, 0.0, 1.8, 1.8]),
        ]);
        SimulationData {
            name: "nand2".to_string(),
            analyses: vec![AnalysisData {
                mode: Some(AnalysisMode {
                    mode: Some(Mode::Tran(TranParams {
                        tstop: 3e-9,
                        tstep: 1e-9,
                        tstart: 0.0,
                        uic: false,
                    })),
                }),
                values,
            }],
        }
    }

    #[test]
    fn test_plot_size() {
        let params = PlotParams {
            dpi: 150,
            ..Default::default()
        };
        assert_eq!(params.size(), (960, 720));
    }

    #[test]
    fn test_analysis_to_sim_data() -> Result<()> {
        let data = analysis_to_sim_data(&sim_data(), 0, &["a", "y"])?;
        assert_eq!(data.sweep_name(), SWEEP_VAR);
        assert_eq!(data.len(), 4);
        assert_eq!(data.signal("y")?, [1.8, 0.0, 1.8, 1.8]);
        assert!(data.signal("b").is_err());

        assert!(analysis_to_sim_data(&sim_data(), 1, &["a"]).is_err());
        assert!(analysis_to_sim_data(&sim_data(), 0, &["z"]).is_err());
        Ok(())
    }

    #[test]
    fn test_read_sim_data() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("simdata.bin");
        std::fs::write(&input, sim_data().encode_to_vec())?;
        assert_eq!(read_sim_data(&input)?, sim_data());

        let output = dir.path().join("nand2.svg");
        let err = plot_sim_data(&input, 0, &["a", "q"], &output, &PlotParams::default());
        assert!(err.is_err());
        Ok(())
    }

    #[test]
    fn test_plot_signals_svg() -> Result<()> {
        if !crate::tests::fonts_available() {
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let data = analysis_to_sim_data(&sim_data(), 0, &["a", "b", "y"])?;
        let output = dir.path().join("plots/nand2.svg");
        let params = PlotParams {
            title: Some("nand2".to_string()),
            ..Default::default()
        };
        plot_signals(&data, &["a", "b", "y"], &output, &params)?;

        let svg = std::fs::read_to_string(&output)?;
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("nand2"));
        Ok(())
    }

    #[test]
    fn test_plot_sim_data_png() -> Result<()> {
        if !crate::tests::fonts_available() {
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("simdata.bin");
        std::fs::write(&input, sim_data().encode_to_vec())?;

        let output = dir.path().join("nand2.png");
        let params = PlotParams {
            dpi: 50,
            legend: false,
            ..Default::default()
        };
        plot_sim_data(&input, 0, &["y"], &output, &params)?;
        assert!(std::fs::metadata(&output)?.len() > 0);
        Ok(())
    }

    #[test]
    fn test_plot_requires_signals() {
        let data = SimData::from_columns("time", vec![0.0], std::iter::empty()).unwrap();
        let signals: [&str; 0] = [];
        assert!(plot_signals(&data, &signals, "unused.png", &PlotParams::default()).is_err());
    }
}
