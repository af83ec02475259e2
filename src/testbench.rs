use std::collections::BTreeMap;
use std::path::PathBuf;

use log::info;
use serde::Serialize;

use crate::analysis::{average_capacitance, fall_time_default, rise_time_default};
use crate::config::TbConfig;
use crate::plot::{plot_signals, PlotParams, DEFAULT_DPI};
use crate::waveform::{expand_signals, SimData};
use crate::{anyhow, Result};

/// Measurements extracted from one testbench's simulation data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TbReport {
    pub name: String,
    pub rise_times: BTreeMap<String, f64>,
    pub fall_times: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacitance: Option<f64>,
}

/// Loads the data file named by `config`, expanding bus shorthand in the
/// list of saved signals.
pub fn load_tb_data(config: &TbConfig) -> Result<SimData> {
    let saved = expand_signals(&config.saved)?;
    info!(
        "reading {} signals from {:?}",
        saved.len(),
        config.data
    );
    Ok(SimData::load(&config.data, &config.sweep, &saved)?)
}

/// Plots the configured signals, or every saved signal if none are listed.
pub fn plot_tb(config: &TbConfig, data: &SimData) -> Result<PathBuf> {
    let signals = match config.plot {
        Some(ref plot) => expand_signals(plot)?,
        None => data.names().iter().map(|s| s.to_string()).collect(),
    };
    let params = PlotParams {
        title: Some(config.name.clone()),
        dpi: config.dpi.unwrap_or(DEFAULT_DPI),
        legend: config.legend,
        y_desc: None,
    };
    let output = config.output_path();
    plot_signals(data, &signals, &output, &params)?;
    Ok(output)
}

pub fn analyze_tb(config: &TbConfig, data: &SimData) -> Result<TbReport> {
    let t = data.sweep();
    let measure = |names: &[String], f: fn(&[f64], &[f64]) -> crate::analysis::Result<f64>| {
        expand_signals(names)?
            .into_iter()
            .map(|name| {
                let v = data.signal(&name)?;
                let value = f(t, v).map_err(|e| anyhow!("{name}: {e}"))?;
                Ok((name, value))
            })
            .collect::<Result<BTreeMap<_, _>>>()
    };

    let rise_times = measure(&config.rise_time, rise_time_default)?;
    let fall_times = measure(&config.fall_time, fall_time_default)?;
    let capacitance = match config.capacitance {
        Some(ref cap) => {
            let imag = data.signal(&cap.imag)?;
            Some(average_capacitance(t, imag)?)
        }
        None => None,
    };

    Ok(TbReport {
        name: config.name.clone(),
        rise_times,
        fall_times,
        capacitance,
    })
}

impl std::fmt::Display for TbReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.name)?;
        for (name, tr) in self.rise_times.iter() {
            writeln!(f, "\trise time of {name}: {tr:.4e} s")?;
        }
        for (name, tf) in self.fall_times.iter() {
            writeln!(f, "\tfall time of {name}: {tf:.4e} s")?;
        }
        if let Some(c) = self.capacitance {
            writeln!(f, "\tcapacitance: {c:.4e} F")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;

    use super::*;
    use crate::config::{parse_tb_config, CapConfig};

    const WL_DAT: &str = "\
0e+00 0.0 0e+00 1.8
1e-10 0.0 1e-10 1.8
2e-10 0.9 2e-10 0.9
3e-10 1.8 3e-10 0.0
4e-10 1.8 4e-10 0.0
";

    fn tb(dir: &std::path::Path) -> Result<TbConfig> {
        let path = dir.join("wl.toml");
        std::fs::write(dir.join("wl.dat"), WL_DAT)?;
        std::fs::write(
            &path,
            r#"
name = "wordline"
data = "wl.dat"
saved = ["wl[1:0]"]
rise_time = ["wl[1]"]
fall_time = ["wl_0"]
"#,
        )?;
        parse_tb_config(&path)
    }

    #[test]
    fn test_analyze_tb() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = tb(dir.path())?;
        let data = load_tb_data(&config)?;
        assert_eq!(data.signal("wl_1")?, [0.0, 0.0, 0.9, 1.8, 1.8]);

        let report = analyze_tb(&config, &data)?;
        assert_relative_eq!(report.rise_times["wl_1"], 2e-10, max_relative = 1e-9);
        assert_relative_eq!(report.fall_times["wl_0"], 2e-10, max_relative = 1e-9);
        assert_eq!(report.capacitance, None);

        let json = serde_json::to_value(&report)?;
        assert_eq!(json["name"], "wordline");
        assert!(json.get("capacitance").is_none());
        assert!(report.to_string().contains("rise time of wl_1"));
        Ok(())
    }

    #[test]
    fn test_analyze_capacitance() -> Result<()> {
        let freq = vec![1e6, 1e7];
        let c = 5e-15;
        let ii = freq.iter().map(|f| 2.0 * PI * f * c).collect::<Vec<_>>();
        let data = SimData::from_columns("frequency", freq, [("ii".into(), ii)])?;

        let config = TbConfig {
            name: "cap".to_string(),
            data: PathBuf::from("cap.dat"),
            sweep: "frequency".to_string(),
            saved: vec!["ii".to_string()],
            plot: None,
            output: None,
            dpi: None,
            legend: true,
            rise_time: vec![],
            fall_time: vec![],
            capacitance: Some(CapConfig {
                imag: "ii".to_string(),
            }),
        };
        let report = analyze_tb(&config, &data)?;
        assert_relative_eq!(report.capacitance.unwrap(), c, max_relative = 1e-12);
        Ok(())
    }

    #[test]
    fn test_plot_tb_default_output() -> Result<()> {
        if !crate::tests::fonts_available() {
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let config = tb(dir.path())?;
        assert_eq!(config.output, None);
        let data = load_tb_data(&config)?;

        let output = plot_tb(&config, &data)?;
        assert_eq!(output, dir.path().join("wordline.png"));
        assert!(std::fs::metadata(&output)?.len() > 0);
        Ok(())
    }

    #[test]
    fn test_analyze_unknown_signal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut config = tb(dir.path())?;
        config.rise_time = vec!["wl_2".to_string()];
        let data = load_tb_data(&config)?;
        assert!(analyze_tb(&config, &data).is_err());
        Ok(())
    }
}
