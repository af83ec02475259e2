use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use arcstr::ArcStr;
use log::debug;

use error::{DataError, Result};

pub mod error;
pub mod signals;

pub use signals::expand_signals;

/// Simulation results: one sweep variable and any number of signals
/// sampled at each sweep point.
#[derive(Debug, Clone, PartialEq)]
pub struct SimData {
    sweep_name: ArcStr,
    sweep: Vec<f64>,
    names: Vec<ArcStr>,
    signals: HashMap<ArcStr, Vec<f64>>,
}

impl SimData {
    /// Builds a [`SimData`] from named columns of equal length.
    pub fn from_columns(
        sweep_name: impl Into<ArcStr>,
        sweep: Vec<f64>,
        columns: impl IntoIterator<Item = (ArcStr, Vec<f64>)>,
    ) -> Result<Self> {
        let mut names = Vec::new();
        let mut signals = HashMap::new();
        for (name, values) in columns {
            if values.len() != sweep.len() {
                return Err(DataError::Length {
                    name: name.to_string(),
                    expected: sweep.len(),
                    found: values.len(),
                });
            }
            names.push(name.clone());
            signals.insert(name, values);
        }
        Ok(Self {
            sweep_name: sweep_name.into(),
            sweep,
            names,
            signals,
        })
    }

    /// Reads tabular data as written by ngspice's `wrdata` command.
    ///
    /// Each line holds one `(sweep, value)` pair per saved signal, in the
    /// order given by `saved`. Files written with `wr_singlescale` set, which
    /// print the sweep value once followed by every signal, are also accepted.
    /// Blank lines and lines starting with `#` or `;` are skipped.
    pub fn read<R, S>(r: R, sweep_name: &str, saved: &[S]) -> Result<Self>
    where
        R: Read,
        S: AsRef<str>,
    {
        if saved.is_empty() {
            return Err(DataError::NoSignals);
        }

        let n = saved.len();
        let reader = BufReader::new(r);
        let mut sweep = Vec::new();
        let mut columns = vec![Vec::new(); n];

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let values = line
                .split_whitespace()
                .map(|token| {
                    token.parse::<f64>().map_err(|_| DataError::Parse {
                        line: i + 1,
                        token: token.to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            sweep.push(values[0]);
            if values.len() == 2 * n {
                for (column, pair) in columns.iter_mut().zip(values.chunks_exact(2)) {
                    column.push(pair[1]);
                }
            } else if values.len() == n + 1 {
                for (column, value) in columns.iter_mut().zip(&values[1..]) {
                    column.push(*value);
                }
            } else {
                return Err(DataError::ColumnCount {
                    line: i + 1,
                    expected: format!("{} or {}", 2 * n, n + 1),
                    found: values.len(),
                });
            }
        }

        debug!("read {} points for {} signals", sweep.len(), n);

        let names = saved.iter().map(|s| ArcStr::from(s.as_ref()));
        Self::from_columns(sweep_name, sweep, names.zip(columns))
    }

    /// Reads a `wrdata` file from disk. See [`SimData::read`].
    pub fn load<S: AsRef<str>>(
        path: impl AsRef<Path>,
        sweep_name: &str,
        saved: &[S],
    ) -> Result<Self> {
        let f = File::open(path)?;
        Self::read(f, sweep_name, saved)
    }

    #[inline]
    pub fn sweep_name(&self) -> &str {
        &self.sweep_name
    }

    #[inline]
    pub fn sweep(&self) -> &[f64] {
        &self.sweep
    }

    /// Signal names in the order they were saved.
    #[inline]
    pub fn names(&self) -> &[ArcStr] {
        &self.names
    }

    /// Number of sweep points.
    #[inline]
    pub fn len(&self) -> usize {
        self.sweep.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sweep.is_empty()
    }

    pub fn signal(&self, name: &str) -> Result<&[f64]> {
        self.signals
            .get(name)
            .map(|v| v.as_slice())
            .ok_or_else(|| DataError::UnknownSignal(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CONTROL_DAT: &str = "\
 0.000000000000000e+00  0.000000000000000e+00  0.000000000000000e+00  1.800000000000000e+00
 1.000000000000000e-10  9.000000000000000e-01  1.000000000000000e-10  1.700000000000000e+00
 2.000000000000000e-10  1.800000000000000e+00  2.000000000000000e-10  2.000000000000000e-01
";

    #[test]
    fn test_read_pairs() -> Result<()> {
        let data = SimData::read(CONTROL_DAT.as_bytes(), "time", &["clk", "sense_en"])?;
        assert_eq!(data.len(), 3);
        assert_eq!(data.sweep_name(), "time");
        assert_eq!(data.sweep(), [0.0, 1e-10, 2e-10]);
        assert_eq!(data.signal("clk")?, [0.0, 0.9, 1.8]);
        assert_eq!(data.signal("sense_en")?, [1.8, 1.7, 0.2]);
        assert_eq!(data.names(), [ArcStr::from("clk"), ArcStr::from("sense_en")]);
        Ok(())
    }

    #[test]
    fn test_read_single_scale() -> Result<()> {
        let dat = "# freq ir ii\n1e6 0.1 2e-9\n\n2e6 0.1 4e-9\n";
        let data = SimData::read(dat.as_bytes(), "freq", &["ir", "ii"])?;
        assert_eq!(data.sweep(), [1e6, 2e6]);
        assert_eq!(data.signal("ii")?, [2e-9, 4e-9]);
        Ok(())
    }

    #[test]
    fn test_read_errors() {
        let err = SimData::read("0 1 0\n".as_bytes(), "time", &["a", "b", "c"]).unwrap_err();
        assert!(matches!(err, DataError::ColumnCount { line: 1, found: 3, .. }));

        let err = SimData::read("0 1\n0 x\n".as_bytes(), "time", &["a"]).unwrap_err();
        assert!(matches!(err, DataError::Parse { line: 2, .. }));

        let saved: [&str; 0] = [];
        let err = SimData::read("0 1\n".as_bytes(), "time", &saved).unwrap_err();
        assert!(matches!(err, DataError::NoSignals));

        let data = SimData::read("0 1\n".as_bytes(), "time", &["a"]).unwrap();
        assert!(matches!(data.signal("b"), Err(DataError::UnknownSignal(_))));
    }

    #[test]
    fn test_load_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(CONTROL_DAT.as_bytes())?;
        file.flush()?;
        let data = SimData::load(file.path(), "time", &["clk", "sense_en"])?;
        assert!(!data.is_empty());
        Ok(())
    }

    #[test]
    fn test_from_columns_length_mismatch() {
        let err = SimData::from_columns(
            "time",
            vec![0.0, 1.0],
            [(ArcStr::from("y"), vec![0.0])],
        )
        .unwrap_err();
        assert!(matches!(err, DataError::Length { expected: 2, found: 1, .. }));
    }
}
