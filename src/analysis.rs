use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LOW_THRESHOLD: f64 = 0.2;
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.8;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("time and value arrays differ in length ({0} vs {1})")]
    LengthMismatch(usize, usize),

    #[error("waveform is empty")]
    Empty,

    #[error("waveform is flat; cannot normalize")]
    Flat,

    #[error("waveform never crosses the {0} threshold")]
    NoCrossing(&'static str),

    #[error("thresholds must satisfy 0 <= low < high <= 1 (got {low}, {high})")]
    Thresholds { low: f64, high: f64 },

    #[error("frequency points must be nonzero")]
    ZeroFrequency,
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionTimes {
    pub tr: f64,
    pub tf: f64,
}

fn normalize(t: &[f64], v: &[f64], low: f64, high: f64) -> Result<Vec<f64>> {
    if t.len() != v.len() {
        return Err(AnalysisError::LengthMismatch(t.len(), v.len()));
    }
    if v.is_empty() {
        return Err(AnalysisError::Empty);
    }
    if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&high) || low >= high {
        return Err(AnalysisError::Thresholds { low, high });
    }

    let max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = v.iter().copied().fold(f64::INFINITY, f64::min);
    if max <= min {
        return Err(AnalysisError::Flat);
    }

    Ok(v.iter().map(|x| (x - min) / (max - min)).collect())
}

/// Time for `v` to rise from `low` to `high`, as fractions of its full swing.
///
/// The end point is the first sample at or above `high`; the start point is
/// the last sample at or below `low` preceding it.
pub fn rise_time(t: &[f64], v: &[f64], low: f64, high: f64) -> Result<f64> {
    let vnorm = normalize(t, v, low, high)?;

    let i_high = vnorm
        .iter()
        .position(|&x| x >= high)
        .ok_or(AnalysisError::NoCrossing("high"))?;
    let i_low = vnorm[..i_high]
        .iter()
        .rposition(|&x| x <= low)
        .ok_or(AnalysisError::NoCrossing("low"))?;

    debug_assert!(i_high > i_low);
    Ok(t[i_high] - t[i_low])
}

/// Time for `v` to fall from `high` to `low`, as fractions of its full swing.
///
/// The end point is the first sample at or below `low` that follows a sample
/// at or above `high`; the start point is the last sample at or above `high`
/// preceding it.
pub fn fall_time(t: &[f64], v: &[f64], low: f64, high: f64) -> Result<f64> {
    let vnorm = normalize(t, v, low, high)?;

    let first_high = vnorm
        .iter()
        .position(|&x| x >= high)
        .ok_or(AnalysisError::NoCrossing("high"))?;
    let i_low = first_high
        + vnorm[first_high..]
            .iter()
            .position(|&x| x <= low)
            .ok_or(AnalysisError::NoCrossing("low"))?;
    let i_high = vnorm[..i_low]
        .iter()
        .rposition(|&x| x >= high)
        .unwrap_or(first_high);

    Ok(t[i_low] - t[i_high])
}

/// Rise time with 20% and 80% thresholds.
#[inline]
pub fn rise_time_default(t: &[f64], v: &[f64]) -> Result<f64> {
    rise_time(t, v, DEFAULT_LOW_THRESHOLD, DEFAULT_HIGH_THRESHOLD)
}

/// Fall time with 80% and 20% thresholds.
#[inline]
pub fn fall_time_default(t: &[f64], v: &[f64]) -> Result<f64> {
    fall_time(t, v, DEFAULT_LOW_THRESHOLD, DEFAULT_HIGH_THRESHOLD)
}

/// Rise and fall times of a pulse, with default thresholds.
pub fn transition_times(t: &[f64], v: &[f64]) -> Result<TransitionTimes> {
    Ok(TransitionTimes {
        tr: rise_time_default(t, v)?,
        tf: fall_time_default(t, v)?,
    })
}

/// Average capacitance seen by a 1 V AC source, given the imaginary part of
/// the current it sources at each frequency point.
///
/// Computes `mean(imag / (2 * pi * f))`.
pub fn average_capacitance(freq: &[f64], imag: &[f64]) -> Result<f64> {
    if freq.len() != imag.len() {
        return Err(AnalysisError::LengthMismatch(freq.len(), imag.len()));
    }
    if freq.is_empty() {
        return Err(AnalysisError::Empty);
    }
    if freq.iter().any(|&f| f == 0.0) {
        return Err(AnalysisError::ZeroFrequency);
    }

    let total: f64 = freq
        .iter()
        .zip(imag)
        .map(|(f, i)| i / (2.0 * PI * f))
        .sum();
    Ok(total / freq.len() as f64)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn ramp() -> (Vec<f64>, Vec<f64>) {
        let t = (0..11).map(|i| i as f64 * 1e-10).collect::<Vec<_>>();
        let v = vec![0.0, 0.0, 0.1, 0.3, 0.5, 0.7, 0.9, 1.0, 1.0, 1.0, 1.0]
            .into_iter()
            .map(|x| 1.8 * x)
            .collect::<Vec<_>>();
        (t, v)
    }

    #[test]
    fn test_rise_time() {
        let (t, v) = ramp();
        let tr = rise_time_default(&t, &v).unwrap();
        // Last sample below 20% is at 0.2ns, first above 80% is at 0.6ns.
        assert_relative_eq!(tr, 4e-10, max_relative = 1e-9);
    }

    #[test]
    fn test_fall_time() {
        let (t, mut v) = ramp();
        v.iter_mut().for_each(|x| *x = 1.8 - *x);
        let tf = fall_time_default(&t, &v).unwrap();
        assert_relative_eq!(tf, 4e-10, max_relative = 1e-9);
    }

    #[test]
    fn test_transition_times() {
        let t = (0..11).map(|i| i as f64).collect::<Vec<_>>();
        let v = [0.0, 0.0, 0.1, 0.5, 0.9, 1.0, 1.0, 0.9, 0.5, 0.1, 0.0];
        let times = transition_times(&t, &v).unwrap();
        assert_relative_eq!(times.tr, 2.0);
        assert_relative_eq!(times.tf, 2.0);
    }

    #[test]
    fn test_rise_time_errors() {
        let t = [0.0, 1.0, 2.0];
        assert_eq!(
            rise_time_default(&t, &[1.0, 1.0, 1.0]),
            Err(AnalysisError::Flat)
        );
        assert_eq!(
            rise_time_default(&t, &[1.0, 0.0]),
            Err(AnalysisError::LengthMismatch(3, 2))
        );
        assert_eq!(rise_time_default(&[], &[]), Err(AnalysisError::Empty));
        // Starts high: no sample at or below the low threshold precedes the crossing.
        assert_eq!(
            rise_time_default(&t, &[1.8, 0.0, 1.8]),
            Err(AnalysisError::NoCrossing("low"))
        );
        assert!(matches!(
            rise_time(&t, &[0.0, 1.0, 2.0], 0.9, 0.1),
            Err(AnalysisError::Thresholds { .. })
        ));
    }

    #[test]
    fn test_average_capacitance() {
        let c = 2e-15;
        let freq = [1e6, 1e7, 1e8];
        let imag = freq.map(|f| 2.0 * PI * f * c);
        assert_relative_eq!(
            average_capacitance(&freq, &imag).unwrap(),
            c,
            max_relative = 1e-12
        );
        assert_eq!(
            average_capacitance(&[0.0], &[1.0]),
            Err(AnalysisError::ZeroFrequency)
        );
        assert_eq!(average_capacitance(&[], &[]), Err(AnalysisError::Empty));
    }
}
