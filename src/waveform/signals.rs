use super::error::{DataError, Result};
use crate::bus_bit;

/// Widest bus that shorthand may expand to.
pub const MAX_BUS_WIDTH: usize = 65536;

/// Expands bus shorthand in a list of signal names.
///
/// `name[hi:lo]` expands to `name_hi, ..., name_lo` in the order written,
/// and `name[i]` becomes `name_i`. Other names pass through unchanged.
pub fn expand_signals<S: AsRef<str>>(signals: &[S]) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for signal in signals {
        expand_one(signal.as_ref(), &mut out)?;
    }
    Ok(out)
}

fn expand_one(signal: &str, out: &mut Vec<String>) -> Result<()> {
    let (name, range) = match signal.strip_suffix(']').and_then(|s| s.split_once('[')) {
        Some(parts) => parts,
        None => {
            out.push(signal.to_string());
            return Ok(());
        }
    };

    let bad = || DataError::Bus(signal.to_string());
    if name.is_empty() {
        return Err(bad());
    }

    let parse = |s: &str| s.trim().parse::<usize>().map_err(|_| bad());
    match range.split_once(':') {
        Some((start, end)) => {
            let (start, end) = (parse(start)?, parse(end)?);
            if start.abs_diff(end) >= MAX_BUS_WIDTH {
                return Err(bad());
            }
            if start >= end {
                out.extend((end..=start).rev().map(|i| bus_bit(name, i)));
            } else {
                out.extend((start..=end).map(|i| bus_bit(name, i)));
            }
        }
        None => out.push(bus_bit(name, parse(range)?)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_plain() {
        let sigs = expand_signals(&["clk", "sae_in"]).unwrap();
        assert_eq!(sigs, ["clk", "sae_in"]);
    }

    #[test]
    fn test_expand_bus() {
        let sigs = expand_signals(&["addr[2:0]", "we", "wl[1]", "f[0:2]"]).unwrap();
        assert_eq!(
            sigs,
            ["addr_2", "addr_1", "addr_0", "we", "wl_1", "f_0", "f_1", "f_2"]
        );
    }

    #[test]
    fn test_expand_decoder_outputs() {
        let sigs = expand_signals(&["decode[0:127]"]).unwrap();
        assert_eq!(sigs.len(), 128);
        assert_eq!(sigs[127], "decode_127");
    }

    #[test]
    fn test_bad_bus() {
        assert!(matches!(
            expand_signals(&["addr[a:0]"]),
            Err(DataError::Bus(_))
        ));
        assert!(matches!(expand_signals(&["[3:0]"]), Err(DataError::Bus(_))));
    }

    #[test]
    fn test_bus_width_limit() {
        assert!(matches!(
            expand_signals(&["a[0:18446744073709551615]"]),
            Err(DataError::Bus(_))
        ));
        let sigs = expand_signals(&["a[65535:0]"]).unwrap();
        assert_eq!(sigs.len(), MAX_BUS_WIDTH);
        assert!(matches!(
            expand_signals(&["a[0:65536]"]),
            Err(DataError::Bus(_))
        ));
    }
}
