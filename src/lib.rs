pub use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use tera::Tera;

pub mod analysis;
pub mod cli;
pub mod config;
pub mod gds;
pub mod magic;
pub mod netlist;
pub mod paths;
pub mod plot;
pub mod protos;
pub mod render;
pub mod testbench;
pub mod waveform;

lazy_static! {
    pub static ref TEMPLATES: Tera =
        match Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/*")) {
            Ok(t) => t,
            Err(e) => panic!("Error parsing templates: {e}"),
        };
}

/// Name of bit `index` of bus `name`, as it appears in netlists and
/// simulator output.
pub fn bus_bit(name: &str, index: usize) -> String {
    format!("{name}_{index}")
}

#[cfg(test)]
pub mod tests {
    use plotters::style::IntoFont;

    /// Whether the system has a font plotters can lay text out with.
    /// Rendering tests skip themselves when it does not.
    pub(crate) fn fonts_available() -> bool {
        let available = ("sans-serif", 12).into_font().layout_box("0").is_ok();
        if !available {
            eprintln!("no usable system font; skipping plot rendering");
        }
        available
    }

    #[test]
    fn test_bus_bit() {
        assert_eq!(super::bus_bit("addr", 3), "addr_3");
    }
}
