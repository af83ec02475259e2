use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tera::Context;

use super::error::Result;
use crate::TEMPLATES;

/// Text written ahead of a netlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Prelude {
    #[default]
    None,
    /// Wraps the open-source SKY130 device names around the models of the
    /// commercial SKY130 PDK.
    Sky130Commercial,
    /// Copies the contents of a file.
    File(PathBuf),
}

#[derive(Serialize)]
struct Device {
    name: &'static str,
    model: &'static str,
}

/// Open-source device names and the commercial models they map to.
const SKY130_DEVICES: [(&str, &str); 6] = [
    ("sky130_fd_pr__special_nfet_pass", "npass"),
    ("sky130_fd_pr__special_nfet_latch", "npd"),
    ("sky130_fd_pr__nfet_01v8", "nshort"),
    ("sky130_fd_pr__pfet_01v8", "pshort"),
    ("sky130_fd_pr__special_pfet_pass", "ppu"),
    ("sky130_fd_pr__pfet_01v8_hvt", "phighvt"),
];

pub fn sky130_commercial_prelude() -> Result<String> {
    let devices = SKY130_DEVICES
        .iter()
        .map(|&(name, model)| Device { name, model })
        .collect::<Vec<_>>();
    let mut ctx = Context::new();
    ctx.insert("devices", &devices);
    Ok(TEMPLATES.render("sky130_prelude.spice", &ctx)?)
}

impl Prelude {
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        match self {
            Prelude::None => {}
            Prelude::Sky130Commercial => w.write_all(sky130_commercial_prelude()?.as_bytes())?,
            Prelude::File(path) => w.write_all(&std::fs::read(path)?)?,
        }
        Ok(())
    }
}
