//! Netlisting of VLSIR circuit packages to SPICE-family text.

use std::collections::HashMap;
use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::info;
use vlsir::circuit::connection::Stype;
use vlsir::circuit::parameter_value::Value;
use vlsir::circuit::{
    Connection, ExternalModule, Instance, Module, Package, Parameter, ParameterValue, Port, Signal,
};
use vlsir::reference::To;
use vlsir::spice::SimInput;
use vlsir::QualifiedName;

use crate::bus_bit;
use crate::cli::progress::StepContext;
use crate::paths::{cell_name_from_bin, ngspice_dir, out_bin, out_spice, pb_dir, spice_dir};

pub use error::{NetlistError, Result};
pub use prelude::Prelude;

pub mod error;
pub mod prelude;

/// Domains whose external modules are simulator-native elements.
pub const PRIMITIVE_DOMAINS: [&str; 2] = ["vlsir.primitives", "primitives"];

/// Terminals of every primitive element, in netlist order.
const PRIMITIVE_PORTS: [&str; 2] = ["p", "n"];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum NetlistFormat {
    #[default]
    Spice,
    Ngspice,
    Spectre,
}

impl NetlistFormat {
    fn comment(&self) -> &'static str {
        match self {
            NetlistFormat::Spectre => "//",
            _ => "*",
        }
    }

    /// Conventional file extension for netlists of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            NetlistFormat::Spectre => "scs",
            _ => "spice",
        }
    }
}

impl std::str::FromStr for NetlistFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spice" => Ok(NetlistFormat::Spice),
            "ngspice" => Ok(NetlistFormat::Ngspice),
            "spectre" => Ok(NetlistFormat::Spectre),
            _ => Err(format!("unknown netlist format `{s}`")),
        }
    }
}

impl Display for NetlistFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NetlistFormat::Spice => "spice",
            NetlistFormat::Ngspice => "ngspice",
            NetlistFormat::Spectre => "spectre",
        };
        write!(f, "{s}")
    }
}

/// A simulator-native element.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Primitive {
    Resistor,
    Capacitor,
    Inductor,
    Vdc,
    Isource,
}

impl Primitive {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "resistor" => Primitive::Resistor,
            "capacitor" => Primitive::Capacitor,
            "inductor" => Primitive::Inductor,
            "vdc" => Primitive::Vdc,
            "isource" => Primitive::Isource,
            _ => return None,
        })
    }

    /// SPICE element prefix and the parameter holding the element's value.
    fn spice(&self) -> (&'static str, &'static str) {
        match self {
            Primitive::Resistor => ("R", "r"),
            Primitive::Capacitor => ("C", "c"),
            Primitive::Inductor => ("L", "l"),
            Primitive::Vdc => ("V", "dc"),
            Primitive::Isource => ("I", "dc"),
        }
    }

    fn spectre(&self) -> &'static str {
        match self {
            Primitive::Resistor => "resistor",
            Primitive::Capacitor => "capacitor",
            Primitive::Inductor => "inductor",
            Primitive::Vdc => "vsource type=dc",
            Primitive::Isource => "isource type=dc",
        }
    }

    fn is_source(&self) -> bool {
        matches!(self, Primitive::Vdc | Primitive::Isource)
    }
}

/// Names of the individual bits of a signal `width` bits wide.
fn signal_bits(name: &str, width: i64) -> Vec<String> {
    if width <= 1 {
        vec![name.to_string()]
    } else {
        (0..width as usize).map(|i| bus_bit(name, i)).collect()
    }
}

fn port_signal(port: &Port) -> Result<&Signal> {
    port.signal
        .as_ref()
        .ok_or_else(|| NetlistError::MissingField("port signal".to_string()))
}

fn port_bits(ports: &[Port]) -> Result<Vec<String>> {
    let mut bits = Vec::new();
    for port in ports {
        let sig = port_signal(port)?;
        bits.extend(signal_bits(&sig.name, sig.width));
    }
    Ok(bits)
}

/// The module an instance refers to.
#[derive(Clone, Copy)]
enum Target<'a> {
    Local(&'a Module),
    External(&'a ExternalModule),
    Primitive(Primitive),
}

impl<'a> Target<'a> {
    fn ports(self) -> &'a [Port] {
        match self {
            Target::Local(m) => &m.ports,
            Target::External(e) => &e.ports,
            Target::Primitive(_) => &[],
        }
    }
}

pub struct NetlistWriter<'a, W>
where
    W: Write,
{
    sink: W,
    fmt: NetlistFormat,
    pkg: &'a Package,
    modules: HashMap<&'a str, &'a Module>,
    ext_modules: HashMap<(&'a str, &'a str), &'a ExternalModule>,
}

impl<'a, W> NetlistWriter<'a, W>
where
    W: Write,
{
    pub fn new(pkg: &'a Package, fmt: NetlistFormat, sink: W) -> Self {
        let modules = pkg.modules.iter().map(|m| (m.name.as_str(), m)).collect();
        let ext_modules = pkg
            .ext_modules
            .iter()
            .filter_map(|e| {
                let qn = e.name.as_ref()?;
                Some(((qn.domain.as_str(), qn.name.as_str()), e))
            })
            .collect();
        Self {
            sink,
            fmt,
            pkg,
            modules,
            ext_modules,
        }
    }

    /// Writes a header followed by every module of the package, in order.
    pub fn netlist(&mut self) -> Result<()> {
        let c = self.fmt.comment();
        if self.fmt == NetlistFormat::Spectre {
            writeln!(self.sink, "simulator lang=spectre")?;
        }
        writeln!(self.sink, "{c} {}", self.pkg.domain)?;
        if !self.pkg.desc.is_empty() {
            writeln!(self.sink, "{c} {}", self.pkg.desc)?;
        }
        writeln!(self.sink)?;

        let pkg = self.pkg;
        for module in pkg.modules.iter() {
            self.write_module(module)?;
            writeln!(self.sink)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }

    fn write_module(&mut self, module: &Module) -> Result<()> {
        let ports = port_bits(&module.ports)?;
        let params = module
            .parameters
            .iter()
            .map(|p| self.format_default(p))
            .collect::<Result<Vec<_>>>()?;

        match self.fmt {
            NetlistFormat::Spice | NetlistFormat::Ngspice => {
                writeln!(self.sink, ".SUBCKT {}", module.name)?;
                if !ports.is_empty() {
                    writeln!(self.sink, "+ {}", ports.join(" "))?;
                }
                if !params.is_empty() {
                    let kw = if self.fmt == NetlistFormat::Spice {
                        "PARAMS: "
                    } else {
                        ""
                    };
                    writeln!(self.sink, "+ {kw}{}", params.join(" "))?;
                }
            }
            NetlistFormat::Spectre => {
                writeln!(self.sink, "subckt {} ({})", module.name, ports.join(" "))?;
                if !params.is_empty() {
                    writeln!(self.sink, "parameters {}", params.join(" "))?;
                }
            }
        }

        let widths = module
            .ports
            .iter()
            .map(port_signal)
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .chain(module.signals.iter())
            .map(|s| (s.name.as_str(), s.width))
            .collect::<HashMap<_, _>>();

        for inst in module.instances.iter() {
            self.write_instance(module, &widths, inst)?;
        }

        match self.fmt {
            NetlistFormat::Spice | NetlistFormat::Ngspice => writeln!(self.sink, ".ENDS")?,
            NetlistFormat::Spectre => writeln!(self.sink, "ends {}", module.name)?,
        }
        Ok(())
    }

    fn resolve(&self, inst: &Instance) -> Result<Target<'a>> {
        let to = inst
            .module
            .as_ref()
            .and_then(|r| r.to.as_ref())
            .ok_or_else(|| NetlistError::MissingField(format!("module of instance `{}`", inst.name)))?;
        match to {
            To::Local(name) => self
                .modules
                .get(name.as_str())
                .copied()
                .map(Target::Local)
                .ok_or_else(|| NetlistError::UnknownModule(name.clone())),
            To::External(QualifiedName { domain, name }) => {
                if PRIMITIVE_DOMAINS.contains(&domain.as_str()) {
                    return Primitive::from_name(name)
                        .map(Target::Primitive)
                        .ok_or_else(|| NetlistError::UnsupportedPrimitive(name.clone()));
                }
                self.ext_modules
                    .get(&(domain.as_str(), name.as_str()))
                    .copied()
                    .map(Target::External)
                    .ok_or_else(|| NetlistError::UnknownExternalModule {
                        domain: domain.clone(),
                        name: name.clone(),
                    })
            }
        }
    }

    fn write_instance(
        &mut self,
        parent: &Module,
        widths: &HashMap<&str, i64>,
        inst: &Instance,
    ) -> Result<()> {
        let target = self.resolve(inst)?;

        let conns = match target {
            Target::Primitive(_) => {
                check_ports(inst, |name| PRIMITIVE_PORTS.iter().any(|p| *p == name))?;
                PRIMITIVE_PORTS
                    .into_iter()
                    .map(|port| self.connect(parent, widths, inst, port, 1))
                    .flatten_ok()
                    .collect::<Result<Vec<_>>>()?
            }
            _ => {
                let ports = target.ports();
                check_ports(inst, |name| {
                    ports
                        .iter()
                        .any(|p| p.signal.as_ref().map(|s| s.name.as_str()) == Some(name))
                })?;
                let mut conns = Vec::new();
                for port in ports {
                    let sig = port_signal(port)?;
                    conns.extend(self.connect(parent, widths, inst, &sig.name, sig.width)?);
                }
                conns
            }
        };

        match target {
            Target::Primitive(prim) => self.write_primitive(prim, inst, &conns),
            Target::Local(m) => self.write_subckt_instance(&m.name, inst, &conns),
            Target::External(e) => {
                let name = e.name.as_ref().map(|qn| qn.name.as_str()).unwrap_or_default();
                self.write_subckt_instance(name, inst, &conns)
            }
        }
    }

    /// Bits connected to port `port` of `inst`, checked against the port width.
    fn connect(
        &self,
        parent: &Module,
        widths: &HashMap<&str, i64>,
        inst: &Instance,
        port: &str,
        width: i64,
    ) -> Result<Vec<String>> {
        let conn = inst
            .connections
            .get(port)
            .ok_or_else(|| NetlistError::MissingConnection {
                inst: inst.name.clone(),
                port: port.to_string(),
            })?;
        let bits = connection_bits(parent, widths, conn)?;
        let expected = width.max(1) as usize;
        if bits.len() != expected {
            return Err(NetlistError::WidthMismatch {
                inst: inst.name.clone(),
                port: port.to_string(),
                expected,
                found: bits.len(),
            });
        }
        Ok(bits)
    }

    /// Instance parameters as sorted `name=value` pairs, skipping `skip`.
    fn instance_params(&self, inst: &Instance, skip: Option<&str>) -> Result<Vec<String>> {
        inst.parameters
            .iter()
            .filter(|(name, _)| Some(name.as_str()) != skip)
            .sorted_by(|a, b| a.0.cmp(b.0))
            .map(|(name, value)| Ok(format!("{name}={}", self.format_value(name, value)?)))
            .collect()
    }

    fn write_subckt_instance(&mut self, module: &str, inst: &Instance, conns: &[String]) -> Result<()> {
        let params = self.instance_params(inst, None)?;

        match self.fmt {
            NetlistFormat::Spice | NetlistFormat::Ngspice => {
                writeln!(self.sink, "x{}", inst.name)?;
                if !conns.is_empty() {
                    writeln!(self.sink, "+ {}", conns.join(" "))?;
                }
                writeln!(self.sink, "+ {module}")?;
                if !params.is_empty() {
                    writeln!(self.sink, "+ {}", params.join(" "))?;
                }
            }
            NetlistFormat::Spectre => {
                write!(self.sink, "  {} ({}) {module}", inst.name, conns.join(" "))?;
                for param in params {
                    write!(self.sink, " {param}")?;
                }
                writeln!(self.sink)?;
            }
        }
        Ok(())
    }

    fn write_primitive(&mut self, prim: Primitive, inst: &Instance, conns: &[String]) -> Result<()> {
        let (prefix, key) = prim.spice();
        let value = inst
            .parameters
            .get(key)
            .ok_or_else(|| NetlistError::MissingParameter {
                inst: inst.name.clone(),
                param: key.to_string(),
            })?;
        let value = self.format_value(key, value)?;
        let params = self.instance_params(inst, Some(key))?;

        match self.fmt {
            NetlistFormat::Spice | NetlistFormat::Ngspice => {
                let dc = if prim.is_source() { "dc " } else { "" };
                write!(self.sink, "{prefix}{} {} {dc}{value}", inst.name, conns.join(" "))?;
            }
            NetlistFormat::Spectre => {
                write!(
                    self.sink,
                    "  {} ({}) {} {key}={value}",
                    inst.name,
                    conns.join(" "),
                    prim.spectre()
                )?;
            }
        }
        for param in params {
            write!(self.sink, " {param}")?;
        }
        writeln!(self.sink)?;
        Ok(())
    }

    fn format_default(&self, param: &Parameter) -> Result<String> {
        let value = param
            .default
            .as_ref()
            .ok_or_else(|| NetlistError::EmptyParameter(param.name.clone()))?;
        Ok(format!("{}={}", param.name, self.format_value(&param.name, value)?))
    }

    fn format_value(&self, name: &str, value: &ParameterValue) -> Result<String> {
        let value = value
            .value
            .as_ref()
            .ok_or_else(|| NetlistError::EmptyParameter(name.to_string()))?;
        Ok(match value {
            Value::Integer(i) => i.to_string(),
            Value::Double(x) => format_double(name, *x)?,
            Value::String(s) => format!("\"{s}\""),
            Value::Literal(lit) => match self.fmt {
                NetlistFormat::Spice => format!("'{lit}'"),
                NetlistFormat::Ngspice => format!("{{{lit}}}"),
                NetlistFormat::Spectre => lit.clone(),
            },
        })
    }
}

/// Errors if `inst` connects a port for which `known` is false.
fn check_ports(inst: &Instance, known: impl Fn(&str) -> bool) -> Result<()> {
    match inst.connections.keys().find(|name| !known(name.as_str())) {
        Some(name) => Err(NetlistError::UnknownPort {
            inst: inst.name.clone(),
            port: name.clone(),
        }),
        None => Ok(()),
    }
}

/// Formats a real number so SPICE-family parsers accept it.
///
/// Very large and very small magnitudes use exponent notation.
fn format_double(name: &str, x: f64) -> Result<String> {
    if !x.is_finite() {
        return Err(NetlistError::NonFinite {
            param: name.to_string(),
            value: x,
        });
    }
    let mag = x.abs();
    if mag == 0.0 || (1e-3..1e6).contains(&mag) {
        Ok(x.to_string())
    } else {
        Ok(format!("{x:e}"))
    }
}

/// Flattens a connection into individual bits, LSB first.
fn connection_bits(
    parent: &Module,
    widths: &HashMap<&str, i64>,
    conn: &Connection,
) -> Result<Vec<String>> {
    let width_of = |name: &str| {
        widths
            .get(name)
            .copied()
            .ok_or_else(|| NetlistError::UnknownSignal {
                module: parent.name.clone(),
                signal: name.to_string(),
            })
    };

    let stype = conn
        .stype
        .as_ref()
        .ok_or_else(|| NetlistError::MissingField("connection".to_string()))?;
    match stype {
        Stype::Sig(sig) => Ok(signal_bits(&sig.name, width_of(&sig.name)?)),
        Stype::Slice(slice) => {
            let width = width_of(&slice.signal)?;
            if slice.bot < 0 || slice.bot > slice.top || slice.top >= width.max(1) {
                return Err(NetlistError::InvalidSlice {
                    signal: slice.signal.clone(),
                    top: slice.top,
                    bot: slice.bot,
                });
            }
            if width <= 1 {
                return Ok(vec![slice.signal.clone()]);
            }
            Ok((slice.bot..=slice.top)
                .map(|i| bus_bit(&slice.signal, i as usize))
                .collect())
        }
        Stype::Concat(concat) => {
            let mut bits = Vec::new();
            for part in concat.parts.iter() {
                bits.extend(connection_bits(parent, widths, part)?);
            }
            Ok(bits)
        }
    }
}

/// Netlists every module of `pkg` to `dest`, returning the sink.
pub fn netlist<W: Write>(pkg: &Package, dest: W, fmt: NetlistFormat) -> Result<W> {
    let mut writer = NetlistWriter::new(pkg, fmt, dest);
    writer.netlist()?;
    writer.finish()
}

/// Reads a serialized `SimInput`.
pub fn read_sim_input(path: impl AsRef<Path>) -> Result<SimInput> {
    let bytes = std::fs::read(path)?;
    vlsir::conv::from_bytes(&bytes).map_err(|e| NetlistError::Decode(e.to_string()))
}

/// Netlists the package in the serialized `SimInput` at `input` to `output`,
/// preceded by `prelude`.
///
/// `output` is only written once netlisting succeeds.
pub fn write_netlist(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    fmt: NetlistFormat,
    prelude: &Prelude,
) -> Result<()> {
    let input = read_sim_input(input)?;
    let pkg = input.pkg.as_ref().ok_or(NetlistError::MissingPackage)?;

    let mut buf = Vec::new();
    prelude.write_to(&mut buf)?;
    let buf = netlist(pkg, buf, fmt)?;

    let output = output.as_ref();
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, buf)?;
    Ok(())
}

/// Names of every cell with a serialized circuit in `build_dir/pb`, sorted.
pub fn available_cells(build_dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let mut cells = std::fs::read_dir(pb_dir(build_dir))?
        .map(|entry| Ok::<_, NetlistError>(cell_name_from_bin(entry?.path())))
        .filter_map_ok(|name| name)
        .collect::<Result<Vec<_>>>()?;
    cells.sort();
    Ok(cells)
}

pub fn netlist_step(cell: &str) -> String {
    format!("Netlist {cell}")
}

/// Writes ngspice and commercial-SPICE netlists for each of `cells`.
///
/// Reads `<build_dir>/pb/<cell>.pb.bin`, then writes
/// `<build_dir>/ngspice/<cell>.spice` and `<build_dir>/spice/<cell>.spice`,
/// the latter preceded by the SKY130 commercial conversion prelude. If
/// `cells` is empty, every serialized circuit in `pb/` is netlisted.
pub fn netlist_all<S: AsRef<str>>(
    build_dir: impl AsRef<Path>,
    cells: &[S],
    mut ctx: Option<&mut StepContext>,
) -> crate::Result<Vec<PathBuf>> {
    let build_dir = build_dir.as_ref();
    let cells = if cells.is_empty() {
        available_cells(build_dir)?
    } else {
        cells.iter().map(|c| c.as_ref().to_string()).collect()
    };

    let targets = [
        (ngspice_dir(build_dir), NetlistFormat::Ngspice, Prelude::None),
        (spice_dir(build_dir), NetlistFormat::Spice, Prelude::Sky130Commercial),
    ];

    let mut written = Vec::with_capacity(2 * cells.len());
    for cell in cells.iter() {
        info!("Generating {cell}...");
        let input = out_bin(pb_dir(build_dir), cell);
        for (dir, fmt, prelude) in targets.iter() {
            let output = out_spice(dir, cell);
            write_netlist(&input, &output, *fmt, prelude)?;
            info!("\t{fmt}");
            written.push(output);
        }
        if let Some(ctx) = ctx.as_deref_mut() {
            ctx.finish(&netlist_step(cell))?;
        }
    }
    Ok(written)
}
