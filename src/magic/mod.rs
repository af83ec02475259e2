use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use error::{MagicError, Result, StartMagicError};
use log::{debug, info};
use serde::Serialize;
use tera::Context;

use crate::TEMPLATES;

pub mod error;

pub const DEFAULT_TECH: &str = "sky130A";
pub const DEFAULT_DISPLAY: &str = "XR";

/// A builder used to construct a [`MagicRunner`].
///
/// # Example
///
/// ```
/// use sram22_tools::magic::MagicBuilder;
/// let runner = MagicBuilder::new().cwd("/path/to/cwd").tech("sky130A").build();
/// ```
pub struct MagicBuilder {
    cwd: Option<PathBuf>,
    tech: Option<String>,
    magic: Option<PathBuf>,
    display: String,
}

impl MagicBuilder {
    /// Creates a new [`MagicBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current working directory in which to start MAGIC.
    ///
    /// Cells are loaded from, and images written to, this directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_owned());
        self
    }

    /// Set the name of the technology for MAGIC to use.
    pub fn tech(mut self, tech: &str) -> Self {
        self.tech = Some(tech.to_owned());
        self
    }

    /// Set a path to the MAGIC binary.
    ///
    /// If not specified, the binary will be found by
    /// searching your operating system's path.
    pub fn magic(mut self, magic: impl AsRef<Path>) -> Self {
        self.magic = Some(magic.as_ref().to_owned());
        self
    }

    /// Set the graphics display type passed to `-d`.
    ///
    /// The default is `XR`, which `plot svg` requires.
    pub fn display(mut self, display: &str) -> Self {
        self.display = display.to_owned();
        self
    }

    /// Consumes the builder, returning a [`MagicRunner`].
    pub fn build(self) -> MagicRunner {
        MagicRunner {
            cwd: self.cwd,
            tech: self.tech,
            magic: self.magic.unwrap_or_else(|| PathBuf::from("magic")),
            display: self.display,
        }
    }
}

impl Default for MagicBuilder {
    fn default() -> Self {
        Self {
            cwd: None,
            tech: None,
            magic: None,
            display: DEFAULT_DISPLAY.to_string(),
        }
    }
}

/// Runs batch scripts through MAGIC.
///
/// Each script runs in a fresh MAGIC process that reads commands
/// from standard input and exits on `quit -noprompt`.
#[derive(Debug, Clone)]
pub struct MagicRunner {
    cwd: Option<PathBuf>,
    tech: Option<String>,
    magic: PathBuf,
    display: String,
}

#[derive(Debug, Clone, Serialize)]
struct PlotScript<'a> {
    cell: &'a str,
    output: &'a str,
}

/// Renders the batch script that plots the top cell of `cell` to `output` as SVG.
pub fn plot_svg_script(cell: &str, output: &str) -> Result<String> {
    let params = PlotScript { cell, output };
    Ok(TEMPLATES.render("plot_svg.tcl", &Context::from_serialize(params)?)?)
}

impl MagicRunner {
    pub(crate) fn command(&self) -> Command {
        let mut cmd = Command::new(&self.magic);

        if let Some(ref tech) = self.tech {
            cmd.arg("-T").arg(tech);
        }
        cmd.arg("-d").arg(&self.display).arg("-noconsole");

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    /// Directory in which MAGIC runs, if one was configured.
    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Runs `script` to completion, returning MAGIC's standard output.
    pub fn run_script(&self, script: &str) -> Result<String> {
        let mut cmd = self.command();
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("running {:?}", cmd);
        let mut child = cmd
            .spawn()
            .map_err(|e| StartMagicError::Spawn(Box::new(e)))?;
        let mut stdin = child.stdin.take().ok_or_else(|| {
            StartMagicError::Connect(String::from("failed to obtain handle to magic stdin"))
        })?;
        stdin.write_all(script.as_bytes())?;
        // Closing stdin lets magic exit even if the script omits `quit`.
        drop(stdin);

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(MagicError::Exit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Plots the layout of `cell` to the SVG file `output`.
    ///
    /// Relative output paths are resolved against the working directory
    /// of the MAGIC process. Returns the path of the written image.
    pub fn render_svg(&self, cell: &str, output: impl AsRef<Path>) -> Result<PathBuf> {
        let output = output.as_ref();
        let output_str = output.to_string_lossy();
        let script = plot_svg_script(cell, &output_str)?;

        info!("plotting {cell} to {output:?}");
        self.run_script(&script)?;

        let path = match self.cwd {
            Some(ref cwd) if output.is_relative() => cwd.join(output),
            _ => output.to_owned(),
        };
        if !path.exists() {
            return Err(MagicError::MissingOutput(path));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use super::error::{MagicError, StartMagicError};
    use super::*;

    #[test]
    fn test_builder_api() {
        let runner = MagicBuilder::new()
            .cwd("/path/to/cwd")
            .tech("sky130A")
            .magic("/usr/local/bin/magic")
            .build();
        let cmd = runner.command();
        assert_eq!(cmd.get_program(), OsStr::new("/usr/local/bin/magic"));
        let args = cmd.get_args().collect::<Vec<_>>();
        assert_eq!(args, ["-T", "sky130A", "-d", "XR", "-noconsole"]);
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/path/to/cwd")));
        assert_eq!(runner.cwd(), Some(Path::new("/path/to/cwd")));
    }

    #[test]
    fn test_default_display_and_binary() {
        let runner = MagicBuilder::new().display("null").build();
        let cmd = runner.command();
        assert_eq!(cmd.get_program(), OsStr::new("magic"));
        let args = cmd.get_args().collect::<Vec<_>>();
        assert_eq!(args, ["-d", "null", "-noconsole"]);
    }

    #[test]
    fn test_plot_svg_script() {
        let script = plot_svg_script("sram_16x16", "sram_16x16.svg").unwrap();
        let lines = script.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            [
                "load sram_16x16.mag",
                "select top cell",
                "expand",
                "findbox zoom",
                "select clear",
                "plot svg sram_16x16.svg",
                "quit -noprompt",
            ]
        );
    }

    #[test]
    fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MagicBuilder::new()
            .magic(dir.path().join("no_such_magic"))
            .build();
        let err = runner.render_svg("inv_dec", "inv_dec.svg").unwrap_err();
        assert!(matches!(
            err,
            MagicError::Start(StartMagicError::Spawn(_))
        ));
    }
}
