use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;

use crate::cli::progress::StepContext;
use crate::config::RenderConfig;
use crate::magic::{MagicBuilder, MagicRunner};
use crate::paths::out_svg;
use crate::{anyhow, Result};

/// Name of the image written by [`watch`].
pub const WATCH_SVG: &str = "out.svg";

pub const STEP_GENERATE: &str = "Run generator";
pub const STEP_COPY: &str = "Copy images to docs";

pub fn render_step(cell: &str) -> String {
    format!("Render {cell}")
}

/// Steps performed by [`render_docs`], paired with whether each is enabled.
pub fn render_steps(config: &RenderConfig) -> Vec<(String, bool)> {
    let mut steps = vec![(STEP_GENERATE.to_string(), config.generator.is_some())];
    steps.extend(config.cells.iter().map(|cell| (render_step(cell), true)));
    steps.push((STEP_COPY.to_string(), config.docs_dir.is_some()));
    steps
}

/// Runs the layout generator command, e.g. `cargo run --release -- <config>`.
pub fn run_generator(command: &[String], cwd: Option<&Path>) -> Result<()> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow!("generator command is empty"))?;

    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }

    info!("running generator: {}", command.join(" "));
    let status = cmd
        .status()
        .map_err(|e| anyhow!("failed to start generator `{program}`: {e}"))?;
    if !status.success() {
        return Err(anyhow!("generator exited with {status}"));
    }
    Ok(())
}

pub fn magic_runner(config: &RenderConfig) -> MagicRunner {
    let mut builder = MagicBuilder::new()
        .tech(&config.tech)
        .cwd(&config.build_dir);
    if let Some(ref magic) = config.magic {
        builder = builder.magic(magic);
    }
    builder.build()
}

/// Copies rendered images into `docs_dir`, creating it if needed.
pub fn copy_to_docs(images: &[PathBuf], docs_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let docs_dir = docs_dir.as_ref();
    std::fs::create_dir_all(docs_dir)?;

    let mut copied = Vec::with_capacity(images.len());
    for image in images {
        let name = image
            .file_name()
            .ok_or_else(|| anyhow!("image path {image:?} has no file name"))?;
        let dest = docs_dir.join(name);
        std::fs::copy(image, &dest)?;
        copied.push(dest);
    }
    Ok(copied)
}

/// Renders every configured cell to `<cell>.svg` in the build directory,
/// copying the images to the docs directory if one is configured.
///
/// Returns the final locations of the images.
pub fn render_docs(
    config: &RenderConfig,
    mut ctx: Option<&mut StepContext>,
) -> Result<Vec<PathBuf>> {
    if let Some(ref generator) = config.generator {
        run_generator(generator, None)?;
        if let Some(ctx) = ctx.as_deref_mut() {
            ctx.finish(STEP_GENERATE)?;
        }
    }

    let runner = magic_runner(config);
    let mut images = Vec::with_capacity(config.cells.len());
    for cell in config.cells.iter() {
        images.push(runner.render_svg(cell, out_svg("", cell))?);
        if let Some(ctx) = ctx.as_deref_mut() {
            ctx.finish(&render_step(cell))?;
        }
    }

    if let Some(ref docs_dir) = config.docs_dir {
        images = copy_to_docs(&images, docs_dir)?;
        if let Some(ctx) = ctx.as_deref_mut() {
            ctx.finish(STEP_COPY)?;
        }
    }
    Ok(images)
}

/// Regenerates the layout and plots `cell` to [`WATCH_SVG`] in the build directory.
pub fn watch(config: &RenderConfig, cell: &str) -> Result<PathBuf> {
    if let Some(ref generator) = config.generator {
        run_generator(generator, None)?;
    }
    let path = magic_runner(config).render_svg(cell, WATCH_SVG)?;
    Ok(std::fs::canonicalize(path)?)
}

/// Opens `path` with the platform's default viewer.
pub fn open_file(path: impl AsRef<Path>) -> Result<()> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    let path = path.as_ref();
    info!("opening {path:?}");
    Command::new(opener)
        .arg(path)
        .spawn()
        .map_err(|e| anyhow!("failed to run `{opener}`: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_generator() {
        assert!(run_generator(&[], None).is_err());
    }

    #[test]
    fn test_failing_generator() {
        let cmd = vec!["false".to_string()];
        assert!(run_generator(&cmd, None).is_err());
    }

    #[test]
    fn test_copy_to_docs() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let build = dir.path().join("_build");
        std::fs::create_dir_all(&build)?;
        let images = ["sram_sp_cell", "colend"]
            .into_iter()
            .map(|cell| {
                let path = out_svg(&build, cell);
                std::fs::write(&path, "<svg/>")?;
                Ok(path)
            })
            .collect::<Result<Vec<_>>>()?;

        let docs = dir.path().join("docs/images");
        let copied = copy_to_docs(&images, &docs)?;
        assert_eq!(copied.len(), 2);
        assert_eq!(copied[0], docs.join("sram_sp_cell.svg"));
        assert_eq!(std::fs::read_to_string(&copied[1])?, "<svg/>");
        Ok(())
    }

    #[test]
    fn test_render_steps() {
        let config = RenderConfig {
            tech: "sky130A".to_string(),
            build_dir: PathBuf::from("_build"),
            cells: vec!["sram_sp_cell".to_string(), "colend".to_string()],
            docs_dir: Some(PathBuf::from("docs/images")),
            generator: None,
            magic: None,
        };
        let steps = render_steps(&config);
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0], (STEP_GENERATE.to_string(), false));
        assert_eq!(steps[1], ("Render sram_sp_cell".to_string(), true));
        assert_eq!(steps[3], (STEP_COPY.to_string(), true));
    }

    #[test]
    fn test_render_docs_without_magic() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = RenderConfig {
            tech: "sky130A".to_string(),
            build_dir: dir.path().to_owned(),
            cells: vec!["corner".to_string()],
            docs_dir: None,
            generator: None,
            magic: Some(dir.path().join("not_magic")),
        };
        assert!(render_docs(&config, None).is_err());
        Ok(())
    }
}
