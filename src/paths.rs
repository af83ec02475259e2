use std::path::{Path, PathBuf};

pub fn out_bin(work_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    PathBuf::from(work_dir.as_ref()).join(format!("{name}.pb.bin"))
}

pub fn out_spice(work_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    PathBuf::from(work_dir.as_ref()).join(format!("{name}.spice"))
}

pub fn out_svg(work_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    PathBuf::from(work_dir.as_ref()).join(format!("{name}.svg"))
}

pub fn out_png(work_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    PathBuf::from(work_dir.as_ref()).join(format!("{name}.png"))
}

/// Directory holding serialized `SimInput`s within a build directory.
pub fn pb_dir(build_dir: impl AsRef<Path>) -> PathBuf {
    build_dir.as_ref().join("pb")
}

/// Directory holding ngspice netlists within a build directory.
pub fn ngspice_dir(build_dir: impl AsRef<Path>) -> PathBuf {
    build_dir.as_ref().join("ngspice")
}

/// Directory holding generic SPICE netlists within a build directory.
pub fn spice_dir(build_dir: impl AsRef<Path>) -> PathBuf {
    build_dir.as_ref().join("spice")
}

/// Strips the `.pb.bin` suffix from a serialized circuit file name.
pub fn cell_name_from_bin(path: impl AsRef<Path>) -> Option<String> {
    let name = path.as_ref().file_name()?.to_str()?;
    name.strip_suffix(".pb.bin").map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_name_from_bin() {
        assert_eq!(
            cell_name_from_bin("build/pb/decoder_128.pb.bin"),
            Some("decoder_128".to_string())
        );
        assert_eq!(cell_name_from_bin("build/pb/decoder_128.spice"), None);
    }

    #[test]
    fn test_build_dirs() {
        assert_eq!(pb_dir("build"), PathBuf::from("build/pb"));
        assert_eq!(
            out_spice(ngspice_dir("build"), "sram_4x4"),
            PathBuf::from("build/ngspice/sram_4x4.spice")
        );
        assert_eq!(
            out_bin(pb_dir("build"), "and2"),
            PathBuf::from("build/pb/and2.pb.bin")
        );
    }
}
