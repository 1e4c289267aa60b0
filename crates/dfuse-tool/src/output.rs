use std::{
    fmt::Display,
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, TimeZone};
use derive_more::IsVariant;
use dfuse_builder::{Metadata, encode};

use crate::{Result, err::Error};

/// DFU artifacts directory, relative to the project
pub const DFU_DIR: &str = "artifacts/dfu";
/// Copy of the most recent post-build image
pub const LATEST_NAME: &str = "platformio-latest.dfu";

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum WriteMode {
    /// Fail if the destination exists
    CreateNew,
    Overwrite,
}

impl From<bool> for WriteMode {
    fn from(overwrite: bool) -> Self {
        if overwrite {
            Self::Overwrite
        } else {
            Self::CreateNew
        }
    }
}

/// `platformio-<YYYYmmdd-HHMMSS>.dfu` inside `dir`
pub fn timestamped_path<Tz: TimeZone>(dir: &Path, now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: Display,
{
    dir.join(format!("platformio-{}.dfu", now.format("%Y%m%d-%H%M%S")))
}

pub fn read_payload(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        return Err(Error::Custom(
            format!("{} is a directory", path.display()).into(),
        ));
    }

    Ok(fs::read(path)?)
}

pub fn check_output(path: &Path, mode: WriteMode) -> Result<()> {
    if mode.is_create_new() && path.exists() {
        Err(Error::OutputExists(path.to_path_buf()))
    } else {
        Ok(())
    }
}

/// Write `bytes` to `path`, creating parent directories as needed.
///
/// [`WriteMode::CreateNew`] creates the file exclusively.
pub fn write_image(path: &Path, bytes: &[u8], mode: WriteMode) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = match mode {
        WriteMode::CreateNew => OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => Error::OutputExists(path.to_path_buf()),
                _ => e.into(),
            })?,
        WriteMode::Overwrite => File::create(path)?,
    };

    Ok(file.write_all(bytes)?)
}

/// Read `bin`, wrap it and write the result to `out`.
///
/// Nothing is written if `out` already exists in [`WriteMode::CreateNew`].
pub fn package(bin: &Path, out: &Path, mode: WriteMode, metadata: &Metadata) -> Result<usize> {
    let payload = read_payload(bin)?;
    check_output(out, mode)?;

    let image = encode(&payload, metadata)?;
    write_image(out, &image, mode)?;
    Ok(image.len())
}

/// Copy `image` over [`LATEST_NAME`] next to it
pub fn update_latest(image: &Path, dir: &Path) -> Result<PathBuf> {
    let latest = dir.join(LATEST_NAME);
    fs::copy(image, &latest)?;
    Ok(latest)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use dfuse_builder::checksum;

    use super::*;

    #[test]
    fn timestamped_name() {
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 14, 5, 9).unwrap();
        assert_eq!(
            timestamped_path(Path::new(DFU_DIR), &now),
            PathBuf::from("artifacts/dfu/platformio-20250307-140509.dfu")
        );
    }

    #[test]
    fn package_writes_image() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("firmware.bin");
        fs::write(&bin, [0xAA, 0xBB, 0xCC, 0xDD]).unwrap();

        let out = dir.path().join("nested/out.dfu");
        let len = package(&bin, &out, WriteMode::CreateNew, &Metadata::default()).unwrap();
        assert_eq!(len, 313);

        let image = fs::read(&out).unwrap();
        assert_eq!(image.len(), 313);
        assert!(checksum::verify(&image));
    }

    #[test]
    fn missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.dfu");
        let err = package(
            &dir.path().join("missing.bin"),
            &out,
            WriteMode::Overwrite,
            &Metadata::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::InputNotFound(_)));
        assert!(!out.exists());
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("firmware.bin");
        fs::write(&bin, [1, 2, 3]).unwrap();
        let out = dir.path().join("out.dfu");
        fs::write(&out, b"keep").unwrap();

        let err = package(&bin, &out, WriteMode::CreateNew, &Metadata::default()).unwrap_err();
        assert!(matches!(err, Error::OutputExists(_)));
        assert_eq!(fs::read(&out).unwrap(), b"keep");

        package(&bin, &out, WriteMode::Overwrite, &Metadata::default()).unwrap();
        assert_eq!(fs::read(&out).unwrap().len(), 11 + 274 + 8 + 3 + 16);
    }

    #[test]
    fn create_new_never_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.dfu");
        // Appeared after the early check in `package`
        fs::write(&out, b"keep").unwrap();

        let err = write_image(&out, b"image", WriteMode::CreateNew).unwrap_err();
        assert!(matches!(err, Error::OutputExists(_)));
        assert_eq!(fs::read(&out).unwrap(), b"keep");

        write_image(&out, b"new", WriteMode::Overwrite).unwrap();
        assert_eq!(fs::read(&out).unwrap(), b"new");
    }

    #[test]
    fn latest_copy() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("platformio-20250101-000000.dfu");
        fs::write(&image, b"image").unwrap();

        let latest = update_latest(&image, dir.path()).unwrap();
        assert_eq!(latest, dir.path().join(LATEST_NAME));
        assert_eq!(fs::read(latest).unwrap(), b"image");
    }

    #[test]
    fn write_mode_from_flag() {
        assert!(WriteMode::from(true).is_overwrite());
        assert!(WriteMode::from(false).is_create_new());
    }
}
