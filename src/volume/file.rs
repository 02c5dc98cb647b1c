//! Volumes stored as numbered files next to the archive.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::config::{VolumeConfig, detect_base_path};
use super::{SizeDiscovery, VolumeDirectory};
use crate::{Error, Result, StreamMode};

/// The single volume file a directory keeps open.
#[derive(Debug)]
struct OpenVolume {
    index: usize,
    file: File,
}

/// A [`VolumeDirectory`] backed by numbered files.
///
/// For an archive `backup.zip`, volume 1 is `backup.z01`, volume 2 is
/// `backup.z02`, and so on, widening to three or more digits past 99. The
/// last volume carries the archive's own name: a finished write session
/// renames it, and a read session expects it there.
///
/// At most one volume file is open at a time. Read sessions open volumes
/// read-only and write sessions open them read/write; on Windows, read
/// sessions additionally deny other writers and write sessions deny all
/// sharing.
#[derive(Debug)]
pub struct FileVolumeDirectory {
    config: VolumeConfig,
    mode: StreamMode,
    /// Path of each volume, in order.
    paths: Vec<PathBuf>,
    /// Recorded size of each volume.
    sizes: Vec<u64>,
    open: Option<OpenVolume>,
}

impl FileVolumeDirectory {
    /// Discovers the volumes of an existing split archive.
    ///
    /// Probes `.z01`, `.z02`, ... until the first missing number, then adds
    /// the base path itself as the last volume. Sizes are determined
    /// according to the configured [`SizeDiscovery`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::VolumeMissing`] if the base path does not exist.
    pub fn open(config: VolumeConfig) -> Result<Self> {
        let paths = Self::discover(&config)?;
        let sizes = match config.size_discovery {
            SizeDiscovery::Full => paths
                .iter()
                .enumerate()
                .map(|(index, path)| Self::measure(index, path))
                .collect::<Result<Vec<_>>>()?,
            SizeDiscovery::Quick => Self::measure_quick(&paths)?,
        };

        log::debug!(
            "opened {} volume(s) of '{}' totalling {} bytes",
            paths.len(),
            config.base_path().display(),
            sizes.iter().sum::<u64>()
        );

        Ok(Self {
            config,
            mode: StreamMode::Read,
            paths,
            sizes,
            open: None,
        })
    }

    /// Discovers the volumes of the archive that `path` belongs to.
    ///
    /// `path` may be the archive itself or any of its `.zNN` volumes.
    pub fn open_path(path: impl AsRef<Path>, size_discovery: SizeDiscovery) -> Result<Self> {
        let base_path = detect_base_path(path.as_ref());
        Self::open(VolumeConfig::new(base_path, 0).size_discovery(size_discovery))
    }

    /// Starts a write session.
    ///
    /// No file is created until the first byte is written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the part size is below
    /// [`MIN_PART_SIZE`](super::MIN_PART_SIZE).
    pub fn create(config: VolumeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            mode: StreamMode::Write,
            paths: Vec::new(),
            sizes: Vec::new(),
            open: None,
        })
    }

    /// Returns the configuration of this directory.
    pub fn config(&self) -> &VolumeConfig {
        &self.config
    }

    /// Returns the path of every volume, in order.
    pub fn volume_paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn discover(config: &VolumeConfig) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        let mut volume_number = 1u32;

        loop {
            let volume_path = config.volume_path(volume_number);
            match fs::metadata(&volume_path) {
                Ok(_) => {
                    paths.push(volume_path);
                    volume_number += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => break,
                Err(e) => return Err(Error::Io(e)),
            }
        }

        let base_path = config.base_path().to_path_buf();
        if let Err(source) = fs::metadata(&base_path) {
            return Err(Error::VolumeMissing {
                volume: volume_number,
                path: base_path.to_string_lossy().to_string(),
                source,
            });
        }
        paths.push(base_path);
        Ok(paths)
    }

    /// Opens a volume and reads its exact size.
    fn measure(index: usize, path: &Path) -> Result<u64> {
        let file = File::open(path).map_err(|source| Self::missing(index, path, source))?;
        Ok(file.metadata()?.len())
    }

    /// Measures the first volume, then walks back from the last volume until
    /// one matches the first volume's size. Unvisited volumes take that size.
    fn measure_quick(paths: &[PathBuf]) -> Result<Vec<u64>> {
        let first = Self::measure(0, &paths[0])?;
        let mut sizes = vec![first; paths.len()];

        let mut measured = 1;
        for index in (1..paths.len()).rev() {
            let size = Self::measure(index, &paths[index])?;
            sizes[index] = size;
            measured += 1;
            if size == first {
                break;
            }
        }

        if measured < paths.len() {
            log::warn!(
                "quick size discovery assumed {} bytes for {} unmeasured volume(s)",
                first,
                paths.len() - measured
            );
        }
        Ok(sizes)
    }

    fn missing(index: usize, path: &Path, source: io::Error) -> Error {
        Error::VolumeMissing {
            volume: (index + 1) as u32,
            path: path.to_string_lossy().to_string(),
            source,
        }
    }

    fn open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(true).write(self.mode.is_write());

        #[cfg(windows)]
        {
            use std::os::windows::fs::OpenOptionsExt;
            const FILE_SHARE_READ: u32 = 0x0000_0001;
            options.share_mode(if self.mode.is_write() {
                0
            } else {
                FILE_SHARE_READ
            });
        }

        options
    }

    fn open_file(&self, index: usize) -> Result<File> {
        let path = &self.paths[index];
        self.open_options()
            .open(path)
            .map_err(|source| Self::missing(index, path, source))
    }
}

impl VolumeDirectory for FileVolumeDirectory {
    type Volume = File;

    fn mode(&self) -> StreamMode {
        self.mode
    }

    fn volume_count(&self) -> usize {
        self.paths.len()
    }

    fn volume_size(&self, index: usize) -> u64 {
        self.sizes.get(index).copied().unwrap_or(0)
    }

    fn part_size(&self) -> u64 {
        self.config.part_size()
    }

    fn open_volume(&mut self, index: usize) -> Result<&mut File> {
        if index >= self.paths.len() {
            return Err(Error::VolumeNotFound { index });
        }

        let volume = match self.open.take() {
            Some(current) if current.index == index => current,
            previous => {
                drop(previous);
                let file = self.open_file(index)?;
                log::debug!("switched to volume '{}'", self.paths[index].display());
                OpenVolume { index, file }
            }
        };
        Ok(&mut self.open.insert(volume).file)
    }

    fn create_volume(&mut self) -> Result<usize> {
        if self.mode.is_read() {
            return Err(Error::mode_violation("create a volume in", self.mode));
        }

        self.open = None;
        let index = self.paths.len();
        let path = self.config.volume_path((index + 1) as u32);
        let file = self
            .open_options()
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| {
                Error::Io(io::Error::new(
                    e.kind(),
                    format!("Failed to create volume {}: {}", path.display(), e),
                ))
            })?;

        log::debug!("created volume '{}'", path.display());
        self.paths.push(path);
        self.sizes.push(0);
        self.open = Some(OpenVolume { index, file });
        Ok(index)
    }

    fn record_size(&mut self, index: usize, size: u64) {
        if let Some(recorded) = self.sizes.get_mut(index) {
            *recorded = size;
        }
    }

    fn set_volume_len(&mut self, index: usize, len: u64) -> Result<()> {
        self.open_volume(index)?.set_len(len)?;
        self.sizes[index] = len;
        Ok(())
    }

    fn trim_from_volume(&mut self, index: usize) -> Result<()> {
        if self.open.as_ref().is_some_and(|open| open.index > index) {
            self.open = None;
        }

        let keep = (index + 1).min(self.paths.len());
        let removed = self.paths.split_off(keep);
        self.sizes.truncate(keep);

        for path in removed {
            match fs::remove_file(&path) {
                Ok(()) => log::debug!("deleted volume '{}'", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(open) = self.open.as_mut() {
            open.file.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut open) = self.open.take() {
            open.file.flush()?;
        }
        Ok(())
    }

    fn finalize_write(&mut self) -> Result<()> {
        if self.mode.is_read() {
            return Err(Error::mode_violation("finalize", self.mode));
        }
        self.close()?;

        while self.paths.len() > 1 && self.sizes.last() == Some(&0) {
            let last = self.paths.len() - 2;
            self.trim_from_volume(last)?;
        }

        let base_path = self.config.base_path().to_path_buf();
        match self.paths.last_mut() {
            None => {
                File::create(&base_path)?;
                self.paths.push(base_path);
                self.sizes.push(0);
            }
            Some(last) if *last != base_path => {
                if fs::metadata(&base_path).is_ok() {
                    fs::remove_file(&base_path)?;
                }
                fs::rename(&*last, &base_path)?;
                log::debug!(
                    "renamed final volume '{}' to '{}'",
                    last.display(),
                    base_path.display()
                );
                *last = base_path;
            }
            Some(_) => {}
        }
        Ok(())
    }
}
