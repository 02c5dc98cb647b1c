//! Configuration for split archives.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Smallest part size accepted for a write session, in bytes.
pub const MIN_PART_SIZE: u64 = 64;

/// How a read session learns the size of each volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeDiscovery {
    /// Every volume is measured. Accurate for any archive.
    #[default]
    Full,
    /// Only the first volume and a backward scan from the last are measured.
    ///
    /// All volumes before the first scanned match are assumed to have the
    /// first volume's size. This holds for archives split by this crate, where
    /// every volume but the last is exactly `part_size` bytes. Archives from
    /// other tools with uneven earlier volumes get wrong offsets.
    Quick,
}

/// Configuration for split archives.
///
/// Volumes of a split archive named `backup.zip` are called `backup.z01`,
/// `backup.z02` and so on. When a write session finishes, the last volume is
/// renamed to `backup.zip` itself.
///
/// # Example
///
/// ```rust
/// use zipspan::volume::VolumeConfig;
///
/// let config = VolumeConfig::new("backup.zip", 100 * 1024 * 1024);
///
/// assert_eq!(config.volume_path(1).to_str().unwrap(), "backup.z01");
/// assert_eq!(config.volume_path(150).to_str().unwrap(), "backup.z150");
/// ```
#[derive(Debug, Clone)]
pub struct VolumeConfig {
    /// Maximum size of each volume in bytes.
    pub part_size: u64,
    /// Strategy used to size volumes when reading.
    pub size_discovery: SizeDiscovery,
    /// Path of the archive; also the name of the final volume.
    base_path: PathBuf,
}

impl VolumeConfig {
    /// Creates a new volume configuration.
    ///
    /// # Arguments
    ///
    /// * `base_path` - Path of the archive (e.g., "backup.zip")
    /// * `part_size` - Maximum size of each volume in bytes
    pub fn new(base_path: impl AsRef<Path>, part_size: u64) -> Self {
        Self {
            part_size,
            size_discovery: SizeDiscovery::Full,
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Sets the size discovery strategy used by read sessions.
    pub fn size_discovery(mut self, size_discovery: SizeDiscovery) -> Self {
        self.size_discovery = size_discovery;
        self
    }

    /// Returns the base path of the archive.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the part size in bytes.
    pub fn part_size(&self) -> u64 {
        self.part_size
    }

    /// Checks that the configuration can drive a write session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the part size is below
    /// [`MIN_PART_SIZE`].
    pub fn validate(&self) -> Result<()> {
        if self.part_size < MIN_PART_SIZE {
            return Err(Error::InvalidConfiguration(format!(
                "part size {} is below the minimum of {} bytes",
                self.part_size, MIN_PART_SIZE
            )));
        }
        Ok(())
    }

    /// Generates the path for a specific volume number.
    ///
    /// Volume numbers are 1-indexed. The extension of the base path is
    /// replaced by `z` followed by the number padded to at least two digits.
    pub fn volume_path(&self, volume_number: u32) -> PathBuf {
        volume_path_for(&self.base_path, volume_number)
    }

    /// Creates a config for 3.5" floppy-sized volumes (1,457,664 bytes).
    pub fn floppy(base_path: impl AsRef<Path>) -> Self {
        Self::new(base_path, 1_457_664)
    }

    /// Creates a config for CD-sized volumes (~700 MB).
    pub fn cd(base_path: impl AsRef<Path>) -> Self {
        Self::new(base_path, 700 * 1024 * 1024)
    }

    /// Creates a config for FAT32-compatible volumes (~4 GB).
    pub fn fat32(base_path: impl AsRef<Path>) -> Self {
        // FAT32 max file size is 4 GB - 1 byte
        Self::new(base_path, 4 * 1024 * 1024 * 1024 - 1)
    }
}

/// Generates a volume path for a given base path and volume number.
pub(crate) fn volume_path_for(base: &Path, volume_number: u32) -> PathBuf {
    base.with_extension(format!("z{:02}", volume_number))
}

/// Detects the base path from either the archive path or a volume path.
///
/// `backup.z03` yields `backup.zip`; any path whose extension is not `z`
/// followed by digits is returned unchanged.
pub fn detect_base_path(path: &Path) -> PathBuf {
    let is_volume = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.strip_prefix('z'))
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));

    if is_volume {
        path.with_extension("zip")
    } else {
        path.to_path_buf()
    }
}
