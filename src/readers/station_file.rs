use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, TableError};
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, HEADER_LINES};

/// Resolves a station file name against an ordered list of directories.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    candidates: Vec<PathBuf>,
}

impl SourceLocator {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// First existing file among the candidate directories, falling back to
    /// `filename` itself. Absolute paths skip the candidate search.
    pub fn locate(&self, filename: &Path) -> Result<PathBuf> {
        let found = if filename.is_absolute() {
            Some(filename.to_path_buf()).filter(|path| path.is_file())
        } else {
            self.candidates
                .iter()
                .map(|dir| dir.join(filename))
                .chain(std::iter::once(filename.to_path_buf()))
                .find(|path| path.is_file())
        };
        if let Some(path) = found {
            return Ok(path);
        }

        let searched = self
            .candidates
            .iter()
            .map(|dir| dir.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(TableError::SourceNotFound {
            filename: filename.display().to_string(),
            searched,
        })
    }
}

/// Data lines of one station file, past the header lines.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD so a stray
/// character never stops the station; only real read errors surface.
pub struct StationFile {
    path: PathBuf,
    reader: BufReader<File>,
    buf: Vec<u8>,
}

impl StationFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| TableError::SourceUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Reading: {}", path.display());

        let mut station_file = Self {
            path: path.to_path_buf(),
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file),
            buf: Vec::new(),
        };
        for _ in 0..HEADER_LINES {
            if station_file.read_line()?.is_none() {
                break;
            }
        }

        Ok(station_file)
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|source| TableError::SourceUnreadable {
                path: self.path.clone(),
                source,
            })?;
        if read == 0 {
            return Ok(None);
        }

        let mut line = String::from_utf8_lossy(&self.buf).into_owned();
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

impl Iterator for StationFile {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}
