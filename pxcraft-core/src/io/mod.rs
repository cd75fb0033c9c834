//! # Project files
//!
//! A `.pxc` project is two magic bytes and a format version, followed by one gzip stream holding
//! the document. Inside, every entity writes its own fields in a fixed order, see
//! [`encode`] and [`decode`] for the details.
//!
//! Pixel blocks are `[width: i32][height: i32][format tag: i32]`. Color pixels follow as
//! `width * height` packed ARGB words, gray pixels as an `i32` length and a PNG stream.

mod decode;
mod encode;
pub mod progress;
pub mod tracking;

pub use decode::{DecodeError, MAX_LAYERS, MAX_STRING_LEN};

use std::fs::File;
use std::io::{
    BufReader, BufWriter, ErrorKind as IOErrorKind, IntoInnerError, Read, Result as IOResult,
    Write,
};
use std::path::{Path, PathBuf};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use crate::editor::Messages;
use crate::state::document::Document;
use progress::ProgressSink;
use tracking::{ProgressReader, ProgressTracker, Tracker};

pub const MAGIC: [u8; 2] = [0xAB, 0xC4];
pub const CURRENT_VERSION: u8 = 3;
pub const EXTENSION: &str = "pxc";
/// Writes report progress out of this many units.
pub const WRITE_UNITS: u64 = 100;

/// Retired format versions, and the releases that can still open them.
const OBSOLETE_VERSIONS: [&str; 3] = [
    "an old beta release (0.9.2-0.9.7)",
    "an old beta release (0.9.8)",
    "releases 0.9.9-1.1.2",
];

pub(crate) mod layer_tags {
    pub const IMAGE: u8 = 0;
    pub const TEXT: u8 = 1;
    pub const ADJUSTMENT: u8 = 2;

    pub const INVERT: u8 = 0;
    pub const DESATURATE: u8 = 1;
    pub const BRIGHTNESS: u8 = 2;
}

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("{} is not a pxcraft project", .file.display())]
    NotProjectFormat { file: PathBuf },
    #[error(
        "{} uses retired format version {version}, only {opens_in} can open it",
        .file.display()
    )]
    ObsoleteFormat {
        file: PathBuf,
        version: u8,
        opens_in: &'static str,
    },
    #[error(
        "{} uses format version {version}, newer than this release understands",
        .file.display()
    )]
    UnknownFormatVersion { file: PathBuf, version: u8 },
    #[error("couldn't access {}", .file.display())]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is damaged", .file.display())]
    Decode {
        file: PathBuf,
        #[source]
        source: DecodeError,
    },
}
impl ProjectError {
    #[must_use]
    pub fn file(&self) -> &Path {
        match self {
            Self::NotProjectFormat { file }
            | Self::ObsoleteFormat { file, .. }
            | Self::UnknownFormatVersion { file, .. }
            | Self::Io { file, .. }
            | Self::Decode { file, .. } => file,
        }
    }
    fn io(file: &Path, source: std::io::Error) -> Self {
        Self::Io {
            file: file.to_owned(),
            source,
        }
    }
    fn decode(file: &Path, source: DecodeError) -> Self {
        match source {
            DecodeError::Io(source) => Self::io(file, source),
            source => Self::Decode {
                file: file.to_owned(),
                source,
            },
        }
    }
}

/// Whether `path` ends in the project extension, in any case.
#[must_use]
pub fn has_project_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION))
}

/// Check the magic bytes and version.
fn check_header(header: [u8; 3], file: &Path) -> Result<(), ProjectError> {
    let [magic @ .., version] = header;
    if magic != MAGIC {
        return Err(ProjectError::NotProjectFormat {
            file: file.to_owned(),
        });
    }
    match OBSOLETE_VERSIONS.get(usize::from(version)) {
        Some(&opens_in) => Err(ProjectError::ObsoleteFormat {
            file: file.to_owned(),
            version,
            opens_in,
        }),
        None if version > CURRENT_VERSION => Err(ProjectError::UnknownFormatVersion {
            file: file.to_owned(),
            version,
        }),
        None => Ok(()),
    }
}

/// Read a project from `reader`. `file` names the source in errors.
///
/// Nothing of the document is returned unless all of it, gzip checksum included, reads back.
pub fn read_from<R: Read>(mut reader: R, file: &Path) -> Result<Document, ProjectError> {
    let mut header = [0; 3];
    match reader.read_exact(&mut header) {
        Ok(()) => (),
        Err(err) if err.kind() == IOErrorKind::UnexpectedEof => {
            return Err(ProjectError::NotProjectFormat {
                file: file.to_owned(),
            })
        }
        Err(err) => return Err(ProjectError::io(file, err)),
    }
    check_header(header, file)?;

    let mut stream = BufReader::new(GzDecoder::new(reader));
    let document = decode::Decoder::new(&mut stream)
        .document()
        .map_err(|err| ProjectError::decode(file, err))?;
    // The checksum is only verified once the stream is read to its end.
    let trailing = std::io::copy(&mut stream, &mut std::io::sink())
        .map_err(|err| ProjectError::io(file, err))?;
    if trailing != 0 {
        log::warn!("{trailing} unused bytes at the end of {}", file.display());
    }
    Ok(document)
}

/// Read the project at `path`, reporting progress in bytes of the file.
///
/// The returned document remembers `path` as where it came from.
pub fn read(path: &Path, sink: &dyn ProgressSink) -> Result<Document, ProjectError> {
    let file = File::open(path).map_err(|err| ProjectError::io(path, err))?;
    let size = file
        .metadata()
        .map_err(|err| ProjectError::io(path, err))?
        .len();
    let progress = ProgressTracker::new(sink, &format!("Reading {}", path.display()), size);
    let mut document = read_from(BufReader::new(ProgressReader::new(file, &progress)), path)?;
    progress.finish();

    document.path = Some(path.to_owned());
    log::info!(
        "read {} ({}, {} layers)",
        path.display(),
        document.canvas(),
        document.layers().len()
    );
    Ok(document)
}

/// Write `document` as a project into `writer`, returning the writer once the stream is complete.
pub fn write_into<W: Write>(
    document: &Document,
    mut writer: W,
    progress: &dyn Tracker,
) -> IOResult<W> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&[CURRENT_VERSION])?;
    let stream = BufWriter::new(GzEncoder::new(writer, Compression::default()));
    let mut encoder = encode::Encoder::new(stream, progress, document.count_images());
    encoder.document(document)?;
    encoder
        .into_inner()
        .into_inner()
        .map_err(IntoInnerError::into_error)?
        .finish()
}

/// Sibling of `path` to write into before it's moved into place.
fn temp_path(path: &Path) -> IOResult<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        std::io::Error::new(IOErrorKind::InvalidInput, "path doesn't name a file")
    })?;
    let mut temp = std::ffi::OsString::from(".");
    temp.push(name);
    temp.push(".tmp");
    Ok(path.with_file_name(temp))
}

fn write_atomically(
    document: &Document,
    path: &Path,
    temp: &Path,
    progress: &dyn Tracker,
) -> IOResult<()> {
    let file = write_into(document, BufWriter::new(File::create(temp)?), progress)?
        .into_inner()
        .map_err(IntoInnerError::into_error)?;
    file.sync_all()?;
    std::fs::rename(temp, path)
}

/// Write `document` to `path`.
///
/// The data lands in a temporary file next to `path` first, which replaces `path` only once
/// complete. On failure `path` is left as it was.
pub fn write(
    document: &Document,
    path: &Path,
    sink: &dyn ProgressSink,
) -> Result<(), ProjectError> {
    let temp = temp_path(path).map_err(|err| ProjectError::io(path, err))?;
    let progress = ProgressTracker::new(sink, &format!("Writing {}", path.display()), WRITE_UNITS);
    if let Err(err) = write_atomically(document, path, &temp, &progress) {
        match std::fs::remove_file(&temp) {
            Err(remove) if remove.kind() != IOErrorKind::NotFound => {
                log::warn!("couldn't clean up {}: {remove}", temp.display());
            }
            _ => (),
        }
        return Err(ProjectError::io(path, err));
    }
    progress.finish();
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Read the project at `path`, reporting failure to the user instead of returning it.
pub fn open(path: &Path, sink: &dyn ProgressSink, messages: &dyn Messages) -> Option<Document> {
    read(path, sink)
        .map_err(|err| messages.show_error("Couldn't open project", &err))
        .ok()
}

/// Write `document` to `path`, reporting failure to the user. True on success.
pub fn save(
    document: &Document,
    path: &Path,
    sink: &dyn ProgressSink,
    messages: &dyn Messages,
) -> bool {
    match write(document, path, sink) {
        Ok(()) => {
            messages.show_status(&format!("Saved {}", path.display()));
            true
        }
        Err(err) => {
            messages.show_error("Couldn't save project", &err);
            false
        }
    }
}
