use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use pxcraft_core::blend::{Blend, BlendMode};
use pxcraft_core::editor::Messages;
use pxcraft_core::io::{
    self,
    progress::{NullProgress, ProgressSink},
    ProjectError,
};
use pxcraft_core::raster::Raster;
use pxcraft_core::state::{
    canvas::Canvas,
    guides::Guides,
    layer::{Adjustment, Layer, LayerKind, LayerMask, TextContent},
    selection::Selection,
    transform::Matrix,
};
use pxcraft_core::util::Opacity;
use pxcraft_core::Document;

/// A fresh directory per test, under the system temp dir.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pxcraft-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn gradient(width: u32, height: u32) -> Raster {
    let pixels = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| 0xFF00_0000 | (x << 16) | (y << 8) | ((x + y) & 0xFF))
        })
        .collect();
    Raster::from_argb(width, height, pixels).unwrap()
}

fn gray_gradient(width: u32, height: u32) -> Raster {
    let pixels = (0..height)
        .flat_map(|y| (0..width).map(move |x| ((x * 7 + y * 3) % 256) as u8))
        .collect();
    Raster::from_gray(width, height, pixels).unwrap()
}

/// Two image layers, 100x100.
fn two_layers() -> Document {
    let mut doc = Document::new("two layers", Canvas::new(100, 100).unwrap());
    let mut bottom = Layer::image("bottom", gradient(100, 100));
    bottom.blend = Blend::new(BlendMode::Multiply, Opacity::new(0.5).unwrap());
    doc.push_layer(bottom).unwrap();
    let mut top = Layer::image("top", Raster::new_argb(100, 100, 0x8011_2233).unwrap());
    top.blend = Blend::new(BlendMode::Screen, Opacity::new(0.75).unwrap());
    doc.push_layer(top).unwrap();
    doc
}

#[derive(Default)]
struct Collect {
    errors: Mutex<Vec<String>>,
    statuses: Mutex<Vec<String>>,
}
impl Messages for Collect {
    fn show_status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_owned());
    }
    fn show_error(&self, title: &str, error: &dyn std::error::Error) {
        self.errors.lock().unwrap().push(format!("{title}: {error}"));
    }
}

/// Counts reported progress.
#[derive(Default)]
struct Reports(Mutex<Vec<(u64, u64)>>);
impl ProgressSink for Reports {
    fn started(&self, _: &str, _: u64) {}
    fn progressed(&self, done: u64, total: u64) {
        self.0.lock().unwrap().push((done, total));
    }
    fn finished(&self) {}
}

fn write_raw(path: &Path, bytes: &[u8]) {
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn two_layer_round_trip() {
    let dir = scratch("two-layers");
    let path = dir.join("doc.pxc");
    let doc = two_layers();
    io::write(&doc, &path, &NullProgress).unwrap();

    let read = io::read(&path, &NullProgress).unwrap();
    assert_eq!(read.canvas(), Canvas::new(100, 100).unwrap());
    assert_eq!(read.layers().len(), 2);
    for (read, written) in read.layers().iter().zip(doc.layers()) {
        assert_eq!(read.blend, written.blend);
        assert_eq!(read.kind.raster(), written.kind.raster());
    }
    assert_eq!(read, doc);
    assert_eq!(read.path.as_deref(), Some(path.as_path()));
    assert!(read.guides.is_none());
}

#[test]
fn every_kind_round_trips() {
    let dir = scratch("kinds");
    let path = dir.join("kinds.pxc");
    let mut doc = Document::new("kinds", Canvas::new(37, 21).unwrap());
    let mut image = Layer::image("image", gradient(37, 21));
    let mut mask = LayerMask::new(gray_gradient(37, 21)).unwrap();
    mask.enabled = false;
    image.mask = Some(mask);
    image.visible = false;
    doc.push_layer(image).unwrap();
    doc.push_layer(Layer::new(
        "text",
        LayerKind::Text(TextContent {
            text: "héllo".into(),
            size: 14.5,
            color: 0xFF33_6699,
            placement: Matrix::translation(3.0, 4.5),
        }),
    ))
    .unwrap();
    let mut adjustment = Layer::new(
        "brighter",
        LayerKind::Adjustment(Adjustment::Brightness(-0.25)),
    );
    adjustment.mask = Some(LayerMask::revealing(37, 21).unwrap());
    doc.push_layer(adjustment).unwrap();
    doc.push_layer(Layer::new("inverted", LayerKind::Adjustment(Adjustment::Invert)))
        .unwrap();
    doc.set_active_layer(1);
    doc.guides = Some(Guides::new(vec![1.5, 20.0], vec![36.0]));
    doc.selection = Selection::new(2.0, 3.0, 10.0, 5.5);

    io::write(&doc, &path, &NullProgress).unwrap();
    let read = io::read(&path, &NullProgress).unwrap();
    assert_eq!(read, doc);
    assert_eq!(read.active_layer_index(), 1);
    assert!(read.has_selection());
}

#[test]
fn rejects_foreign_files() {
    let dir = scratch("foreign");
    let path = dir.join("image.png");
    write_raw(&path, b"\x89PNG\r\n\x1a\n");
    assert!(matches!(
        io::read(&path, &NullProgress),
        Err(ProjectError::NotProjectFormat { file }) if file == path
    ));
    write_raw(&path, &[0xAB]);
    assert!(matches!(
        io::read(&path, &NullProgress),
        Err(ProjectError::NotProjectFormat { .. })
    ));
}

#[test]
fn version_gate() {
    let dir = scratch("versions");
    let path = dir.join("old.pxc");
    for version in 0..=2 {
        write_raw(&path, &[0xAB, 0xC4, version, 0x1F, 0x8B]);
        match io::read(&path, &NullProgress) {
            Err(ProjectError::ObsoleteFormat {
                version: found,
                opens_in,
                ..
            }) => {
                assert_eq!(found, version);
                assert!(!opens_in.is_empty());
            }
            other => panic!("version {version}: {other:?}"),
        }
    }
    write_raw(&path, &[0xAB, 0xC4, 4]);
    assert!(matches!(
        io::read(&path, &NullProgress),
        Err(ProjectError::UnknownFormatVersion { version: 4, .. })
    ));

    // And version 3 is read.
    io::write(&two_layers(), &path, &NullProgress).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..3], &[0xAB, 0xC4, 3]);
    assert!(io::read(&path, &NullProgress).is_ok());
}

#[test]
fn truncated_is_io_error() {
    let dir = scratch("truncated");
    let path = dir.join("cut.pxc");
    io::write(&two_layers(), &path, &NullProgress).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    write_raw(&path, &bytes[..bytes.len() / 2]);
    assert!(matches!(
        io::read(&path, &NullProgress),
        Err(ProjectError::Io { .. })
    ));
}

#[test]
fn damaged_checksum_is_io_error() {
    let dir = scratch("checksum");
    let path = dir.join("crc.pxc");
    io::write(&two_layers(), &path, &NullProgress).unwrap();
    let mut bytes = std::fs::read(&path).unwrap();
    // The gzip trailer is CRC32 then length, flip a bit of the CRC.
    let crc = bytes.len() - 8;
    bytes[crc] ^= 0x01;
    write_raw(&path, &bytes);
    assert!(matches!(
        io::read(&path, &NullProgress),
        Err(ProjectError::Io { .. })
    ));
}

#[test]
fn bad_payload_is_decode_error() {
    use std::io::Write;
    let dir = scratch("payload");
    let path = dir.join("payload.pxc");
    let mut bytes = vec![0xAB, 0xC4, 3];
    let mut gz = flate2::write::GzEncoder::new(&mut bytes, flate2::Compression::fast());
    // Name "x", a 0x5 canvas.
    gz.write_all(&[0, 0, 0, 1, b'x', 0, 0, 0, 0, 0, 0, 0, 5])
        .unwrap();
    gz.finish().unwrap();
    write_raw(&path, &bytes);
    assert!(matches!(
        io::read(&path, &NullProgress),
        Err(ProjectError::Decode { .. })
    ));
}

#[test]
fn open_reports_instead_of_failing() {
    let dir = scratch("open");
    let messages = Collect::default();
    let missing = dir.join("missing.pxc");
    assert!(io::open(&missing, &NullProgress, &messages).is_none());
    let bogus = dir.join("bogus.pxc");
    write_raw(&bogus, b"not a project");
    assert!(io::open(&bogus, &NullProgress, &messages).is_none());
    assert_eq!(messages.errors.lock().unwrap().len(), 2);

    let good = dir.join("good.pxc");
    assert!(io::save(&two_layers(), &good, &NullProgress, &messages));
    assert!(io::open(&good, &NullProgress, &messages).is_some());
    assert_eq!(messages.errors.lock().unwrap().len(), 2);
    assert_eq!(messages.statuses.lock().unwrap().len(), 1);
}

#[test]
fn writes_leave_no_temporaries() {
    let dir = scratch("atomic");
    let path = dir.join("doc.pxc");
    io::write(&two_layers(), &path, &NullProgress).unwrap();
    // Overwrite in place.
    io::write(&two_layers(), &path, &NullProgress).unwrap();
    let names: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, [std::ffi::OsString::from("doc.pxc")]);
}

#[test]
fn failed_write_keeps_destination() {
    let dir = scratch("failed");
    // A directory can't be replaced by a file.
    let path = dir.join("taken.pxc");
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("inside"), b"keep").unwrap();
    let messages = Collect::default();
    assert!(!io::save(&two_layers(), &path, &NullProgress, &messages));
    assert_eq!(std::fs::read(path.join("inside")).unwrap(), b"keep");
    assert!(!dir.join(".taken.pxc.tmp").exists());
    assert_eq!(messages.errors.lock().unwrap().len(), 1);
}

#[test]
fn progress_reaches_totals() {
    let dir = scratch("progress");
    let path = dir.join("doc.pxc");
    let writes = Reports::default();
    io::write(&two_layers(), &path, &writes).unwrap();
    let writes = writes.0.into_inner().unwrap();
    assert!(writes.windows(2).all(|w| w[0].0 <= w[1].0));
    assert_eq!(writes.last(), Some(&(100, 100)));

    let reads = Reports::default();
    io::read(&path, &reads).unwrap();
    let reads = reads.0.into_inner().unwrap();
    let size = std::fs::metadata(&path).unwrap().len();
    assert!(reads.windows(2).all(|w| w[0].0 <= w[1].0));
    assert_eq!(reads.last(), Some(&(size, size)));
}

#[test]
fn mismatched_raster_fails_the_write() {
    let dir = scratch("mismatch");
    let path = dir.join("doc.pxc");
    let mut doc = two_layers();
    doc.layer_mut(0).unwrap().mask = Some(LayerMask::revealing(3, 3).unwrap());
    let err = io::write(&doc, &path, &NullProgress).unwrap_err();
    assert!(matches!(
        &err,
        ProjectError::Io { source, .. } if source.kind() == std::io::ErrorKind::InvalidInput
    ));
    assert!(!path.exists());
    assert!(!dir.join(".doc.pxc.tmp").exists());
}

/// Counts task starts and ends.
#[derive(Default)]
struct Lifecycle {
    started: AtomicU32,
    finished: AtomicU32,
}
impl ProgressSink for Lifecycle {
    fn started(&self, _: &str, _: u64) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }
    fn progressed(&self, _: u64, _: u64) {}
    fn finished(&self) {
        self.finished.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn failures_still_finish_progress() {
    let dir = scratch("lifecycle");
    let taken = dir.join("taken.pxc");
    std::fs::create_dir(&taken).unwrap();
    let sink = Lifecycle::default();
    assert!(io::write(&two_layers(), &taken, &sink).is_err());

    let path = dir.join("doc.pxc");
    io::write(&two_layers(), &path, &NullProgress).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    write_raw(&path, &bytes[..bytes.len() / 2]);
    assert!(io::read(&path, &sink).is_err());

    assert_eq!(sink.started.load(Ordering::Relaxed), 2);
    assert_eq!(sink.finished.load(Ordering::Relaxed), 2);
}
