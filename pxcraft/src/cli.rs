//! Command line front end. Each command opens its input, runs at most one canvas operation
//! through the core pipeline, and saves.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pxcraft_core::{
    canvas_ops::{
        self, CanvasOp, Crop, EnlargeCanvas, Flip, FlipDirection, QuarterTurn, Resize, Rotate,
    },
    editor::{Editor, LogMessages, View},
    io::{
        self,
        progress::{LogProgress, NullProgress},
    },
    raster::{Filter, Raster},
    state::{
        canvas::Canvas,
        document::Document,
        layer::{Layer, LayerKind},
    },
};

use crate::settings::Settings;

#[derive(Debug, Parser)]
#[clap(name = "pxcraft", version, about = "Canvas operations on pxcraft projects")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Describe projects.
    Info {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Write a fresh project. The bottom layer is white, any others transparent.
    New {
        output: PathBuf,
        #[arg(value_parser = parse_size, help = "Canvas size, as WIDTHxHEIGHT")]
        size: Canvas,
        #[arg(default_value_t = 1)]
        layers: u32,
    },
    /// Scale the image to a new size.
    Resize {
        input: PathBuf,
        output: PathBuf,
        #[arg(value_parser = parse_size, help = "New size, as WIDTHxHEIGHT")]
        size: Canvas,
        /// Defaults to the configured filter.
        #[arg(long)]
        filter: Option<Filter>,
    },
    /// Cut the canvas down to a rectangle.
    Crop {
        input: PathBuf,
        output: PathBuf,
        x: u32,
        y: u32,
        #[arg(value_parser = parse_size, help = "Size of the kept area, as WIDTHxHEIGHT")]
        size: Canvas,
    },
    /// Add margins around the canvas. Negative margins cut into it.
    #[command(allow_negative_numbers = true)]
    Enlarge {
        input: PathBuf,
        output: PathBuf,
        north: i32,
        east: i32,
        south: i32,
        west: i32,
    },
    /// Mirror the image.
    Flip {
        input: PathBuf,
        output: PathBuf,
        #[arg(help = "horizontal (h) or vertical (v)")]
        direction: FlipDirection,
    },
    /// Rotate the image clockwise.
    Rotate {
        input: PathBuf,
        output: PathBuf,
        #[arg(help = "90, 180 or 270")]
        angle: QuarterTurn,
    },
    /// Flip a project and undo it, checking the document comes back unchanged.
    UndoCheck { input: PathBuf },
}

/// Parse `WIDTHxHEIGHT`.
fn parse_size(text: &str) -> Result<Canvas, String> {
    let (width, height) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, found {text:?}"))?;
    let width: i64 = width.trim().parse().map_err(|e| format!("width: {e}"))?;
    let height: i64 = height.trim().parse().map_err(|e| format!("height: {e}"))?;
    Canvas::new(width, height).map_err(|e| e.to_string())
}

/// Follows the editor's document in the log, there being no screen to show it on.
#[derive(Default)]
struct TerminalView {
    canvas: Option<Canvas>,
}
impl View for TerminalView {
    fn replace_document(&mut self, document: Arc<Document>) {
        log::debug!(
            "showing {:?}, {}, {} layers",
            document.name,
            document.canvas(),
            document.layers().len()
        );
        self.canvas = Some(document.canvas());
    }
    fn revalidate(&mut self) {
        if let Some(canvas) = self.canvas {
            log::debug!("canvas is now {canvas}");
        }
    }
}

fn open(path: &Path) -> anyhow::Result<Document> {
    io::open(path, &LogProgress::default(), &LogMessages)
        .ok_or_else(|| anyhow::anyhow!("couldn't open {}", path.display()))
}

fn save(document: &Document, path: &Path) -> anyhow::Result<()> {
    if !io::has_project_extension(path) {
        log::warn!(
            "{} doesn't end in .{}, other tools may not recognize it",
            path.display(),
            io::EXTENSION
        );
    }
    if io::save(document, path, &LogProgress::default(), &LogMessages) {
        Ok(())
    } else {
        anyhow::bail!("couldn't save {}", path.display())
    }
}

fn editor_for(document: Document, settings: &Settings) -> Editor {
    Editor::new(
        document,
        Box::new(TerminalView::default()),
        Arc::new(LogMessages),
        settings.editor_config(),
    )
}

async fn apply(
    op: &dyn CanvasOp,
    input: &Path,
    output: &Path,
    settings: &Settings,
) -> anyhow::Result<()> {
    let mut editor = editor_for(open(input)?, settings);
    let document = canvas_ops::process(op, &mut editor).await?;
    save(&document, output)
}

fn describe(path: &Path, document: &Document) -> String {
    use std::fmt::Write;

    let mut text = format!(
        "{}: {:?}, {}, {} layers",
        path.display(),
        document.name,
        document.canvas(),
        document.layers().len()
    );
    for (index, layer) in document.layers().iter().enumerate() {
        let kind = match &layer.kind {
            LayerKind::Image(_) => "image".to_owned(),
            LayerKind::Text(text) => format!("text {:?}", text.text),
            LayerKind::Adjustment(adjustment) => format!("{adjustment:?}"),
        };
        let active = if index == document.active_layer_index() {
            "*"
        } else {
            " "
        };
        let _ = write!(
            text,
            "\n {active}{index}: {:?} {kind}, {} {:.0}%{}{}",
            layer.name,
            layer.blend.mode,
            layer.blend.opacity.get() * 100.0,
            if layer.mask.is_some() { ", masked" } else { "" },
            if layer.visible { "" } else { ", hidden" },
        );
    }
    if let Some(guides) = &document.guides {
        let _ = write!(
            text,
            "\n  guides: {} horizontal, {} vertical",
            guides.horizontals().len(),
            guides.verticals().len()
        );
    }
    if let Some(selection) = &document.selection {
        let [x, y, width, height] = selection.rect();
        let _ = write!(text, "\n  selection: {x},{y} {width}x{height}");
    }
    text
}

fn info(files: Vec<PathBuf>) -> anyhow::Result<()> {
    use rayon::iter::{IntoParallelIterator, ParallelIterator};

    let all_opened = AtomicBool::new(true);
    let descriptions: Vec<Option<String>> = files
        .into_par_iter()
        .map(|path| match io::read(&path, &NullProgress) {
            Ok(document) => Some(describe(&path, &document)),
            Err(e) => {
                log::error!("failed to open file {path:?}: {:#}", anyhow::Error::from(e));
                all_opened.store(false, Ordering::Relaxed);
                None
            }
        })
        .collect();
    for description in descriptions.into_iter().flatten() {
        println!("{description}");
    }
    if all_opened.into_inner() {
        Ok(())
    } else {
        anyhow::bail!("some files couldn't be opened")
    }
}

fn new(output: &Path, size: Canvas, layers: u32) -> anyhow::Result<()> {
    let name = output
        .file_stem()
        .map_or_else(|| "Untitled".to_owned(), |s| s.to_string_lossy().into_owned());
    let mut document = Document::new(name, size);
    for index in 0..layers {
        let fill = if index == 0 { 0xFFFF_FFFF } else { 0 };
        let raster = Raster::new_argb(size.width(), size.height(), fill)?;
        document.push_layer(Layer::image(format!("Layer {}", index + 1), raster))?;
    }
    save(&document, output)
}

async fn undo_check(input: &Path, settings: &Settings) -> anyhow::Result<()> {
    let mut editor = editor_for(open(input)?, settings);
    let original = editor.document().clone();
    let flip = Flip {
        direction: FlipDirection::Horizontal,
    };
    canvas_ops::process(&flip, &mut editor).await?;
    editor.undo()?;
    if **editor.document() != *original {
        anyhow::bail!("undo didn't restore {}", input.display());
    }
    println!("{}: undo restored the document", input.display());
    Ok(())
}

pub async fn run(cli: Cli, settings: &Settings) -> anyhow::Result<()> {
    match cli.command {
        Command::Info { files } => info(files),
        Command::New {
            output,
            size,
            layers,
        } => new(&output, size, layers),
        Command::Resize {
            input,
            output,
            size,
            filter,
        } => {
            let op = Resize {
                width: size.width(),
                height: size.height(),
                filter: filter.unwrap_or_else(|| settings.filter()),
            };
            apply(&op, &input, &output, settings).await
        }
        Command::Crop {
            input,
            output,
            x,
            y,
            size,
        } => {
            let op = Crop {
                x,
                y,
                width: size.width(),
                height: size.height(),
            };
            apply(&op, &input, &output, settings).await
        }
        Command::Enlarge {
            input,
            output,
            north,
            east,
            south,
            west,
        } => {
            let op = EnlargeCanvas {
                north,
                east,
                south,
                west,
            };
            apply(&op, &input, &output, settings).await
        }
        Command::Flip {
            input,
            output,
            direction,
        } => apply(&Flip { direction }, &input, &output, settings).await,
        Command::Rotate {
            input,
            output,
            angle,
        } => apply(&Rotate { angle }, &input, &output, settings).await,
        Command::UndoCheck { input } => undo_check(&input, settings).await,
    }
}
