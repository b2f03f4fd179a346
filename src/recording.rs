//! Recording rendered loops to disk.
//!
//! A [`Recorder`] renders through a [`SoftwareRenderer`] and, while recording,
//! forwards every `frame_step`-th frame to a [`FrameEncoder`]. The frame
//! driver signals the end of the loop through [`CaptureSink`], which closes
//! the encoder.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::error::{Error, Result};
use crate::render::{FrameView, Renderer, SoftwareRenderer};

/// Receives the "capture finished" signal when a loop completes.
pub trait CaptureSink {
    fn capture_finished(&mut self) -> Result<()>;
}

/// Wraps a renderer for live preview; end-of-loop signals are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct Preview<R>(pub R);

impl<R: Renderer> Renderer for Preview<R> {
    fn render(&mut self, view: &FrameView<'_>) {
        self.0.render(view);
    }
}

impl<R> CaptureSink for Preview<R> {
    fn capture_finished(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Save a single frame. `.webp` (or no extension) is written as lossy WebP
/// at `webp_quality`; any other extension goes through `image`.
pub fn save_still(img: &RgbaImage, path: &Path, webp_quality: f32) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("webp");
    if ext.eq_ignore_ascii_case("webp") {
        let encoder = webp::Encoder::from_rgba(img.as_raw(), img.width(), img.height());
        let mem = encoder.encode(webp_quality);
        fs::write(path, &*mem)?;
    } else {
        img.save(path)?;
    }
    tracing::info!("Saved {}", path.display());
    Ok(())
}

/// Destination for rendered frames.
pub trait FrameEncoder {
    fn push(&mut self, frame: &RgbaImage) -> Result<()>;
    /// Flush and close the output. Called once.
    fn finish(&mut self) -> Result<()>;
}

/// Output formats the recorder can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Gif,
    PngSequence,
    Mp4,
    Webm,
}

impl OutputFormat {
    /// Guess the format from a path: a known extension, otherwise a PNG
    /// sequence directory.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "gif" => OutputFormat::Gif,
            "mp4" => OutputFormat::Mp4,
            "webm" => OutputFormat::Webm,
            _ => OutputFormat::PngSequence,
        }
    }

    /// Open an encoder writing `width` x `height` frames at `fps` to `path`.
    pub fn open(self, path: &Path, width: u32, height: u32, fps: f64) -> Result<Box<dyn FrameEncoder>> {
        Ok(match self {
            OutputFormat::Gif => Box::new(GifSink::create(path, fps)?),
            OutputFormat::PngSequence => Box::new(PngSequence::create(path)?),
            OutputFormat::Mp4 | OutputFormat::Webm => {
                Box::new(FfmpegSink::spawn(path, width, height, fps, self)?)
            }
        })
    }
}

/// File writer shared between the GIF encoder and its sink, so the sink can
/// flush it after the encoder has written the trailer.
#[derive(Clone)]
struct SharedFile(Arc<Mutex<BufWriter<File>>>);

impl SharedFile {
    fn lock(&self) -> std::io::Result<MutexGuard<'_, BufWriter<File>>> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("GIF writer lock poisoned"))
    }
}

impl Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.lock()?.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.lock()?.flush()
    }
}

/// Animated GIF that loops forever.
pub struct GifSink {
    encoder: Option<GifEncoder<SharedFile>>,
    file: SharedFile,
    delay: Delay,
}

/// Quantiser speed for GIF output (1 best, 30 fastest).
const GIF_SPEED: i32 = 10;

impl GifSink {
    pub fn create(path: &Path, fps: f64) -> Result<Self> {
        let file = SharedFile(Arc::new(Mutex::new(BufWriter::new(File::create(path)?))));
        let mut encoder = GifEncoder::new_with_speed(file.clone(), GIF_SPEED);
        encoder.set_repeat(Repeat::Infinite)?;
        let fps = fps.round().max(1.0) as u32;
        Ok(Self {
            encoder: Some(encoder),
            file,
            delay: Delay::from_numer_denom_ms(1000, fps),
        })
    }

    /// Frame delay, for recorders that skip frames.
    pub fn with_delay_ms(mut self, numer: u32, denom: u32) -> Self {
        self.delay = Delay::from_numer_denom_ms(numer, denom);
        self
    }
}

impl FrameEncoder for GifSink {
    fn push(&mut self, frame: &RgbaImage) -> Result<()> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| Error::Encoder("GIF already finished".to_string()))?;
        encoder.encode_frame(Frame::from_parts(frame.clone(), 0, 0, self.delay))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        // The encoder writes the trailer when it drops.
        drop(self.encoder.take());
        let mut file = self.file.lock()?;
        file.flush()?;
        file.get_ref().sync_all()?;
        Ok(())
    }
}

/// Numbered PNG files in a directory.
#[derive(Debug)]
pub struct PngSequence {
    dir: PathBuf,
    next: u64,
}

impl PngSequence {
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            next: 0,
        })
    }

    fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:05}.png"))
    }
}

impl FrameEncoder for PngSequence {
    fn push(&mut self, frame: &RgbaImage) -> Result<()> {
        frame.save(self.frame_path(self.next))?;
        self.next += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        tracing::info!("Wrote {} frames to {}", self.next, self.dir.display());
        Ok(())
    }
}

/// Pipes raw RGBA frames into an `ffmpeg` child process.
pub struct FfmpegSink {
    child: Child,
    stdin: Option<ChildStdin>,
    frame_size: usize,
}

impl FfmpegSink {
    pub fn spawn(path: &Path, width: u32, height: u32, fps: f64, format: OutputFormat) -> Result<Self> {
        let frame_size = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(4))
            .ok_or_else(|| Error::Encoder("frame size overflow".to_string()))?;

        let mut command = Command::new("ffmpeg");
        command
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgba")
            .arg("-s:v")
            .arg(format!("{width}x{height}"))
            .arg("-r")
            .arg(fps.to_string())
            .arg("-i")
            .arg("-")
            .arg("-an");

        match format {
            OutputFormat::Webm => {
                command
                    .arg("-c:v")
                    .arg("libvpx-vp9")
                    .arg("-b:v")
                    .arg("0")
                    .arg("-crf")
                    .arg("30")
                    .arg("-pix_fmt")
                    .arg("yuv420p");
            }
            _ => {
                command
                    .arg("-c:v")
                    .arg("libx264")
                    .arg("-preset")
                    .arg("medium")
                    .arg("-crf")
                    .arg("18")
                    .arg("-pix_fmt")
                    .arg("yuv420p")
                    .arg("-movflags")
                    .arg("+faststart");
            }
        }

        command
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::Encoder("ffmpeg was not found on PATH".to_string())
            } else {
                Error::Encoder(format!("failed to spawn ffmpeg: {e}"))
            }
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Encoder("failed to capture ffmpeg stdin".to_string()))?;

        Ok(Self {
            child,
            stdin: Some(stdin),
            frame_size,
        })
    }
}

impl FrameEncoder for FfmpegSink {
    fn push(&mut self, frame: &RgbaImage) -> Result<()> {
        let raw = frame.as_raw();
        if raw.len() != self.frame_size {
            return Err(Error::Encoder(format!(
                "frame size mismatch: expected {} bytes, got {}",
                self.frame_size,
                raw.len()
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| Error::Encoder("ffmpeg input already closed".to_string()))?;
        stdin.write_all(raw)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.flush()?;
        }
        let status = self.child.wait()?;
        if !status.success() {
            return Err(Error::Encoder(format!("ffmpeg failed with status {status}")));
        }
        Ok(())
    }
}

/// Renders frames and records them while a recording is active.
pub struct Recorder {
    renderer: SoftwareRenderer,
    encoder: Option<Box<dyn FrameEncoder>>,
    /// Keep every n-th frame.
    frame_step: u64,
    frames_seen: u64,
    frames_written: u64,
    /// First push failure; reported when the capture finishes.
    error: Option<Error>,
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("renderer", &self.renderer)
            .field("recording", &self.is_recording())
            .field("frame_step", &self.frame_step)
            .field("frames_written", &self.frames_written)
            .finish()
    }
}

impl Recorder {
    pub fn new(renderer: SoftwareRenderer) -> Self {
        Self {
            renderer,
            encoder: None,
            frame_step: 1,
            frames_seen: 0,
            frames_written: 0,
            error: None,
        }
    }

    /// Record only every `step`-th frame (e.g. 2 for 30fps GIFs from a 60fps loop).
    pub fn with_frame_step(mut self, step: u64) -> Self {
        self.frame_step = step.max(1);
        self
    }

    pub fn frame_step(&self) -> u64 {
        self.frame_step
    }

    /// Start sending frames to `encoder`. The caller should restart the
    /// animation so the capture covers one whole loop.
    pub fn start(&mut self, encoder: Box<dyn FrameEncoder>) {
        if self.encoder.is_some() {
            tracing::warn!("Recording already in progress, replacing encoder");
        }
        self.encoder = Some(encoder);
        self.frames_seen = 0;
        self.frames_written = 0;
        self.error = None;
        tracing::info!("Recording started");
    }

    pub fn is_recording(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn renderer(&self) -> &SoftwareRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut SoftwareRenderer {
        &mut self.renderer
    }

    fn push_frame(&mut self) {
        let Some(encoder) = self.encoder.as_mut() else {
            return;
        };
        let keep = self.frames_seen % self.frame_step == 0;
        self.frames_seen += 1;
        if !keep || self.error.is_some() {
            return;
        }
        match encoder.push(self.renderer.canvas()) {
            Ok(()) => self.frames_written += 1,
            Err(e) => {
                tracing::warn!("Dropping recording frame: {}", e);
                self.error = Some(e);
            }
        }
    }
}

impl Renderer for Recorder {
    fn render(&mut self, view: &FrameView<'_>) {
        self.renderer.render(view);
        self.push_frame();
    }
}

impl CaptureSink for Recorder {
    fn capture_finished(&mut self) -> Result<()> {
        let Some(mut encoder) = self.encoder.take() else {
            return Ok(());
        };
        let finished = encoder.finish();
        tracing::info!("Recording finished, {} frames written", self.frames_written);
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("out.GIF")), OutputFormat::Gif);
        assert_eq!(OutputFormat::from_path(Path::new("a/b.mp4")), OutputFormat::Mp4);
        assert_eq!(OutputFormat::from_path(Path::new("x.webm")), OutputFormat::Webm);
        assert_eq!(OutputFormat::from_path(Path::new("frames")), OutputFormat::PngSequence);
    }

    #[test]
    fn png_sequence_numbers_frames() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("seq");
        let mut seq = PngSequence::create(&out).unwrap();
        let img = RgbaImage::new(4, 4);
        seq.push(&img).unwrap();
        seq.push(&img).unwrap();
        seq.finish().unwrap();
        assert!(out.join("frame_00000.png").exists());
        assert!(out.join("frame_00001.png").exists());
    }

    #[test]
    fn gif_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.gif");
        let mut gif = GifSink::create(&path, 30.0).unwrap();
        gif.push(&RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255]))).unwrap();
        gif.push(&RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 255, 255]))).unwrap();
        gif.finish().unwrap();
        assert!(gif.push(&RgbaImage::new(8, 8)).is_err());
        // Complete on disk while the sink is still alive.
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
        assert_eq!(bytes.last(), Some(&0x3b));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn gif_finish_reports_write_errors() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        // A tiny frame stays in the write buffer until the sink flushes.
        let mut gif = GifSink::create(full, 10.0).unwrap();
        let _ = gif.push(&RgbaImage::new(2, 2));
        assert!(matches!(gif.finish(), Err(Error::Io(_))));
    }

    #[test]
    fn stills_pick_encoder_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::from_pixel(16, 16, image::Rgba([10, 20, 30, 255]));
        let webp = dir.path().join("still.webp");
        save_still(&img, &webp, 80.0).unwrap();
        assert!(std::fs::read(&webp).unwrap().starts_with(b"RIFF"));
        let png = dir.path().join("still.png");
        save_still(&img, &png, 80.0).unwrap();
        assert_eq!(image::open(&png).unwrap().to_rgba8(), img);
    }

    #[test]
    fn finishing_without_recording_is_ok() {
        let mut rec = Recorder::new(SoftwareRenderer::new(crate::render::FontBook::empty()));
        assert!(!rec.is_recording());
        rec.capture_finished().unwrap();
    }
}
