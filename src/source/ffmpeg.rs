use std::io::{Read as _, Write as _};
use std::path::PathBuf;
use std::process::{Child, ChildStdout};

use anyhow::Context as _;

use crate::assets::decode::DecodedFrame;
use crate::assets::media::{FfmpegTools, VideoSourceInfo, probe_video, spawn_rgba_stream};
use crate::foundation::core::Size;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::model::media::MediaLocator;
use crate::source::video::VideoDecoder;

/// Decoder that probes with `ffprobe` and streams RGBA frames from a child `ffmpeg`.
///
/// In-memory video blobs are spooled to a temporary file first.
pub struct FfmpegVideoDecoder {
    tools: FfmpegTools,
    path: PathBuf,
    _spool: Option<tempfile::NamedTempFile>,
    info: Option<VideoSourceInfo>,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    ended: bool,
}

impl FfmpegVideoDecoder {
    /// Prepare a decoder for `locator`. No process is started yet.
    pub fn new(tools: FfmpegTools, locator: &MediaLocator) -> ForgeResult<Self> {
        let (path, spool) = match locator {
            MediaLocator::Path(p) => (p.clone(), None),
            MediaLocator::Bytes { bytes, .. } => {
                let mut file = tempfile::NamedTempFile::new().context("create video spool file")?;
                file.write_all(bytes).context("write video spool file")?;
                file.flush().context("flush video spool file")?;
                (file.path().to_path_buf(), Some(file))
            }
        };
        Ok(Self {
            tools,
            path,
            _spool: spool,
            info: None,
            child: None,
            stdout: None,
            ended: false,
        })
    }

    fn ensure_stream(&mut self, info: &VideoSourceInfo) -> ForgeResult<()> {
        if self.stdout.is_none() {
            let mut child = spawn_rgba_stream(&self.tools, info)?;
            self.stdout = child.stdout.take();
            self.child = Some(child);
            tracing::debug!(path = %self.path.display(), size = %info.size, "ffmpeg stream started");
        }
        Ok(())
    }

    fn finish_stream(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl VideoDecoder for FfmpegVideoDecoder {
    fn load_metadata(&mut self) -> ForgeResult<Option<Size>> {
        if self.info.is_none() {
            self.info = Some(probe_video(&self.tools, &self.path)?);
        }
        Ok(self.info.as_ref().map(|i| i.size))
    }

    fn frame_rate(&self) -> Option<f64> {
        self.info.as_ref().and_then(|i| i.fps)
    }

    fn next_frame(&mut self) -> ForgeResult<Option<DecodedFrame>> {
        if self.ended {
            return Ok(None);
        }
        let Some(info) = self.info.clone() else {
            return Ok(None);
        };
        self.ensure_stream(&info)?;
        let stdout = self
            .stdout
            .as_mut()
            .ok_or_else(|| ForgeError::decode("ffmpeg stdout is not captured"))?;

        let mut buf = vec![0u8; info.size.rgba_len()];
        match stdout.read_exact(&mut buf) {
            Ok(()) => DecodedFrame::from_straight_rgba8(info.size.width, info.size.height, buf)
                .map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                tracing::debug!(path = %self.path.display(), "video stream ended");
                self.ended = true;
                self.finish_stream();
                Ok(None)
            }
            Err(e) => {
                self.finish_stream();
                Err(ForgeError::decode(format!(
                    "reading decoded frame from ffmpeg failed: {e}"
                )))
            }
        }
    }
}

impl Drop for FfmpegVideoDecoder {
    fn drop(&mut self) {
        self.finish_stream();
    }
}
