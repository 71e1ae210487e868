use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::foundation::core::Size;
use crate::foundation::error::{ForgeError, ForgeResult};

/// Locations of the external `ffmpeg`/`ffprobe` binaries.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FfmpegTools {
    /// `ffmpeg` executable.
    pub ffmpeg: PathBuf,
    /// `ffprobe` executable.
    pub ffprobe: PathBuf,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl FfmpegTools {
    /// Return `true` when both binaries can be executed.
    pub fn available(&self) -> bool {
        let runs = |bin: &Path| {
            Command::new(bin)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|s| s.success())
                .unwrap_or(false)
        };
        runs(&self.ffmpeg) && runs(&self.ffprobe)
    }
}

/// Basic metadata about a source video file.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoSourceInfo {
    /// Path used for probing/decoding.
    pub source_path: PathBuf,
    /// Frame dimensions.
    pub size: Size,
    /// Average frame rate, when ffprobe reports one.
    pub fps: Option<f64>,
}

/// Probe source video metadata through `ffprobe`.
#[tracing::instrument(skip(tools))]
pub fn probe_video(tools: &FfmpegTools, source_path: &Path) -> ForgeResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        avg_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
    }

    let out = Command::new(&tools.ffprobe)
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(source_path)
        .output()
        .map_err(|e| ForgeError::decode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ForgeError::decode(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ForgeError::decode(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ForgeError::decode("no video stream found"))?;
    let width = stream
        .width
        .ok_or_else(|| ForgeError::decode("missing video width from ffprobe"))?;
    let height = stream
        .height
        .ok_or_else(|| ForgeError::decode("missing video height from ffprobe"))?;
    let size = Size::non_empty(width, height)
        .map_err(|_| ForgeError::decode("ffprobe reported zero video dimensions"))?;

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        size,
        fps: stream.avg_frame_rate.as_deref().and_then(parse_rational),
    })
}

/// Spawn `ffmpeg` streaming the whole video as tightly packed RGBA frames on stdout.
pub fn spawn_rgba_stream(tools: &FfmpegTools, info: &VideoSourceInfo) -> ForgeResult<Child> {
    Command::new(&tools.ffmpeg)
        .args(["-v", "error", "-i"])
        .arg(&info.source_path)
        .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ForgeError::decode(format!("failed to spawn ffmpeg for video decode: {e}")))
}

fn parse_rational(s: &str) -> Option<f64> {
    let (num, den) = s.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    (den > 0.0 && num > 0.0).then_some(num / den)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
