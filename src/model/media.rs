use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine as _;

use crate::foundation::error::{ForgeError, ForgeResult};

/// Kind of selected media, fixed at selection time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Still raster image.
    Image,
    /// Animated image (GIF); composited from its first frame.
    AnimatedImage,
    /// Video stream.
    Video,
}

impl MediaKind {
    /// Infer the kind from a MIME type such as `image/gif` or `video/mp4`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        let essence = mime.split(';').next().unwrap_or_default().trim();
        if essence == "image/gif" {
            Some(Self::AnimatedImage)
        } else if essence.starts_with("image/") {
            Some(Self::Image)
        } else if essence.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }

    /// Infer the kind from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "gif" => Some(Self::AnimatedImage),
            "png" | "jpg" | "jpeg" | "webp" | "bmp" | "tif" | "tiff" => Some(Self::Image),
            "mp4" | "m4v" | "mov" | "webm" | "mkv" | "avi" | "ogv" => Some(Self::Video),
            _ => None,
        }
    }

    /// `true` for [`MediaKind::Video`].
    pub fn is_video(self) -> bool {
        matches!(self, Self::Video)
    }

    /// Short label used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::AnimatedImage => "animated-image",
            Self::Video => "video",
        }
    }
}

/// Where media bytes come from.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaLocator {
    /// A file on the local filesystem.
    Path(PathBuf),
    /// In-memory bytes (uploaded blob or decoded `data:` URI).
    Bytes {
        /// Raw encoded bytes.
        bytes: Arc<[u8]>,
        /// MIME type, when known.
        mime: Option<String>,
    },
}

impl MediaLocator {
    /// Parse a filesystem path or a `data:<mime>;base64,<payload>` URI.
    ///
    /// Remote URLs are rejected: fetching them belongs to the acquisition layer.
    pub fn parse(s: &str) -> ForgeResult<Self> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix("data:") {
            return Self::parse_data_uri(rest);
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return Err(ForgeError::validation(
                "remote media must be fetched before selection",
            ));
        }
        if s.is_empty() {
            return Err(ForgeError::validation("media locator must be non-empty"));
        }
        Ok(Self::Path(PathBuf::from(s)))
    }

    fn parse_data_uri(rest: &str) -> ForgeResult<Self> {
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| ForgeError::decode("data URI is missing ','"))?;
        let Some(mime) = meta.strip_suffix(";base64") else {
            return Err(ForgeError::decode("only base64 data URIs are supported"));
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ForgeError::decode(format!("data URI payload is not base64: {e}")))?;
        Ok(Self::Bytes {
            bytes: bytes.into(),
            mime: (!mime.is_empty()).then(|| mime.to_string()),
        })
    }

    /// Path of a filesystem locator.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            Self::Bytes { .. } => None,
        }
    }

    /// Read the encoded bytes.
    pub fn read_bytes(&self) -> ForgeResult<Arc<[u8]>> {
        match self {
            Self::Path(p) => std::fs::read(p).map(Arc::from).map_err(|e| {
                ForgeError::decode(format!("failed to read media '{}': {e}", p.display()))
            }),
            Self::Bytes { bytes, .. } => Ok(bytes.clone()),
        }
    }

    fn infer_kind(&self) -> Option<MediaKind> {
        match self {
            Self::Path(p) => p
                .extension()
                .and_then(|e| e.to_str())
                .and_then(MediaKind::from_extension),
            Self::Bytes { bytes, mime } => mime
                .as_deref()
                .and_then(MediaKind::from_mime)
                .or_else(|| match image::guess_format(bytes) {
                    Ok(image::ImageFormat::Gif) => Some(MediaKind::AnimatedImage),
                    Ok(_) => Some(MediaKind::Image),
                    Err(_) => None,
                }),
        }
    }
}

/// A selected piece of media. Replaced wholesale on every new selection.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaSource {
    kind: MediaKind,
    locator: MediaLocator,
}

impl MediaSource {
    /// Select media, inferring its kind from MIME type or extension.
    pub fn new(locator: MediaLocator) -> ForgeResult<Self> {
        let kind = locator
            .infer_kind()
            .ok_or_else(|| ForgeError::decode("unsupported or unrecognized media type"))?;
        Ok(Self { kind, locator })
    }

    /// Select media with an explicitly known kind.
    pub fn with_kind(kind: MediaKind, locator: MediaLocator) -> Self {
        Self { kind, locator }
    }

    /// Parse a locator string and select it.
    pub fn parse(s: &str) -> ForgeResult<Self> {
        Self::new(MediaLocator::parse(s)?)
    }

    /// Media kind.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Media locator.
    pub fn locator(&self) -> &MediaLocator {
        &self.locator
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/media.rs"]
mod tests;
