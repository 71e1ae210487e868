use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{ForgeError, ForgeResult};

/// Families tried, in order, when resolving a system caption font.
pub const DEFAULT_CAPTION_FAMILIES: &[&str] = &["Impact", "Anton", "DejaVu Sans"];

/// Where caption glyphs come from.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FontSource {
    /// First installed family from the list, then the generic sans-serif face.
    System {
        /// Preferred family names.
        families: Vec<String>,
    },
    /// A TTF/OTF file on disk.
    File {
        /// Font file path.
        path: PathBuf,
    },
    /// Built-in glyph-less block shaper. Deterministic and font-independent.
    Block,
}

impl Default for FontSource {
    fn default() -> Self {
        Self::System {
            families: DEFAULT_CAPTION_FAMILIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Raw bytes of a resolved font face.
#[derive(Clone, Debug)]
pub struct FontBytes {
    /// Font file contents.
    pub data: Arc<Vec<u8>>,
    /// Face index inside a collection.
    pub index: u32,
}

/// Read a font file.
pub fn load_font_file(path: &std::path::Path) -> ForgeResult<FontBytes> {
    let data = std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
    Ok(FontBytes {
        data: Arc::new(data),
        index: 0,
    })
}

/// Resolve a bold face of the first available family via the system font database.
#[tracing::instrument]
pub fn find_system_font(families: &[String]) -> ForgeResult<FontBytes> {
    use usvg::fontdb;

    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!(faces = db.len(), "loaded system font database");

    let mut query_families: Vec<fontdb::Family<'_>> =
        families.iter().map(|f| fontdb::Family::Name(f.as_str())).collect();
    query_families.push(fontdb::Family::SansSerif);

    let id = db
        .query(&fontdb::Query {
            families: &query_families,
            weight: fontdb::Weight::BOLD,
            ..Default::default()
        })
        .ok_or_else(|| ForgeError::validation("no usable system font found"))?;

    db.with_face_data(id, |data, index| FontBytes {
        data: Arc::new(data.to_vec()),
        index,
    })
    .ok_or_else(|| ForgeError::validation("system font face data is unavailable"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
