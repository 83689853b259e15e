use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use thiserror::Error;

use crate::shared::constants::FONT_EXTENSIONS;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a usable TrueType/OpenType font")]
    Invalid { path: PathBuf },
    #[error("no font found; pass --font or place a .ttf/.otf file in {searched}")]
    NotFound { searched: String },
}

/// Well-known locations of fonts with broad Unicode coverage.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Resolve the overlay font.
///
/// Resolution order:
/// 1. Explicit path
/// 2. User font directory (`<data_dir>/LiveTranslate/fonts/`, first match by name)
/// 3. Well-known system font paths
pub fn resolve(explicit: Option<&Path>) -> Result<PathBuf, FontError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(FontError::Read {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            })
        };
    }

    let user_dir = user_font_dir();
    if let Some(found) = user_dir.as_deref().and_then(first_font_in) {
        return Ok(found);
    }

    SYSTEM_FONTS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .ok_or_else(|| FontError::NotFound {
            searched: user_dir
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "the user data directory".to_string()),
        })
}

pub fn load(path: &Path) -> Result<FontVec, FontError> {
    let bytes = fs::read(path).map_err(|e| FontError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    FontVec::try_from_vec(bytes).map_err(|_| FontError::Invalid {
        path: path.to_path_buf(),
    })
}

/// Platform-specific font directory.
///
/// - Linux: `$XDG_DATA_HOME/LiveTranslate/fonts/` or `~/.local/share/LiveTranslate/fonts/`
/// - macOS: `~/Library/Application Support/LiveTranslate/fonts/`
/// - Windows: `%APPDATA%/LiveTranslate/fonts/`
pub fn user_font_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("LiveTranslate").join("fonts"))
}

fn first_font_in(dir: &Path) -> Option<PathBuf> {
    let mut fonts: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_font_file(p))
        .collect();
    fonts.sort();
    fonts.into_iter().next()
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
