use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::error::{FigpipeError, FigpipeResult};

/// Zero-padded width of frame indices. Lexicographic order of frame file
/// names equals numeric order only while every index fits this width.
pub const FRAME_INDEX_WIDTH: usize = 2;

/// Substring predicate over file names: all of `all`, at least one of `any`
/// (when non-empty), none of `none`.
#[derive(Clone, Copy, Debug)]
pub struct NameFilter {
    pub all: &'static [&'static str],
    pub any: &'static [&'static str],
    pub none: &'static [&'static str],
}

impl NameFilter {
    pub fn matches(&self, name: &str) -> bool {
        self.all.iter().all(|s| name.contains(s))
            && (self.any.is_empty() || self.any.iter().any(|s| name.contains(s)))
            && !self.none.iter().any(|s| name.contains(s))
    }
}

/// One image file of a frame sequence.
#[derive(Clone, Debug)]
pub struct FrameFile {
    pub path: PathBuf,
    pub file_name: String,
    pub index: u32,
}

/// An ordered, contiguous sequence of frame files sharing one name root
/// (e.g. `uwincm_clouds_day1_anim_`).
#[derive(Clone, Debug)]
pub struct FrameSet {
    pub dir: PathBuf,
    pub root: String,
    pub ext: String,
    frames: Vec<FrameFile>,
}

impl FrameSet {
    /// Lists `dir` and collects `{root}{NN}.{ext}` files sorted by parsed
    /// numeric index. A file that carries the root but not a well-formed
    /// zero-padded index is an error rather than a silent mis-sort.
    pub fn load(dir: &Path, root: &str) -> FigpipeResult<Self> {
        let mut frames = Vec::new();
        let mut ext = String::new();
        for name in list_file_names(dir)? {
            if !name.starts_with(root) {
                continue;
            }
            let (index, this_ext) = parse_frame_suffix(&name, root).ok_or_else(|| {
                FigpipeError::validation(format!(
                    "file '{name}' matches root '{root}' but lacks a {FRAME_INDEX_WIDTH}-digit frame index"
                ))
            })?;
            if ext.is_empty() {
                ext = this_ext.to_string();
            }
            frames.push(FrameFile {
                path: dir.join(&name),
                file_name: name,
                index,
            });
        }
        frames.sort_by_key(|f| f.index);

        let set = Self {
            dir: dir.to_path_buf(),
            root: root.to_string(),
            ext,
            frames,
        };
        set.check_contiguous()?;
        Ok(set)
    }

    fn check_contiguous(&self) -> FigpipeResult<()> {
        for pair in self.frames.windows(2) {
            if pair[1].index != pair[0].index + 1 {
                return Err(FigpipeError::validation(format!(
                    "frame set '{}' is not contiguous: index {} followed by {}",
                    self.root, pair[0].index, pair[1].index
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[FrameFile] {
        &self.frames
    }

    pub fn last(&self) -> Option<&FrameFile> {
        self.frames.last()
    }

    /// Drops frames beyond `len` (panel quadrants cap at the expected count
    /// since earlier stages may have appended persisted trailing frames).
    pub fn truncate(&mut self, len: usize) {
        self.frames.truncate(len);
    }

    /// Path a frame with the given index would have under this set's root.
    pub fn path_for_index(&self, index: u32) -> PathBuf {
        let name = format!(
            "{root}{index:0width$}.{ext}",
            root = self.root,
            width = FRAME_INDEX_WIDTH,
            ext = self.ext
        );
        self.dir.join(name)
    }
}

fn parse_frame_suffix<'a>(name: &'a str, root: &str) -> Option<(u32, &'a str)> {
    let rest = name.strip_prefix(root)?;
    let (digits, ext) = rest.split_once('.')?;
    if digits.len() != FRAME_INDEX_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((digits.parse().ok()?, ext))
}

/// Positional pairing of two frame sets for side-by-side composition.
///
/// The i-th file of `left` pairs with the i-th file of `right`; there is no
/// content- or timestamp-based alignment. Fails closed on any count mismatch.
pub fn pair<'a>(
    left: &'a FrameSet,
    right: &'a FrameSet,
) -> FigpipeResult<Vec<(&'a FrameFile, &'a FrameFile)>> {
    if left.len() != right.len() {
        return Err(FigpipeError::validation(format!(
            "frame count mismatch: '{}' has {}, '{}' has {}",
            left.root,
            left.len(),
            right.root,
            right.len()
        )));
    }
    Ok(left.frames.iter().zip(right.frames.iter()).collect())
}

/// Sorted file names of `dir` matching `filter`.
pub fn select(dir: &Path, filter: &NameFilter) -> FigpipeResult<Vec<String>> {
    Ok(list_file_names(dir)?
        .into_iter()
        .filter(|name| filter.matches(name))
        .collect())
}

pub fn list_file_names(dir: &Path) -> FigpipeResult<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("list directory '{}'", dir.display()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("list directory '{}'", dir.display()))?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false)
            && let Some(name) = entry.file_name().to_str()
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Renames `...-{n}.{ext}` files (upstream MIMIC-TPW numbering) to the
/// zero-padded `..._{NN}.{ext}` convention so they sort as frames.
pub fn normalize_trailing_index(dir: &Path, contains: &str) -> FigpipeResult<usize> {
    let mut renamed = 0usize;
    for name in list_file_names(dir)? {
        if !name.contains(contains) {
            continue;
        }
        let Some((stem, ext)) = name.rsplit_once('.') else {
            continue;
        };
        let Some((head, digits)) = stem.rsplit_once('-') else {
            continue;
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let index: u32 = digits
            .parse()
            .map_err(|_| FigpipeError::validation(format!("frame index overflow in '{name}'")))?;
        let new_name = format!("{head}_{index:02}.{ext}");
        std::fs::rename(dir.join(&name), dir.join(&new_name))
            .with_context(|| format!("rename '{name}' to '{new_name}'"))?;
        renamed += 1;
    }
    Ok(renamed)
}
