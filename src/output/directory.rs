use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use super::OutputSink;
use crate::layout::EncodedCollage;

/// Leading tag of every suggested filename.
pub const APP_TAG: &str = "anishot-4cut";

/// `anishot-4cut-{name}-{unix ms}.png`. Path separators in the character
/// name are replaced so the result is always a single file name.
pub fn suggested_filename(character_name: &str, at: SystemTime) -> String {
    let millis = at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let name: String = character_name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c => c,
        })
        .collect();
    format!("{APP_TAG}-{name}-{millis}.png")
}

/// Writes collages into a directory, creating it on first use.
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputSink for DirectorySink {
    fn write_collage(&mut self, collage: &EncodedCollage, filename: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create output directory {}", self.root.display()))?;

        let path = self.root.join(filename);
        std::fs::write(&path, &collage.png)
            .with_context(|| format!("Failed to write collage to {}", path.display()))?;

        tracing::info!(
            "Saved {}x{} collage to {}",
            collage.width,
            collage.height,
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn filename_carries_tag_name_and_millis() {
        let at = UNIX_EPOCH + Duration::from_millis(1_714_521_600_123);
        assert_eq!(
            suggested_filename("Levi", at),
            "anishot-4cut-Levi-1714521600123.png"
        );
    }

    #[test]
    fn separators_in_names_are_neutralised() {
        let name = suggested_filename("a/b\\c", UNIX_EPOCH);
        assert_eq!(name, "anishot-4cut-a_b_c-0.png");
    }

    #[test]
    fn directory_sink_writes_png_bytes() {
        let root = std::env::temp_dir().join(format!("anishot-sink-{}", std::process::id()));
        let mut sink = DirectorySink::new(root.join("nested"));
        let collage = EncodedCollage {
            width: 1,
            height: 1,
            png: vec![0x89, b'P', b'N', b'G'],
        };

        let path = sink.write_collage(&collage, "out.png").unwrap();
        assert_eq!(path, root.join("nested").join("out.png"));
        assert_eq!(std::fs::read(&path).unwrap(), collage.png);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
