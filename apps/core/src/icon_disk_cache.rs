use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::icon_key::disk_file_name;
use crate::logging;

/// Content-addressed store of externally resolved icons. One PNG per cache
/// key; presence is existence, the file name is the check. Reads and writes
/// never fail the surrounding request.
pub struct IconDiskCache {
    dir: PathBuf,
}

impl IconDiskCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the stored bytes for a key, or nothing on a missing,
    /// unreadable, or undecodable file. Corruption is a miss, not an error.
    pub fn load(&self, cache_key: &str) -> Option<Vec<u8>> {
        let path = self.dir.join(disk_file_name(cache_key));
        let bytes = fs::read(path).ok()?;
        image::load_from_memory(&bytes).ok()?;
        Some(bytes)
    }

    /// Writes to a temp file, then renames over the final name so readers
    /// never observe a partial entry. Failures are logged and swallowed.
    pub fn store(&self, cache_key: &str, bytes: &[u8]) {
        if let Err(error) = self.try_store(cache_key, bytes) {
            logging::warn(&format!("icon disk cache write failed: {error}"));
        }
    }

    fn try_store(&self, cache_key: &str, bytes: &[u8]) -> Result<(), String> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| format!("failed to create icon cache dir: {e}"))?;

        let file_name = disk_file_name(cache_key);
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let temp_path = self.dir.join(format!("{file_name}.tmp-{unique}"));
        let final_path = self.dir.join(file_name);

        fs::write(&temp_path, bytes).map_err(|e| format!("failed to write temp entry: {e}"))?;
        fs::rename(&temp_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            format!("failed to commit entry: {e}")
        })?;
        Ok(())
    }

    /// Deletes oldest-modified entries until the directory fits the byte
    /// budget. A budget of 0 disables pruning. Returns entries removed.
    pub fn enforce_budget(&self, budget_bytes: u64) -> usize {
        if budget_bytes == 0 {
            return 0;
        }
        let Ok(dir_entries) = fs::read_dir(&self.dir) else {
            return 0;
        };

        let mut entries = dir_entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("png"))
                    .unwrap_or(false)
            })
            .filter_map(|entry| {
                let meta = entry.metadata().ok()?;
                let modified = meta.modified().unwrap_or(UNIX_EPOCH);
                Some((entry.path(), meta.len(), modified))
            })
            .collect::<Vec<_>>();

        let mut total: u64 = entries.iter().map(|(_, len, _)| len).sum();
        if total <= budget_bytes {
            return 0;
        }

        entries.sort_by_key(|(_, _, modified)| *modified);
        let mut removed = 0;
        for (path, len, _) in entries {
            if total <= budget_bytes {
                break;
            }
            if fs::remove_file(&path).is_ok() {
                total = total.saturating_sub(len);
                removed += 1;
            }
        }

        if removed > 0 {
            logging::info(&format!("icon disk cache pruned {removed} entries"));
        }
        removed
    }
}

pub fn encode_png(image: &RgbaImage) -> Option<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .ok()?;
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{encode_png, IconDiskCache};
    use crate::text_icon::render_text_icon;

    fn temp_cache(tag: &str) -> IconDiskCache {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be valid")
            .as_nanos();
        IconDiskCache::new(std::env::temp_dir().join(format!("searchfan-disk-{tag}-{unique}")))
    }

    fn png_bytes(label: &str) -> Vec<u8> {
        encode_png(&render_text_icon(label, 0x113355ff)).expect("png should encode")
    }

    #[test]
    fn store_then_load_round_trips() {
        let cache = temp_cache("roundtrip");
        let bytes = png_bytes("R");

        cache.store("key-a", &bytes);
        let loaded = cache.load("key-a").expect("entry should load");

        assert_eq!(loaded, bytes);
        let _ = std::fs::remove_dir_all(cache.dir());
    }

    #[test]
    fn missing_entry_loads_as_none() {
        let cache = temp_cache("missing");
        assert!(cache.load("absent").is_none());
    }

    #[test]
    fn corrupt_entry_loads_as_none() {
        let cache = temp_cache("corrupt");
        cache.store("key-b", b"not a png");

        assert!(cache.load("key-b").is_none());
        let _ = std::fs::remove_dir_all(cache.dir());
    }

    #[test]
    fn budget_prunes_down_to_fit() {
        let cache = temp_cache("budget");
        let bytes = png_bytes("P");
        cache.store("one", &bytes);
        cache.store("two", &bytes);
        cache.store("three", &bytes);

        let removed = cache.enforce_budget(bytes.len() as u64 + 1);

        assert_eq!(removed, 2);
        let remaining = std::fs::read_dir(cache.dir())
            .expect("cache dir should exist")
            .filter_map(|entry| entry.ok())
            .count();
        assert_eq!(remaining, 1);
        let _ = std::fs::remove_dir_all(cache.dir());
    }

    #[test]
    fn zero_budget_disables_pruning() {
        let cache = temp_cache("unbounded");
        cache.store("keep", &png_bytes("K"));

        assert_eq!(cache.enforce_budget(0), 0);
        assert!(cache.load("keep").is_some());
        let _ = std::fs::remove_dir_all(cache.dir());
    }
}
