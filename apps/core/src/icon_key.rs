use sha2::{Digest, Sha256};

use crate::model::{IconMode, Target};

/// Field separator for cache keys. A control character keeps ordinary
/// labels and URLs from colliding across field boundaries.
const KEY_SEPARATOR: char = '\u{1f}';

/// Everything that can change the rendered icon for one target, plus the
/// per-call refresh flag. Equal field values must render identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRequest {
    pub target_id: String,
    pub url_pattern: String,
    pub bound_app_id: String,
    pub icon_mode: IconMode,
    pub label_text: String,
    pub background_color: u32,
    pub force_refresh: bool,
}

impl IconRequest {
    pub fn for_target(target: &Target, force_refresh: bool) -> Self {
        Self {
            target_id: target.id.to_string(),
            url_pattern: target.url_pattern.clone(),
            bound_app_id: target.bound_app_id.clone(),
            icon_mode: target.icon_mode,
            label_text: target.display_label().to_string(),
            background_color: target.background_color,
            force_refresh,
        }
    }
}

/// Deterministic key over every render input. `force_refresh` changes cache
/// behavior, not cache identity, so it is deliberately excluded.
pub fn build_cache_key(request: &IconRequest) -> String {
    let mut key = String::new();
    key.push_str(&request.target_id);
    key.push(KEY_SEPARATOR);
    key.push_str(&request.url_pattern);
    key.push(KEY_SEPARATOR);
    key.push_str(&request.bound_app_id);
    key.push(KEY_SEPARATOR);
    key.push_str(request.icon_mode.as_str());
    key.push(KEY_SEPARATOR);
    key.push_str(&request.label_text);
    key.push(KEY_SEPARATOR);
    key.push_str(&format!("{:08x}", request.background_color));
    key
}

/// Disk cache entries are addressed by the SHA-256 of the cache key, which
/// also guarantees a fixed-length, path-safe file name.
pub fn disk_file_name(cache_key: &str) -> String {
    let digest = Sha256::digest(cache_key.as_bytes());
    format!("{}.png", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::{build_cache_key, disk_file_name, IconRequest};
    use crate::model::IconMode;

    fn request() -> IconRequest {
        IconRequest {
            target_id: "7".to_string(),
            url_pattern: "https://example.com/s?q=%s".to_string(),
            bound_app_id: String::new(),
            icon_mode: IconMode::Resolved,
            label_text: "Example".to_string(),
            background_color: 0x336699ff,
            force_refresh: false,
        }
    }

    #[test]
    fn equal_requests_build_equal_keys() {
        assert_eq!(build_cache_key(&request()), build_cache_key(&request()));
    }

    #[test]
    fn force_refresh_does_not_change_the_key() {
        let mut refreshed = request();
        refreshed.force_refresh = true;
        assert_eq!(build_cache_key(&request()), build_cache_key(&refreshed));
    }

    #[test]
    fn disk_file_name_is_hex_sha256_png() {
        let name = disk_file_name("key");
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 64 + 4);
        assert!(name[..64].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
