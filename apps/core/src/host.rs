use std::collections::HashMap;
use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::icon_disk_cache::encode_png;

/// Minimal description of an installed application as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub id: String,
    pub name: String,
}

/// Host seam for everything the resolver needs to ask the operating system:
/// app lookups, app icons, and scheme-to-handler mapping. Production uses a
/// platform-backed implementation; tests use the static one.
pub trait AppRegistry: Send + Sync {
    fn app_info(&self, app_id: &str) -> Option<AppInfo>;
    fn app_icon_png(&self, app_id: &str) -> Option<Vec<u8>>;
    fn apps_for_scheme(&self, scheme: &str) -> Vec<String>;
    fn resolve_uri_handler(&self, uri: &str) -> Option<String>;
}

/// In-memory registry with explicit contents. Deterministic by
/// construction, so resolver behavior can be pinned down in tests.
#[derive(Default)]
pub struct StaticAppRegistry {
    apps: HashMap<String, AppInfo>,
    icons: HashMap<String, Vec<u8>>,
    scheme_handlers: HashMap<String, Vec<String>>,
    uri_handlers: HashMap<String, String>,
}

impl StaticAppRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_app(mut self, id: &str, name: &str, icon_png: Option<Vec<u8>>) -> Self {
        self.apps.insert(
            id.to_string(),
            AppInfo {
                id: id.to_string(),
                name: name.to_string(),
            },
        );
        if let Some(png) = icon_png {
            self.icons.insert(id.to_string(), png);
        }
        self
    }

    pub fn with_scheme_handler(mut self, scheme: &str, app_id: &str) -> Self {
        self.scheme_handlers
            .entry(scheme.to_string())
            .or_default()
            .push(app_id.to_string());
        self
    }

    /// Registers a handler visible only through URI resolution, not through
    /// scheme enumeration. Mirrors platforms where the two queries differ.
    pub fn with_uri_handler(mut self, scheme: &str, app_id: &str) -> Self {
        self.uri_handlers
            .insert(scheme.to_string(), app_id.to_string());
        self
    }

    /// Fixed registry used across tests: two installed apps with icons and
    /// one scheme binding.
    pub fn deterministic_fixture() -> Self {
        Self::empty()
            .with_app(
                "com.spotify.client",
                "Spotify",
                Some(solid_png([30, 215, 96, 255])),
            )
            .with_app(
                "org.mozilla.firefox",
                "Firefox",
                Some(solid_png([255, 149, 0, 255])),
            )
            .with_scheme_handler("spotify", "com.spotify.client")
    }
}

impl AppRegistry for StaticAppRegistry {
    fn app_info(&self, app_id: &str) -> Option<AppInfo> {
        self.apps.get(app_id).cloned()
    }

    fn app_icon_png(&self, app_id: &str) -> Option<Vec<u8>> {
        self.icons.get(app_id).cloned()
    }

    fn apps_for_scheme(&self, scheme: &str) -> Vec<String> {
        self.scheme_handlers.get(scheme).cloned().unwrap_or_default()
    }

    fn resolve_uri_handler(&self, uri: &str) -> Option<String> {
        let scheme = uri.split(':').next()?;
        if let Some(app_id) = self.uri_handlers.get(scheme) {
            return Some(app_id.clone());
        }
        self.apps_for_scheme(scheme).into_iter().next()
    }
}

/// Encodes a 16x16 solid-color PNG, used for fixture app icons.
pub fn solid_png(color: [u8; 4]) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(16, 16, Rgba(color))).unwrap_or_default()
}

/// Registry backed by the current platform, or an empty one where no
/// platform integration exists.
pub fn platform_registry() -> Arc<dyn AppRegistry> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(WindowsAppRegistry)
    }
    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(StaticAppRegistry::empty())
    }
}

/// Windows registry-backed lookups. Scheme handlers live under
/// `HKEY_CLASSES_ROOT\{scheme}` with a `URL Protocol` marker value. Icon
/// bytes are not offered here; Windows stores ICO resources inside
/// executables, and the favicon and badge paths cover those targets.
#[cfg(target_os = "windows")]
pub struct WindowsAppRegistry;

#[cfg(target_os = "windows")]
impl AppRegistry for WindowsAppRegistry {
    fn app_info(&self, app_id: &str) -> Option<AppInfo> {
        let display = read_classes_root_default(app_id)?;
        Some(AppInfo {
            id: app_id.to_string(),
            name: if display.is_empty() {
                app_id.to_string()
            } else {
                display
            },
        })
    }

    fn app_icon_png(&self, _app_id: &str) -> Option<Vec<u8>> {
        None
    }

    fn apps_for_scheme(&self, scheme: &str) -> Vec<String> {
        if classes_root_value_exists(scheme, "URL Protocol") {
            vec![scheme.to_string()]
        } else {
            Vec::new()
        }
    }

    fn resolve_uri_handler(&self, uri: &str) -> Option<String> {
        let scheme = uri.split(':').next()?;
        self.apps_for_scheme(scheme).into_iter().next()
    }
}

#[cfg(target_os = "windows")]
fn read_classes_root_default(subkey: &str) -> Option<String> {
    use windows_sys::Win32::Foundation::ERROR_SUCCESS;
    use windows_sys::Win32::System::Registry::{
        RegCloseKey, RegOpenKeyExW, RegQueryValueExW, HKEY_CLASSES_ROOT, KEY_QUERY_VALUE,
    };

    let subkey_wide = to_wide(subkey);
    let mut key = std::ptr::null_mut();
    let status = unsafe {
        RegOpenKeyExW(
            HKEY_CLASSES_ROOT,
            subkey_wide.as_ptr(),
            0,
            KEY_QUERY_VALUE,
            &mut key,
        )
    };
    if status != ERROR_SUCCESS {
        return None;
    }

    let mut value_type = 0_u32;
    let mut size = 0_u32;
    let status = unsafe {
        RegQueryValueExW(
            key,
            std::ptr::null(),
            std::ptr::null(),
            &mut value_type,
            std::ptr::null_mut(),
            &mut size,
        )
    };
    if status != ERROR_SUCCESS || size == 0 {
        unsafe {
            RegCloseKey(key);
        }
        return None;
    }

    let mut buffer = vec![0_u16; (size as usize).div_ceil(2)];
    let status = unsafe {
        RegQueryValueExW(
            key,
            std::ptr::null(),
            std::ptr::null(),
            &mut value_type,
            buffer.as_mut_ptr() as *mut u8,
            &mut size,
        )
    };
    unsafe {
        RegCloseKey(key);
    }
    if status != ERROR_SUCCESS {
        return None;
    }

    while buffer.last() == Some(&0) {
        buffer.pop();
    }
    Some(String::from_utf16_lossy(&buffer))
}

#[cfg(target_os = "windows")]
fn classes_root_value_exists(subkey: &str, value_name: &str) -> bool {
    use windows_sys::Win32::Foundation::ERROR_SUCCESS;
    use windows_sys::Win32::System::Registry::{
        RegCloseKey, RegOpenKeyExW, RegQueryValueExW, HKEY_CLASSES_ROOT, KEY_QUERY_VALUE,
    };

    let subkey_wide = to_wide(subkey);
    let value_wide = to_wide(value_name);
    let mut key = std::ptr::null_mut();
    let status = unsafe {
        RegOpenKeyExW(
            HKEY_CLASSES_ROOT,
            subkey_wide.as_ptr(),
            0,
            KEY_QUERY_VALUE,
            &mut key,
        )
    };
    if status != ERROR_SUCCESS {
        return false;
    }

    let mut value_type = 0_u32;
    let mut size = 0_u32;
    let status = unsafe {
        RegQueryValueExW(
            key,
            value_wide.as_ptr(),
            std::ptr::null(),
            &mut value_type,
            std::ptr::null_mut(),
            &mut size,
        )
    };
    unsafe {
        RegCloseKey(key);
    }
    status == ERROR_SUCCESS
}

#[cfg(target_os = "windows")]
fn to_wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::{solid_png, AppRegistry, StaticAppRegistry};

    #[test]
    fn fixture_resolves_known_app_and_scheme() {
        let registry = StaticAppRegistry::deterministic_fixture();

        let info = registry
            .app_info("com.spotify.client")
            .expect("fixture app should exist");
        assert_eq!(info.name, "Spotify");
        assert!(registry.app_icon_png("com.spotify.client").is_some());

        assert_eq!(
            registry.apps_for_scheme("spotify"),
            vec!["com.spotify.client".to_string()]
        );
        assert_eq!(
            registry.resolve_uri_handler("spotify:search:query"),
            Some("com.spotify.client".to_string())
        );
    }

    #[test]
    fn unknown_lookups_return_nothing() {
        let registry = StaticAppRegistry::empty();
        assert!(registry.app_info("missing").is_none());
        assert!(registry.app_icon_png("missing").is_none());
        assert!(registry.apps_for_scheme("gopher").is_empty());
        assert!(registry.resolve_uri_handler("gopher:hole").is_none());
    }

    #[test]
    fn solid_png_decodes_back_to_requested_color() {
        let bytes = solid_png([10, 20, 30, 255]);
        let decoded = image::load_from_memory(&bytes)
            .expect("fixture png should decode")
            .to_rgba8();
        assert_eq!(decoded.get_pixel(8, 8).0, [10, 20, 30, 255]);
    }
}
