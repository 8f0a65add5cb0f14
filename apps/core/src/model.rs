use image::RgbaImage;

/// Placeholder token substituted with the percent-encoded query when a
/// target is opened.
pub const QUERY_PLACEHOLDER: &str = "%s";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconMode {
    Generated,
    Resolved,
}

impl IconMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::Resolved => "resolved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "generated" => Some(Self::Generated),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconOrigin {
    Cached,
    Generated,
    ResolvedPackage,
    ResolvedFavicon,
    ResolvedIntent,
    FallbackDefault,
}

impl IconOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Generated => "generated",
            Self::ResolvedPackage => "resolved_package",
            Self::ResolvedFavicon => "resolved_favicon",
            Self::ResolvedIntent => "resolved_intent",
            Self::FallbackDefault => "fallback_default",
        }
    }
}

/// Rendered icon plus where it came from. Origin is diagnostic only; no
/// correctness decision may depend on it.
#[derive(Debug, Clone)]
pub struct IconArtifact {
    pub image: RgbaImage,
    pub origin: IconOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroup {
    pub id: i64,
    pub name: String,
    pub order_index: i64,
}

impl TargetGroup {
    pub fn new(id: i64, name: &str, order_index: i64) -> Self {
        Self {
            id,
            name: name.to_string(),
            order_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: i64,
    pub group_id: i64,
    pub label: String,
    pub url_pattern: String,
    pub bound_app_id: String,
    pub icon_mode: IconMode,
    pub label_text: String,
    pub background_color: u32,
    pub order_index: i64,
}

impl Target {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        group_id: i64,
        label: &str,
        url_pattern: &str,
        bound_app_id: &str,
        icon_mode: IconMode,
        label_text: &str,
        background_color: u32,
        order_index: i64,
    ) -> Self {
        Self {
            id,
            group_id,
            label: label.to_string(),
            url_pattern: url_pattern.to_string(),
            bound_app_id: bound_app_id.to_string(),
            icon_mode,
            label_text: label_text.to_string(),
            background_color,
            order_index,
        }
    }

    /// Text shown on generated badges and used when resolution falls back:
    /// the explicit badge text when set, the target label otherwise.
    pub fn display_label(&self) -> &str {
        if self.label_text.trim().is_empty() {
            &self.label
        } else {
            &self.label_text
        }
    }
}

/// Replaces the query placeholder with the percent-encoded query. Patterns
/// without a placeholder are returned unchanged.
pub fn substitute_query(pattern: &str, query: &str) -> String {
    if !pattern.contains(QUERY_PLACEHOLDER) {
        return pattern.to_string();
    }
    pattern.replace(QUERY_PLACEHOLDER, &url_encode_component(query.trim()))
}

pub fn url_encode_component(input: &str) -> String {
    let mut out = String::new();
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else if byte == b' ' {
            out.push('+');
        } else {
            out.push('%');
            out.push_str(&format!("{byte:02X}"));
        }
    }
    out
}
