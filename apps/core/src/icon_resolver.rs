use std::sync::Arc;

use image::RgbaImage;

use crate::favicon::{candidate_urls, FaviconFetcher};
use crate::host::AppRegistry;
use crate::icon_key::IconRequest;
use crate::logging;
use crate::model::{IconArtifact, IconMode, IconOrigin, QUERY_PLACEHOLDER};
use crate::text_icon::render_text_icon;

/// Schemes whose handler apps are well known, consulted before asking the
/// host. Keeps common deep-link targets working on machines where the
/// platform registry is slow or empty.
const SCHEME_APPS: &[(&str, &str)] = &[
    ("spotify", "com.spotify.client"),
    ("steam", "com.valvesoftware.steam"),
    ("discord", "com.discordapp.discord"),
    ("slack", "com.tinyspeck.slackmacgap"),
    ("zoommtg", "us.zoom.xos"),
    ("mailto", "com.apple.mail"),
    ("tg", "org.telegram.desktop"),
    ("whatsapp", "net.whatsapp.WhatsApp"),
];

/// Turns one icon request into exactly one artifact. Resolution never
/// fails outright; when every external source comes up empty the result is
/// a generated badge marked as not genuinely resolved.
pub struct IconResolver {
    registry: Arc<dyn AppRegistry>,
    fetcher: Arc<dyn FaviconFetcher>,
}

impl IconResolver {
    pub fn new(registry: Arc<dyn AppRegistry>, fetcher: Arc<dyn FaviconFetcher>) -> Self {
        Self { registry, fetcher }
    }

    /// Resolves an artifact for the request. The second value reports
    /// whether the icon came from a real external source; badge output,
    /// generated or fallback, is never persisted as resolved.
    pub fn resolve(&self, request: &IconRequest) -> (IconArtifact, bool) {
        if request.icon_mode == IconMode::Generated {
            let image = render_text_icon(&request.label_text, request.background_color);
            return (
                IconArtifact {
                    image,
                    origin: IconOrigin::Generated,
                },
                true,
            );
        }

        if let Some(artifact) = self.resolve_external(request) {
            return (artifact, true);
        }

        logging::info(&format!(
            "icon resolution fell back to badge for target {}",
            request.target_id
        ));
        let image = render_text_icon(&request.label_text, request.background_color);
        (
            IconArtifact {
                image,
                origin: IconOrigin::FallbackDefault,
            },
            false,
        )
    }

    fn resolve_external(&self, request: &IconRequest) -> Option<IconArtifact> {
        if !request.bound_app_id.is_empty() {
            if let Some(image) = self.app_icon(&request.bound_app_id) {
                return Some(IconArtifact {
                    image,
                    origin: IconOrigin::ResolvedPackage,
                });
            }
        }

        if let Some(package) = extract_intent_package(&request.url_pattern) {
            if let Some(image) = self.app_icon(&package) {
                return Some(IconArtifact {
                    image,
                    origin: IconOrigin::ResolvedPackage,
                });
            }
        }

        let scheme = pattern_scheme(&request.url_pattern);
        if let Some(scheme) = scheme.as_deref() {
            if !is_web_scheme(scheme) {
                if let Some(image) = self.scheme_app_icon(scheme) {
                    return Some(IconArtifact {
                        image,
                        origin: IconOrigin::ResolvedPackage,
                    });
                }
            }
        }

        if let Some(host) = pattern_host(&request.url_pattern) {
            if let Some(image) = self.fetch_favicon(&host) {
                return Some(IconArtifact {
                    image,
                    origin: IconOrigin::ResolvedFavicon,
                });
            }
        }

        if let Some(image) = self.uri_handler_icon(&request.url_pattern) {
            return Some(IconArtifact {
                image,
                origin: IconOrigin::ResolvedIntent,
            });
        }

        None
    }

    /// App icon bytes via the host, validated by decoding. Either lookup
    /// or decode failing means this source has nothing.
    fn app_icon(&self, app_id: &str) -> Option<RgbaImage> {
        self.registry.app_info(app_id)?;
        let bytes = self.registry.app_icon_png(app_id)?;
        decode_icon(&bytes)
    }

    fn scheme_app_icon(&self, scheme: &str) -> Option<RgbaImage> {
        if let Some((_, app_id)) = SCHEME_APPS.iter().find(|(known, _)| *known == scheme) {
            if let Some(image) = self.app_icon(app_id) {
                return Some(image);
            }
        }
        for app_id in self.registry.apps_for_scheme(scheme) {
            if let Some(image) = self.app_icon(&app_id) {
                return Some(image);
            }
        }
        None
    }

    fn fetch_favicon(&self, host: &str) -> Option<RgbaImage> {
        for url in candidate_urls(host) {
            match self.fetcher.fetch(&url) {
                Ok(bytes) => {
                    if let Some(image) = decode_icon(&bytes) {
                        return Some(image);
                    }
                    logging::warn(&format!("favicon from {url} did not decode"));
                }
                Err(error) => logging::info(&error.to_string()),
            }
        }
        None
    }

    fn uri_handler_icon(&self, url_pattern: &str) -> Option<RgbaImage> {
        let probe = url_pattern.replace(QUERY_PLACEHOLDER, "query");
        let handler = self.registry.resolve_uri_handler(&probe)?;
        self.app_icon(&handler)
    }
}

/// Pulls the `package=` segment out of an `intent:` pattern. Segments are
/// separated by `;`, matching the Android intent URI layout.
pub fn extract_intent_package(url_pattern: &str) -> Option<String> {
    if !url_pattern.starts_with("intent:") {
        return None;
    }
    url_pattern
        .split(';')
        .find_map(|segment| segment.strip_prefix("package="))
        .filter(|package| !package.is_empty())
        .map(str::to_string)
}

fn pattern_scheme(url_pattern: &str) -> Option<String> {
    parse_pattern(url_pattern).map(|url| url.scheme().to_string())
}

fn pattern_host(url_pattern: &str) -> Option<String> {
    let url = parse_pattern(url_pattern)?;
    if !is_web_scheme(url.scheme()) {
        return None;
    }
    url.host_str().map(str::to_string)
}

/// Parses the pattern with the placeholder substituted, since `%s` itself
/// is valid percent-encoding noise that can shift the parse.
fn parse_pattern(url_pattern: &str) -> Option<url::Url> {
    let probe = url_pattern.replace(QUERY_PLACEHOLDER, "query");
    url::Url::parse(&probe).ok()
}

fn is_web_scheme(scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
}

fn decode_icon(bytes: &[u8]) -> Option<RgbaImage> {
    image::load_from_memory(bytes).ok().map(|img| img.to_rgba8())
}
