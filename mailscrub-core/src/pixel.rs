//! pixel.rs - Heuristic detection and removal of tracking pixels.
//!
//! An image is treated as a tracking pixel when one strong signal fires
//! (known tracking host, known tracking query parameter, hidden by inline
//! style) or when at least two weak signals agree (tiny dimensions,
//! transparent image, no alt text). Anything malformed counts as "signal
//! absent", so a classification failure keeps the image.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::element::{DocumentLike, ElementLike};

/// The two transparent 1x1 GIFs most commonly inlined as beacons.
pub const TRANSPARENT_GIF_DATA_URIS: [&str; 2] = [
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7",
    "data:image/gif;base64,R0lGODlhAQABAAAAACH5BAEKAAEALAAAAAABAAEAAAICTAEAOw==",
];

/// Hosts that serve open-tracking beacons.
pub const DEFAULT_TRACKING_DOMAINS: &[&str] = &[
    "google-analytics.com",
    "doubleclick.net",
    "list-manage.com",
    "mailtrack.io",
    "mandrillapp.com",
    "mixpanel.com",
    "emltrk.com",
    "sendgrid.net",
    "mailchimp.com",
    "hubspotemail.net",
    "exct.net",
    "pixel.wp.com",
];

/// Query parameters that only appear on open-tracking requests.
pub const DEFAULT_TRACKING_PARAMS: &[&str] = &[
    "open_id",
    "tracking_id",
    "trk_open",
    "email_open",
    "pixel_id",
    "mc_eid",
];

/// Off-screen offset below which an absolutely positioned image counts as hidden.
const OFFSCREEN_OFFSET: f64 = 1000.0;

lazy_static! {
    static ref DISPLAY_NONE: Regex = Regex::new(r"(?i)(?:^|[;\s])display\s*:\s*none\b").unwrap();
    static ref VISIBILITY_HIDDEN: Regex = Regex::new(r"(?i)(?:^|[;\s])visibility\s*:\s*hidden\b").unwrap();
    static ref POSITION_ABSOLUTE: Regex = Regex::new(r"(?i)(?:^|[;\s])position\s*:\s*absolute\b").unwrap();
    static ref OFFSET: Regex = Regex::new(r"(?i)(?:^|[;\s])(?:left|top)\s*:\s*(-?\d+(?:\.\d+)?)").unwrap();
    static ref STYLE_WIDTH: Regex = Regex::new(r"(?i)(?:^|[;\s])width\s*:\s*(\d+(?:\.\d+)?)\s*px\b").unwrap();
    static ref STYLE_HEIGHT: Regex = Regex::new(r"(?i)(?:^|[;\s])height\s*:\s*(\d+(?:\.\d+)?)\s*px\b").unwrap();
    static ref OPACITY: Regex = Regex::new(r"(?i)(?:^|[;\s])opacity\s*:\s*(\d*\.?\d+)").unwrap();
    static ref DIMENSION_ATTR: Regex = Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*(?:px)?\s*$").unwrap();
}

/// Tuning knobs for the tracking-pixel heuristic.
///
/// Missing fields in a deserialized document fall back to the defaults, so a
/// config file only needs to list what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingPixelOptions {
    /// Inclusive upper bound, in pixels, for both width and height of a "tiny" image.
    pub max_pixel_size: u32,
    /// Hosts (and their subdomains) whose images are always removed.
    pub tracking_domains: Vec<String>,
    /// Query parameter names whose presence marks an image as a beacon.
    pub tracking_params: Vec<String>,
    pub remove_no_alt_images: bool,
    pub remove_transparent_images: bool,
}

impl Default for TrackingPixelOptions {
    fn default() -> Self {
        Self {
            max_pixel_size: 2,
            tracking_domains: DEFAULT_TRACKING_DOMAINS.iter().map(|s| s.to_string()).collect(),
            tracking_params: DEFAULT_TRACKING_PARAMS.iter().map(|s| s.to_string()).collect(),
            remove_no_alt_images: true,
            remove_transparent_images: true,
        }
    }
}

/// Caller overrides for [`TrackingPixelOptions`]; `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingPixelOverrides {
    pub max_pixel_size: Option<u32>,
    pub tracking_domains: Option<Vec<String>>,
    pub tracking_params: Option<Vec<String>>,
    pub remove_no_alt_images: Option<bool>,
    pub remove_transparent_images: Option<bool>,
}

impl TrackingPixelOptions {
    /// Applies `overrides` field by field, the override winning where set.
    pub fn merged(self, overrides: TrackingPixelOverrides) -> Self {
        Self {
            max_pixel_size: overrides.max_pixel_size.unwrap_or(self.max_pixel_size),
            tracking_domains: overrides.tracking_domains.unwrap_or(self.tracking_domains),
            tracking_params: overrides.tracking_params.unwrap_or(self.tracking_params),
            remove_no_alt_images: overrides.remove_no_alt_images.unwrap_or(self.remove_no_alt_images),
            remove_transparent_images: overrides
                .remove_transparent_images
                .unwrap_or(self.remove_transparent_images),
        }
    }
}

/// Which rule decided that an image is a tracking pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelVerdict {
    TrackingDomain,
    TrackingParam,
    Hidden,
    WeakSignals,
}

/// Classifies and removes tracking pixels.
#[derive(Debug, Clone)]
pub struct TrackerPixelRemover {
    options: TrackingPixelOptions,
    domains: Vec<String>,
    params: Vec<String>,
}

impl Default for TrackerPixelRemover {
    fn default() -> Self {
        Self::new(TrackingPixelOptions::default())
    }
}

impl TrackerPixelRemover {
    pub fn new(options: TrackingPixelOptions) -> Self {
        let domains = options
            .tracking_domains
            .iter()
            .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        let params = options
            .tracking_params
            .iter()
            .map(|p| p.trim().to_ascii_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { options, domains, params }
    }

    pub fn options(&self) -> &TrackingPixelOptions {
        &self.options
    }

    pub fn is_tracking_pixel<E: ElementLike + ?Sized>(&self, element: &E) -> bool {
        self.classify(element).is_some()
    }

    /// Returns the deciding signal, or `None` if the image should be kept.
    pub fn classify<E: ElementLike + ?Sized>(&self, element: &E) -> Option<PixelVerdict> {
        let src = element.get_attribute("src")?;
        let src = src.trim();
        if src.is_empty() {
            return None;
        }
        let parsed = Url::parse(src).ok();

        if self.has_tracking_domain(src, parsed.as_ref()) {
            return Some(PixelVerdict::TrackingDomain);
        }
        if self.has_tracking_param(src, parsed.as_ref()) {
            return Some(PixelVerdict::TrackingParam);
        }

        let style = element.get_attribute("style").unwrap_or_default();
        if is_hidden(&style) {
            return Some(PixelVerdict::Hidden);
        }

        let mut weak = 0;
        if self.is_tiny(element, &style) {
            weak += 1;
        }
        if self.options.remove_transparent_images && is_transparent(src, &style) {
            weak += 1;
        }
        if self.options.remove_no_alt_images && lacks_alt(element) {
            weak += 1;
        }
        (weak >= 2).then_some(PixelVerdict::WeakSignals)
    }

    /// Removes every tracking pixel in `document`, returning how many were removed.
    pub fn clean<D: DocumentLike + ?Sized>(&self, document: &D) -> usize {
        let mut removed = 0;
        for mut image in document.image_elements() {
            if let Some(verdict) = self.classify(&image) {
                debug!("Removing tracking pixel ({:?}).", verdict);
                image.remove();
                removed += 1;
            }
        }
        removed
    }

    fn has_tracking_domain(&self, src: &str, parsed: Option<&Url>) -> bool {
        match parsed {
            Some(url) => {
                let Some(host) = url.host_str() else {
                    return false;
                };
                let host = host.trim_end_matches('.').to_ascii_lowercase();
                self.domains.iter().any(|d| {
                    host == *d || (host.len() > d.len() && host.ends_with(d.as_str()) && host.as_bytes()[host.len() - d.len() - 1] == b'.')
                })
            }
            None => {
                let lowered = src.to_ascii_lowercase();
                self.domains.iter().any(|d| lowered.contains(d.as_str()))
            }
        }
    }

    fn has_tracking_param(&self, src: &str, parsed: Option<&Url>) -> bool {
        match parsed {
            Some(url) => url
                .query_pairs()
                .any(|(name, _)| self.params.iter().any(|p| name.eq_ignore_ascii_case(p))),
            None => {
                let lowered = src.to_ascii_lowercase();
                self.params.iter().any(|p| lowered.contains(&format!("{}=", p)))
            }
        }
    }

    fn is_tiny<E: ElementLike + ?Sized>(&self, element: &E, style: &str) -> bool {
        let width = element
            .get_attribute("width")
            .and_then(|v| parse_dimension_attr(&v))
            .or_else(|| capture_number(&STYLE_WIDTH, style));
        let height = element
            .get_attribute("height")
            .and_then(|v| parse_dimension_attr(&v))
            .or_else(|| capture_number(&STYLE_HEIGHT, style));

        let max = f64::from(self.options.max_pixel_size);
        matches!((width, height), (Some(w), Some(h)) if w <= max && h <= max)
    }
}

fn parse_dimension_attr(value: &str) -> Option<f64> {
    capture_number(&DIMENSION_ATTR, value)
}

fn capture_number(re: &Regex, haystack: &str) -> Option<f64> {
    re.captures(haystack)?.get(1)?.as_str().parse::<f64>().ok()
}

fn is_hidden(style: &str) -> bool {
    if style.trim().is_empty() {
        return false;
    }
    if DISPLAY_NONE.is_match(style) || VISIBILITY_HIDDEN.is_match(style) {
        return true;
    }
    POSITION_ABSOLUTE.is_match(style)
        && OFFSET
            .captures_iter(style)
            .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
            .any(|offset| offset < -OFFSCREEN_OFFSET)
}

fn is_transparent(src: &str, style: &str) -> bool {
    if TRANSPARENT_GIF_DATA_URIS.contains(&src) {
        return true;
    }
    let lowered = src.to_ascii_lowercase();
    if lowered.starts_with("data:") && lowered.contains("transparent") {
        return true;
    }
    capture_number(&OPACITY, style).map_or(false, |opacity| opacity == 0.0)
}

fn lacks_alt<E: ElementLike + ?Sized>(element: &E) -> bool {
    element.get_attribute("alt").map_or(true, |alt| alt.trim().is_empty())
}
