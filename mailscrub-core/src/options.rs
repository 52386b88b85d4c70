//! options.rs - Sanitizer configuration.
//!
//! `SanitizerOptions` is the configuration surface accepted at the boundary:
//! which passes run, how output is shaped, and the tracking-pixel tuning. It
//! can be built in code or loaded from a YAML file in which every field is
//! optional.
//!
//! License: MIT OR APACHE 2.0

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::link_cleaner::ExceptionPolicy;
use crate::pixel::{TrackingPixelOptions, TrackingPixelOverrides};

/// Top-level options for a sanitization engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SanitizerOptions {
    /// Rewrite `href` attributes through the link cleaner.
    pub clean_urls: bool,
    /// Remove images classified as tracking pixels.
    pub remove_tracking_pixels: bool,
    /// Keep `<html>`/`<head>` wrappers of a full document. When false only the
    /// body content is emitted.
    pub preserve_document_structure: bool,
    pub exception_policy: ExceptionPolicy,
    pub tracking_pixels: TrackingPixelOptions,
}

impl Default for SanitizerOptions {
    fn default() -> Self {
        Self {
            clean_urls: true,
            remove_tracking_pixels: true,
            preserve_document_structure: true,
            exception_policy: ExceptionPolicy::default(),
            tracking_pixels: TrackingPixelOptions::default(),
        }
    }
}

impl SanitizerOptions {
    /// Parses options from YAML. Omitted fields keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let options: SanitizerOptions = serde_yml::from_str(yaml).context("Failed to parse sanitizer options")?;
        debug!("Parsed sanitizer options: {:?}", options);
        Ok(options)
    }

    /// Loads options from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading sanitizer options from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("Failed to parse options file {}", path.display()))
    }

    /// Applies per-field tracking-pixel overrides on top of the current options.
    pub fn with_pixel_overrides(mut self, overrides: TrackingPixelOverrides) -> Self {
        self.tracking_pixels = self.tracking_pixels.merged(overrides);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fields_override_defaults_individually() {
        let options = SanitizerOptions::from_yaml_str(
            r#"
clean_urls: false
exception_policy: whole_url
tracking_pixels:
  max_pixel_size: 4
  tracking_domains: ["beacon.test"]
"#,
        )
        .unwrap();

        assert!(!options.clean_urls);
        assert!(options.remove_tracking_pixels);
        assert!(options.preserve_document_structure);
        assert_eq!(options.exception_policy, ExceptionPolicy::WholeUrl);
        assert_eq!(options.tracking_pixels.max_pixel_size, 4);
        assert_eq!(options.tracking_pixels.tracking_domains, vec!["beacon.test".to_string()]);
        assert!(options.tracking_pixels.remove_no_alt_images);
    }

    #[test]
    fn empty_yaml_document_is_all_defaults() {
        let options = SanitizerOptions::from_yaml_str("{}").unwrap();
        assert_eq!(options, SanitizerOptions::default());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(SanitizerOptions::from_yaml_str("exception_policy: sometimes").is_err());
    }
}
