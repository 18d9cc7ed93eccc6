//! Settings shared by the placement side and the signing side.
//!
//! The stamp size lives here and nowhere else. The placement surface, the
//! marker board, the request assembler and the stamper all take it from the
//! same [`StampDimensions`] value, so the box the user sees is the box that
//! ends up on the page.

use crate::error::{Error, ValidationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000/secure-sign-pdf";

/// Size of the signature box as fractions of the page width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedStampDimensions")]
pub struct StampDimensions {
    width_fraction: f64,
    height_fraction: f64,
}

impl StampDimensions {
    /// 25% of the page width by 8% of the page height.
    pub const DEFAULT: StampDimensions = StampDimensions {
        width_fraction: 0.25,
        height_fraction: 0.08,
    };

    pub fn new(width_fraction: f64, height_fraction: f64) -> Result<Self, Error> {
        let valid = |v: f64| v.is_finite() && v > 0.0 && v <= 1.0;
        if !valid(width_fraction) || !valid(height_fraction) {
            return Err(ValidationError::InvalidStampDimensions {
                width: width_fraction,
                height: height_fraction,
            }
            .into());
        }
        Ok(StampDimensions {
            width_fraction,
            height_fraction,
        })
    }

    pub fn width_fraction(&self) -> f64 {
        self.width_fraction
    }

    pub fn height_fraction(&self) -> f64 {
        self.height_fraction
    }
}

#[derive(Deserialize)]
struct UncheckedStampDimensions {
    width_fraction: f64,
    height_fraction: f64,
}

impl TryFrom<UncheckedStampDimensions> for StampDimensions {
    type Error = Error;

    fn try_from(raw: UncheckedStampDimensions) -> Result<Self, Self::Error> {
        StampDimensions::new(raw.width_fraction, raw.height_fraction)
    }
}

impl Default for StampDimensions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Endpoint of the signing service (`POST`, multipart).
    pub service_url: String,
    pub stamp: StampDimensions,
    /// Rendered page width in pixels at zoom 1.0.
    pub base_page_width: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub scale_step: f64,
    pub connect_timeout: Option<Duration>,
    /// `None` waits for the signing service indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_owned(),
            stamp: StampDimensions::DEFAULT,
            base_page_width: 600.0,
            min_scale: 0.5,
            max_scale: 2.0,
            scale_step: 0.1,
            connect_timeout: None,
            request_timeout: None,
        }
    }
}

impl SignerConfig {
    /// Build the configuration from `PDF_SIGNER_*` environment variables.
    /// Variables that are not set keep their default value.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SignerConfig::default();

        if let Some(url) = lookup("PDF_SIGNER_SERVICE_URL") {
            if url.trim().is_empty() {
                return Err(Error::Config {
                    key: "PDF_SIGNER_SERVICE_URL".to_owned(),
                    reason: "must not be empty".to_owned(),
                });
            }
            config.service_url = url;
        }

        let width = parse_var(&lookup, "PDF_SIGNER_STAMP_WIDTH")?;
        let height = parse_var(&lookup, "PDF_SIGNER_STAMP_HEIGHT")?;
        if width.is_some() || height.is_some() {
            config.stamp = StampDimensions::new(
                width.unwrap_or(config.stamp.width_fraction),
                height.unwrap_or(config.stamp.height_fraction),
            )?;
        }

        if let Some(base_width) = parse_var::<f64, _>(&lookup, "PDF_SIGNER_BASE_PAGE_WIDTH")? {
            if !(base_width.is_finite() && base_width > 0.0) {
                return Err(Error::Config {
                    key: "PDF_SIGNER_BASE_PAGE_WIDTH".to_owned(),
                    reason: "must be a positive number".to_owned(),
                });
            }
            config.base_page_width = base_width;
        }

        config.connect_timeout =
            parse_var::<u64, _>(&lookup, "PDF_SIGNER_CONNECT_TIMEOUT_SECS")?.map(Duration::from_secs);
        config.request_timeout =
            parse_var::<u64, _>(&lookup, "PDF_SIGNER_REQUEST_TIMEOUT_SECS")?.map(Duration::from_secs);

        log::debug!(
            "Signer configured for `{}` with stamp {}x{}.",
            config.service_url,
            config.stamp.width_fraction,
            config.stamp.height_fraction
        );
        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|err| Error::Config {
                key: key.to_owned(),
                reason: err.to_string(),
            })
        })
        .transpose()
}
