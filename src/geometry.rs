//! Conversions between the placement surface and the signing service.
//!
//! The placement surface works in page fractions with the origin in the
//! top-left corner, the way a page is drawn on screen. The signing service
//! works in page fractions with the origin in the bottom-left corner, the way
//! PDF user space is laid out. A box is anchored by its top edge on screen and
//! by its bottom edge on the service side.

use crate::config::StampDimensions;

/// A box on a PDF page in user-space points (origin bottom-left).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rectangle {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rectangle {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// Top-left corner of a placed stamp, as fractions of the page size.
///
/// The only way to build one is by clamping, so `x + w <= 1` and `y + h <= 1`
/// always hold for the stamp it was created with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignatureAnchor {
    page: u32,
    x: f64,
    y: f64,
}

impl SignatureAnchor {
    /// Center the stamp on a pointer position given as page fractions, then
    /// pull it back inside the page.
    pub fn centered_on(page: u32, raw_x: f64, raw_y: f64, stamp: StampDimensions) -> Self {
        let centered_x = finite_or_zero(raw_x) - stamp.width_fraction() / 2.0;
        let centered_y = finite_or_zero(raw_y) - stamp.height_fraction() / 2.0;
        Self::clamped(page, centered_x, centered_y, stamp)
    }

    /// Use `(x, y)` as the top-left corner, pulled back inside the page.
    pub fn clamped(page: u32, x: f64, y: f64, stamp: StampDimensions) -> Self {
        let max_x = 1.0 - stamp.width_fraction();
        let max_y = 1.0 - stamp.height_fraction();
        let anchor = SignatureAnchor {
            page,
            x: finite_or_zero(x).clamp(0.0, max_x),
            y: finite_or_zero(y).clamp(0.0, max_y),
        };
        debug_assert!(
            anchor.fits(stamp),
            "clamped anchor {:?} exceeds the page for {:?}",
            anchor,
            stamp
        );
        anchor
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// `true` when a stamp of this size placed here stays on the page.
    pub fn fits(&self, stamp: StampDimensions) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x <= 1.0 - stamp.width_fraction()
            && self.y <= 1.0 - stamp.height_fraction()
    }
}

/// Lower-left corner of a stamp in the signing service's convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServicePoint {
    pub page: u32,
    pub x: f64,
    pub y: f64,
}

pub fn to_signing_service_coordinates(
    anchor: &SignatureAnchor,
    stamp: StampDimensions,
) -> ServicePoint {
    ServicePoint {
        page: anchor.page,
        x: anchor.x,
        y: 1.0 - anchor.y - stamp.height_fraction(),
    }
}

/// Inverse of [`to_signing_service_coordinates`]; returns the top-left `(x, y)`.
pub fn from_signing_service_coordinates(point: &ServicePoint, stamp: StampDimensions) -> (f64, f64) {
    (point.x, 1.0 - point.y - stamp.height_fraction())
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
