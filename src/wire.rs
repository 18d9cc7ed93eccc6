//! The `signatures` field of a signing request.
//!
//! Two element shapes exist. [`SignaturePlacement`] is the canonical one: the
//! box's lower-left corner with the origin at the bottom-left of the page.
//! [`PercentPlacement`] is sent by the marker editor: the box's top-left
//! corner with the origin at the top-left, and the service flips it. A request
//! carries exactly one of the two shapes.

use crate::config::StampDimensions;
use crate::error::{Error, ValidationError};
use crate::geometry::{to_signing_service_coordinates, Rectangle, SignatureAnchor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignaturePlacement {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl SignaturePlacement {
    pub fn from_anchor(anchor: &SignatureAnchor, stamp: StampDimensions) -> Self {
        let point = to_signing_service_coordinates(anchor, stamp);
        SignaturePlacement {
            page: point.page,
            x: point.x,
            y: point.y,
            w: stamp.width_fraction(),
            h: stamp.height_fraction(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentPlacement {
    pub page: u32,
    pub x_percent: f64,
    pub y_percent: f64,
    pub width_percent: f64,
    pub height_percent: f64,
}

impl PercentPlacement {
    pub fn from_anchor(anchor: &SignatureAnchor, stamp: StampDimensions) -> Self {
        PercentPlacement {
            page: anchor.page(),
            x_percent: anchor.x(),
            y_percent: anchor.y(),
            width_percent: stamp.width_fraction(),
            height_percent: stamp.height_fraction(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placements {
    BottomLeft(Vec<SignaturePlacement>),
    Percent(Vec<PercentPlacement>),
}

impl Placements {
    pub fn len(&self) -> usize {
        match self {
            Placements::BottomLeft(list) => list.len(),
            Placements::Percent(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Page number of each placement, in order.
    pub fn pages(&self) -> Vec<u32> {
        match self {
            Placements::BottomLeft(list) => list.iter().map(|placement| placement.page).collect(),
            Placements::Percent(list) => list.iter().map(|placement| placement.page).collect(),
        }
    }

    /// JSON array in the order the placements were made.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(match self {
            Placements::BottomLeft(list) => serde_json::to_string(list)?,
            Placements::Percent(list) => serde_json::to_string(list)?,
        })
    }
}

/// A stamp box on one page in page fractions, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    /// Map the box onto a page's `MediaBox` in points.
    pub fn to_rectangle(&self, media_box: &Rectangle) -> Rectangle {
        let x1 = media_box.x1 + self.x * media_box.width();
        let y1 = media_box.y1 + self.y * media_box.height();
        Rectangle {
            x1,
            y1,
            x2: x1 + self.width * media_box.width(),
            y2: y1 + self.height * media_box.height(),
        }
    }
}

fn first_page() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IncomingPlacement {
    BottomLeft {
        #[serde(default = "first_page")]
        page: u32,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    },
    Percent {
        #[serde(default = "first_page")]
        page: u32,
        x_percent: f64,
        y_percent: f64,
        width_percent: f64,
        height_percent: f64,
    },
}

impl IncomingPlacement {
    fn into_page_box(self) -> PageBox {
        match self {
            IncomingPlacement::BottomLeft { page, x, y, w, h } => PageBox {
                page,
                x,
                y,
                width: w,
                height: h,
            },
            IncomingPlacement::Percent {
                page,
                x_percent,
                y_percent,
                width_percent,
                height_percent,
            } => PageBox {
                page,
                x: x_percent,
                y: 1.0 - y_percent - height_percent,
                width: width_percent,
                height: height_percent,
            },
        }
    }
}

/// Decode a `signatures` field as the signing service receives it. Either
/// element shape is accepted and normalized to a bottom-left [`PageBox`].
pub fn parse_placements(json: &str) -> Result<Vec<PageBox>, Error> {
    let incoming: Vec<IncomingPlacement> = serde_json::from_str(json)?;
    let mut boxes = Vec::with_capacity(incoming.len());
    for (index, placement) in incoming.into_iter().enumerate() {
        let mut page_box = placement.into_page_box();
        validate_box(index, &page_box)?;
        // Flipping can leave rounding noise just outside the page.
        page_box.x = page_box.x.clamp(0.0, 1.0);
        page_box.y = page_box.y.clamp(0.0, 1.0);
        boxes.push(page_box);
    }
    Ok(boxes)
}

const ROUNDING_TOLERANCE: f64 = 1e-9;

fn validate_box(index: usize, page_box: &PageBox) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidPlacement { index, reason };
    if page_box.page == 0 {
        return Err(invalid("pages are numbered from 1".to_owned()));
    }
    let in_unit = |v: f64| {
        v.is_finite() && (-ROUNDING_TOLERANCE..=1.0 + ROUNDING_TOLERANCE).contains(&v)
    };
    if !in_unit(page_box.x) || !in_unit(page_box.y) {
        return Err(invalid(format!(
            "position ({}, {}) is outside the page",
            page_box.x, page_box.y
        )));
    }
    if !(in_unit(page_box.width) && page_box.width > 0.0)
        || !(in_unit(page_box.height) && page_box.height > 0.0)
    {
        return Err(invalid(format!(
            "size {}x{} must be within (0, 1]",
            page_box.width, page_box.height
        )));
    }
    if page_box.x + page_box.width > 1.0 + ROUNDING_TOLERANCE
        || page_box.y + page_box.height > 1.0 + ROUNDING_TOLERANCE
    {
        return Err(invalid(format!(
            "box at ({}, {}) of size {}x{} runs off the page",
            page_box.x, page_box.y, page_box.width, page_box.height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn canonical_shape_serializes_short_field_names() {
        let stamp = StampDimensions::DEFAULT;
        let anchor = SignatureAnchor::clamped(2, 0.10, 0.20, stamp);
        let placements = Placements::BottomLeft(vec![SignaturePlacement::from_anchor(&anchor, stamp)]);
        let value: serde_json::Value = serde_json::from_str(&placements.to_json().unwrap()).unwrap();
        let element = &value[0];
        assert_eq!(element["page"], 2);
        assert_eq!(element["x"], 0.10);
        assert!((element["y"].as_f64().unwrap() - 0.72).abs() < EPSILON);
        assert_eq!(element["w"], 0.25);
        assert_eq!(element["h"], 0.08);
    }

    #[test]
    fn percent_shape_keeps_top_left_values() {
        let stamp = StampDimensions::DEFAULT;
        let anchor = SignatureAnchor::clamped(1, 0.3, 0.6, stamp);
        let json = Placements::Percent(vec![PercentPlacement::from_anchor(&anchor, stamp)])
            .to_json()
            .unwrap();
        assert!(json.contains("\"x_percent\":0.3"));
        assert!(json.contains("\"y_percent\":0.6"));
        assert!(!json.contains("\"w\""));
    }

    #[test]
    fn both_shapes_parse_to_the_same_box() {
        let boxes = parse_placements(
            r#"[
                {"page": 1, "x": 0.375, "y": 0.46, "w": 0.25, "h": 0.08},
                {"page": 1, "x_percent": 0.375, "y_percent": 0.46, "width_percent": 0.25, "height_percent": 0.08}
            ]"#,
        )
        .unwrap();
        assert_eq!(boxes.len(), 2);
        assert!((boxes[0].y - boxes[1].y).abs() < EPSILON);
        assert_eq!(boxes[0].x, boxes[1].x);
    }

    #[test]
    fn missing_page_defaults_to_first() {
        let boxes =
            parse_placements(r#"[{"x_percent": 0.1, "y_percent": 0.1, "width_percent": 0.2, "height_percent": 0.1}]"#)
                .unwrap();
        assert_eq!(boxes[0].page, 1);
        assert!((boxes[0].y - 0.8).abs() < EPSILON);
    }

    #[test]
    fn flipped_box_at_bottom_edge_stays_on_page() {
        let boxes = parse_placements(
            r#"[{"page": 1, "x_percent": 0.75, "y_percent": 0.92, "width_percent": 0.25, "height_percent": 0.08}]"#,
        )
        .unwrap();
        assert!(boxes[0].y >= 0.0);
        assert!(boxes[0].y < EPSILON);
    }

    #[test]
    fn rejects_out_of_range_boxes() {
        let err = parse_placements(r#"[{"page": 0, "x": 0.1, "y": 0.1, "w": 0.2, "h": 0.1}]"#).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidPlacement { index: 0, .. })
        ));
        assert!(parse_placements(r#"[{"page": 1, "x": 1.4, "y": 0.1, "w": 0.2, "h": 0.1}]"#).is_err());
        assert!(parse_placements(r#"[{"page": 1, "x": 0.1, "y": 0.1, "w": 0.0, "h": 0.1}]"#).is_err());
        assert!(parse_placements(r#"[{"page": 1}]"#).is_err());
        let err = parse_placements(r#"[{"page": 1, "x": 0.95, "y": 0.99, "w": 0.25, "h": 0.08}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("runs off the page"));
        assert!(parse_placements(r#"[{"page": 1, "x": 0.5, "y": 0.95, "w": 0.25, "h": 0.08}]"#).is_err());
        assert!(parse_placements(
            r#"[{"page": 1, "x_percent": 0.8, "y_percent": 0.1, "width_percent": 0.25, "height_percent": 0.08}]"#
        )
        .is_err());
        // Touching the top-right corner is still on the page.
        assert!(parse_placements(r#"[{"page": 1, "x": 0.75, "y": 0.92, "w": 0.25, "h": 0.08}]"#).is_ok());
        assert!(parse_placements("not json").is_err());
    }

    #[test]
    fn box_maps_onto_media_box() {
        let media_box = Rectangle {
            x1: 0.0,
            y1: 0.0,
            x2: 600.0,
            y2: 800.0,
        };
        let rect = PageBox {
            page: 1,
            x: 0.375,
            y: 0.46,
            width: 0.25,
            height: 0.08,
        }
        .to_rectangle(&media_box);
        assert!((rect.x1 - 225.0).abs() < EPSILON);
        assert!((rect.y1 - 368.0).abs() < EPSILON);
        assert!((rect.width() - 150.0).abs() < EPSILON);
        assert!((rect.height() - 64.0).abs() < EPSILON);
    }
}
