//! Where on which page the user wants the stamp.
//!
//! [`PlacementSurface`] is the single-anchor flow: the user clicks on a page
//! and the stamp is centered on the click. [`MarkerBoard`] is the older editor
//! where several markers are added and dragged around a container.

use crate::config::{SignerConfig, StampDimensions};
use crate::document::{PageSize, SourceDocument};
use crate::error::{Error, ValidationError};
use crate::geometry::SignatureAnchor;
use crate::wire::{PercentPlacement, Placements};
use std::collections::BTreeMap;

/// A box in rendered pixels, relative to the top-left of the page element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Layout of one page at one zoom level.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub page: u32,
    pub scale: f64,
    pub width: f64,
    pub height: f64,
    /// Present when the current anchor is on this page.
    pub stamp: Option<PixelRect>,
}

#[derive(Debug, Clone)]
pub struct PlacementSurface {
    pages: Vec<PageSize>,
    stamp: StampDimensions,
    base_page_width: f64,
    scale: f64,
    min_scale: f64,
    max_scale: f64,
    scale_step: f64,
    anchor: Option<SignatureAnchor>,
}

impl PlacementSurface {
    pub fn new(document: &SourceDocument, config: &SignerConfig) -> Self {
        PlacementSurface {
            pages: document.pages().to_vec(),
            stamp: config.stamp,
            base_page_width: config.base_page_width,
            scale: 1.0_f64.max(config.min_scale).min(config.max_scale),
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            scale_step: config.scale_step,
            anchor: None,
        }
    }

    pub fn stamp(&self) -> StampDimensions {
        self.stamp
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the scale actually applied after clamping.
    pub fn set_scale(&mut self, scale: f64) -> f64 {
        self.scale = self.bounded_scale(scale);
        self.scale
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_scale(self.scale + self.scale_step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_scale(self.scale - self.scale_step)
    }

    /// Lay out one page. The stamp overlay is derived from the anchor's
    /// fractions every time, so it follows the page through zoom changes.
    /// `scale` is held to the zoom bounds like [`Self::set_scale`].
    pub fn render_page(&self, page: u32, scale: f64) -> Result<PageView, Error> {
        let size = self.page_size(page)?;
        let scale = self.bounded_scale(scale);
        let width = self.base_page_width * scale;
        let height = width * size.aspect_ratio();
        let stamp = self
            .anchor
            .filter(|anchor| anchor.page() == page)
            .map(|anchor| PixelRect {
                left: anchor.x() * width,
                top: anchor.y() * height,
                width: self.stamp.width_fraction() * width,
                height: self.stamp.height_fraction() * height,
            });
        Ok(PageView {
            page,
            scale,
            width,
            height,
            stamp,
        })
    }

    /// Every page at the current scale, laid out one at a time as the
    /// iterator is advanced.
    pub fn pages(&self) -> impl Iterator<Item = PageView> + '_ {
        let scale = self.scale;
        self.pages
            .iter()
            .filter_map(move |size| self.render_page(size.page, scale).ok())
    }

    /// Place the stamp centered on a pointer event. `pointer_x`/`pointer_y`
    /// are relative to the top-left of the rendered page element.
    pub fn on_pointer_select(
        &mut self,
        page: u32,
        pointer_x: f64,
        pointer_y: f64,
        rendered_width: f64,
        rendered_height: f64,
    ) -> Result<&SignatureAnchor, Error> {
        self.page_size(page)?;
        if !(rendered_width.is_finite() && rendered_width > 0.0)
            || !(rendered_height.is_finite() && rendered_height > 0.0)
        {
            return Err(ValidationError::InvalidRenderedSize {
                width: rendered_width,
                height: rendered_height,
            }
            .into());
        }
        let raw_x = pointer_x / rendered_width;
        let raw_y = pointer_y / rendered_height;
        let anchor = SignatureAnchor::centered_on(page, raw_x, raw_y, self.stamp);
        log::trace!(
            "Stamp placed on page {} at ({:.4}, {:.4}).",
            page,
            anchor.x(),
            anchor.y()
        );
        Ok(self.anchor.insert(anchor))
    }

    pub fn anchor(&self) -> Option<&SignatureAnchor> {
        self.anchor.as_ref()
    }

    pub fn clear_anchor(&mut self) -> Option<SignatureAnchor> {
        self.anchor.take()
    }

    /// Non-finite values keep the current scale.
    fn bounded_scale(&self, scale: f64) -> f64 {
        if scale.is_finite() {
            scale.max(self.min_scale).min(self.max_scale)
        } else {
            self.scale
        }
    }

    fn page_size(&self, page: u32) -> Result<&PageSize, Error> {
        self.pages
            .iter()
            .find(|size| size.page == page)
            .ok_or_else(|| {
                ValidationError::PageOutOfRange {
                    page,
                    page_count: self.page_count(),
                }
                .into()
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(u64);

impl MarkerId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub anchor: SignatureAnchor,
}

/// Several draggable stamps inside one rendered container.
#[derive(Debug, Clone)]
pub struct MarkerBoard {
    stamp: StampDimensions,
    page_count: u32,
    markers: BTreeMap<MarkerId, SignatureAnchor>,
    next_id: u64,
    selected: Option<MarkerId>,
}

impl MarkerBoard {
    const DEFAULT_OFFSET: f64 = 0.1;

    pub fn new(stamp: StampDimensions, page_count: u32) -> Self {
        MarkerBoard {
            stamp,
            page_count,
            markers: BTreeMap::new(),
            next_id: 1,
            selected: None,
        }
    }

    /// Add a marker near the top-left of `page` and select it.
    pub fn add_marker(&mut self, page: u32) -> Result<MarkerId, Error> {
        if page == 0 || page > self.page_count {
            return Err(ValidationError::PageOutOfRange {
                page,
                page_count: self.page_count,
            }
            .into());
        }
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        let anchor = SignatureAnchor::clamped(
            page,
            Self::DEFAULT_OFFSET,
            Self::DEFAULT_OFFSET,
            self.stamp,
        );
        self.markers.insert(id, anchor);
        self.selected = Some(id);
        Ok(id)
    }

    /// Move a marker so its top-left corner is at `(left, top)` pixels in a
    /// container of the given size. The marker never leaves the container.
    pub fn drag_to(
        &mut self,
        id: MarkerId,
        left: f64,
        top: f64,
        container_width: f64,
        container_height: f64,
    ) -> Result<&SignatureAnchor, Error> {
        if !(container_width.is_finite() && container_width > 0.0)
            || !(container_height.is_finite() && container_height > 0.0)
        {
            return Err(ValidationError::InvalidRenderedSize {
                width: container_width,
                height: container_height,
            }
            .into());
        }
        let stamp = self.stamp;
        let anchor = self
            .markers
            .get_mut(&id)
            .ok_or(ValidationError::UnknownMarker(id.0))?;
        *anchor = SignatureAnchor::clamped(
            anchor.page(),
            left / container_width,
            top / container_height,
            stamp,
        );
        self.selected = Some(id);
        Ok(anchor)
    }

    pub fn remove(&mut self, id: MarkerId) -> Option<Marker> {
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.markers
            .remove(&id)
            .map(|anchor| Marker { id, anchor })
    }

    pub fn select(&mut self, id: Option<MarkerId>) {
        self.selected = id.filter(|id| self.markers.contains_key(id));
    }

    pub fn selected(&self) -> Option<MarkerId> {
        self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Markers in the order they were created.
    pub fn markers(&self) -> impl Iterator<Item = Marker> + '_ {
        self.markers
            .iter()
            .map(|(id, anchor)| Marker { id: *id, anchor: *anchor })
    }

    /// Container-relative percentages, top-left origin, in creation order.
    pub fn to_placements(&self) -> Placements {
        Placements::Percent(
            self.markers()
                .map(|marker| PercentPlacement::from_anchor(&marker.anchor, self.stamp))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::sample_pdf;

    const EPSILON: f64 = 1e-9;

    fn surface(sizes: &[(f64, f64)]) -> PlacementSurface {
        let document = SourceDocument::from_bytes(&sample_pdf(sizes)).unwrap();
        PlacementSurface::new(&document, &SignerConfig::default())
    }

    #[test]
    fn renders_pages_at_base_width() {
        let surface = surface(&[(600.0, 800.0), (800.0, 600.0)]);
        let views: Vec<PageView> = surface.pages().collect();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].width, 600.0);
        assert!((views[0].height - 800.0).abs() < EPSILON);
        assert!((views[1].height - 450.0).abs() < EPSILON);
        assert!(views.iter().all(|view| view.stamp.is_none()));
    }

    #[test]
    fn click_centers_and_replaces_anchor() {
        let mut surface = surface(&[(600.0, 800.0), (600.0, 800.0)]);
        surface.on_pointer_select(1, 300.0, 400.0, 600.0, 800.0).unwrap();
        let anchor = *surface.on_pointer_select(2, 0.0, 0.0, 600.0, 800.0).unwrap();
        assert_eq!(anchor.page(), 2);
        assert_eq!((anchor.x(), anchor.y()), (0.0, 0.0));
        assert_eq!(surface.anchor(), Some(&anchor));
        assert!(surface.render_page(1, 1.0).unwrap().stamp.is_none());
        assert!(surface.render_page(2, 1.0).unwrap().stamp.is_some());
    }

    #[test]
    fn overlay_follows_zoom() {
        let mut surface = surface(&[(600.0, 800.0)]);
        surface.on_pointer_select(1, 300.0, 400.0, 600.0, 800.0).unwrap();
        let before = *surface.anchor().unwrap();

        let small = surface.render_page(1, 0.5).unwrap();
        let large = surface.render_page(1, 2.0).unwrap();
        let small_stamp = small.stamp.unwrap();
        let large_stamp = large.stamp.unwrap();
        assert!((small_stamp.left / small.width - large_stamp.left / large.width).abs() < EPSILON);
        assert!((small_stamp.top / small.height - large_stamp.top / large.height).abs() < EPSILON);
        assert!((large_stamp.width - 0.25 * large.width).abs() < EPSILON);
        assert_eq!(surface.anchor(), Some(&before));
    }

    #[test]
    fn zoom_is_bounded() {
        let mut surface = surface(&[(600.0, 800.0)]);
        for _ in 0..30 {
            surface.zoom_in();
        }
        assert_eq!(surface.scale(), 2.0);
        for _ in 0..30 {
            surface.zoom_out();
        }
        assert_eq!(surface.scale(), 0.5);
        assert_eq!(surface.set_scale(f64::NAN), 0.5);
    }

    #[test]
    fn render_scale_is_held_to_zoom_bounds() {
        let surface = surface(&[(600.0, 800.0)]);
        let view = surface.render_page(1, 0.0).unwrap();
        assert_eq!(view.scale, 0.5);
        assert_eq!(view.width, 300.0);
        assert_eq!(surface.render_page(1, -3.0).unwrap().scale, 0.5);
        assert_eq!(surface.render_page(1, 10.0).unwrap().scale, 2.0);

        let view = surface.render_page(1, f64::NAN).unwrap();
        assert_eq!(view.scale, surface.scale());
        assert!(view.width > 0.0 && view.height > 0.0);
    }

    #[test]
    fn rejects_unknown_page_and_empty_render() {
        let mut surface = surface(&[(600.0, 800.0)]);
        let err = surface.on_pointer_select(2, 1.0, 1.0, 600.0, 800.0).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::PageOutOfRange { page: 2, page_count: 1 })
        ));
        let err = surface.on_pointer_select(1, 1.0, 1.0, 0.0, 800.0).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidRenderedSize { .. })
        ));
        assert!(surface.anchor().is_none());
    }

    #[test]
    fn markers_stay_inside_container() {
        let mut board = MarkerBoard::new(StampDimensions::DEFAULT, 1);
        let first = board.add_marker(1).unwrap();
        let second = board.add_marker(1).unwrap();
        assert_eq!(board.selected(), Some(second));

        let anchor = *board.drag_to(first, 900.0, -20.0, 850.0, 1100.0).unwrap();
        assert!((anchor.x() - 0.75).abs() < EPSILON);
        assert_eq!(anchor.y(), 0.0);
        assert_eq!(board.selected(), Some(first));

        board.remove(first);
        assert_eq!(board.selected(), None);
        assert!(board.drag_to(first, 0.0, 0.0, 850.0, 1100.0).is_err());

        let ids: Vec<MarkerId> = board.markers().map(|marker| marker.id).collect();
        assert_eq!(ids, vec![second]);
    }

    #[test]
    fn marker_board_emits_percent_placements_in_creation_order() {
        let mut board = MarkerBoard::new(StampDimensions::DEFAULT, 2);
        let first = board.add_marker(2).unwrap();
        let second = board.add_marker(1).unwrap();
        board.drag_to(second, 425.0, 550.0, 850.0, 1100.0).unwrap();
        board.drag_to(first, 85.0, 110.0, 850.0, 1100.0).unwrap();

        match board.to_placements() {
            Placements::Percent(list) => {
                assert_eq!(list.len(), 2);
                assert_eq!(list[0].page, 2);
                assert!((list[0].x_percent - 0.1).abs() < EPSILON);
                assert_eq!(list[1].page, 1);
                assert!((list[1].y_percent - 0.5).abs() < EPSILON);
                assert_eq!(list[1].width_percent, 0.25);
            }
            other => panic!("unexpected encoding {:?}", other),
        }
    }

    #[test]
    fn markers_only_go_on_existing_pages() {
        let mut board = MarkerBoard::new(StampDimensions::DEFAULT, 2);
        let err = board.add_marker(0).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::PageOutOfRange { page: 0, page_count: 2 })
        ));
        assert!(board.add_marker(3).is_err());
        assert!(board.is_empty());
        assert_eq!(board.selected(), None);
        assert!(board.to_placements().is_empty());
    }
}
