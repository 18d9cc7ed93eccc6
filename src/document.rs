//! Page geometry of the PDF the user is about to sign.

use crate::geometry::Rectangle;
use crate::lopdf_utils::as_rectangle;
use crate::pdf_object::get_inherited;
use crate::Error;
use lopdf::Document;

/// US Letter, used when no page in the tree declares a `MediaBox`.
const FALLBACK_MEDIA_BOX: Rectangle = Rectangle {
    x1: 0.0,
    y1: 0.0,
    x2: 612.0,
    y2: 792.0,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// 1-indexed.
    pub page: u32,
    pub media_box: Rectangle,
}

impl PageSize {
    pub fn width(&self) -> f64 {
        self.media_box.width()
    }

    pub fn height(&self) -> f64 {
        self.media_box.height()
    }

    /// Height over width, used to lay the page out at a given pixel width.
    pub fn aspect_ratio(&self) -> f64 {
        if self.width() > 0.0 {
            self.height() / self.width()
        } else {
            FALLBACK_MEDIA_BOX.height() / FALLBACK_MEDIA_BOX.width()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceDocument {
    pages: Vec<PageSize>,
}

impl SourceDocument {
    pub fn from_bytes(pdf_data: &[u8]) -> Result<Self, Error> {
        let raw_document = Document::load_mem(pdf_data)?;
        Self::from_document(&raw_document)
    }

    fn from_document(raw_document: &Document) -> Result<Self, Error> {
        let mut pages = Vec::new();
        for (page, page_id) in raw_document.get_pages() {
            pages.push(PageSize {
                page,
                media_box: media_box(raw_document, page_id)?,
            });
        }
        if pages.is_empty() {
            return Err(Error::from("The PDF document does not contain any pages."));
        }
        log::debug!("Loaded document with {} page(s).", pages.len());
        Ok(SourceDocument { pages })
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn page(&self, page: u32) -> Option<&PageSize> {
        self.pages.iter().find(|size| size.page == page)
    }

    pub fn pages(&self) -> &[PageSize] {
        &self.pages
    }
}

pub(crate) fn media_box(raw_document: &Document, page_id: lopdf::ObjectId) -> Result<Rectangle, Error> {
    let page_dict = raw_document.get_object(page_id)?.as_dict()?;
    match get_inherited(raw_document, page_dict, b"MediaBox")? {
        Some(obj) => as_rectangle(obj, raw_document),
        None => {
            log::warn!(
                "Page ({},{}) has no `MediaBox`, assuming US Letter.",
                page_id.0,
                page_id.1
            );
            Ok(FALLBACK_MEDIA_BOX)
        }
    }
}
