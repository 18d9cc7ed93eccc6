//! Burning visual stamps into a document, the way the signing service does
//! before it signs the bytes.

use crate::document::media_box;
use crate::geometry::Rectangle;
use crate::image_insert_to_page::{fit_image, image_operations, InsertImageToPage};
use crate::image_xobject::ImageXObject;
use crate::wire::PageBox;
use crate::Error;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use lopdf::{content::Operation, dictionary, Document, Object, ObjectId, StringFormat};
use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};

const PRODUCER: &str = concat!("pdf_stamp_signing ", env!("CARGO_PKG_VERSION"));
const TITLE: &str = "Digitally signed document";
const FONT_NAME: &str = "FStamp";
const CAPTION_FONT_SIZE: f64 = 5.0;
/// Distance between the bottom of the stamp box and the caption baseline.
const CAPTION_OFFSET: f64 = 6.0;

/// What a stamp looks like: the signer's PNG image when there is one,
/// otherwise a framed line of text naming the signer.
#[derive(Debug, Clone)]
pub struct StampAppearance {
    signer_id: String,
    image: Option<Bytes>,
}

impl StampAppearance {
    pub fn text(signer_id: impl Into<String>) -> Self {
        StampAppearance {
            signer_id: signer_id.into(),
            image: None,
        }
    }

    pub fn with_image(signer_id: impl Into<String>, png: impl Into<Bytes>) -> Self {
        StampAppearance {
            signer_id: signer_id.into(),
            image: Some(png.into()),
        }
    }

    pub fn signer_id(&self) -> &str {
        &self.signer_id
    }
}

/// Keep only `[A-Za-z0-9_-]` so the id can be part of a PDF name.
pub fn sanitize_signer_id(signer_id: &str) -> String {
    let sanitized: String = signer_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if sanitized.is_empty() {
        "unknown".to_owned()
    } else {
        sanitized
    }
}

/// A document being stamped. Only the pages that receive a stamp are changed.
#[derive(Debug, Clone)]
pub struct StampedDocument {
    raw_document: Document,
    /// Link between the image name saved and the objectId of the image.
    /// Every stamp of the same signer points at one image object.
    image_object_ids: HashMap<String, ObjectId>,
    font_id: Option<ObjectId>,
}

impl StampedDocument {
    pub fn new(raw_document: Document) -> Self {
        StampedDocument {
            raw_document,
            image_object_ids: HashMap::new(),
            font_id: None,
        }
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self, Error> {
        Ok(Self::new(Document::load_from(reader)?))
    }

    pub fn from_bytes(pdf_data: &[u8]) -> Result<Self, Error> {
        Ok(Self::new(Document::load_mem(pdf_data)?))
    }

    pub fn get_document_ref(&self) -> &Document {
        &self.raw_document
    }

    pub fn finished(self) -> Document {
        self.raw_document
    }

    /// Draw one stamp per placement and return how many were drawn.
    /// Placements on pages the document does not have are skipped.
    pub fn apply_placements(
        &mut self,
        placements: &[PageBox],
        appearance: &StampAppearance,
        signed_at: DateTime<Utc>,
    ) -> Result<usize, Error> {
        let pages = self.raw_document.get_pages();
        let signer_name = sanitize_signer_id(appearance.signer_id());
        let caption = format!(
            "Digitally signed: {}",
            signed_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        let mut operations_per_page: BTreeMap<u32, Vec<Operation>> = BTreeMap::new();
        let mut stamped = 0;
        let mut image = None;
        let mut image_loaded = false;
        for placement in placements {
            let page_id = match pages.get(&placement.page) {
                Some(page_id) => *page_id,
                None => {
                    log::warn!(
                        "Skipping stamp for page {}, the document has {} page(s).",
                        placement.page,
                        pages.len()
                    );
                    continue;
                }
            };
            if !image_loaded {
                image = self.load_image(&signer_name, appearance);
                image_loaded = true;
            }
            let rect = placement.to_rectangle(&media_box(&self.raw_document, page_id)?);
            let operations = operations_per_page.entry(placement.page).or_default();
            match &image {
                Some((image_name, width, height)) => {
                    operations.extend(image_operations(image_name, &fit_image(*width, *height, &rect)));
                }
                None => operations.extend(text_stamp_operations(appearance.signer_id(), &rect)),
            }
            operations.extend(caption_operations(&caption, &rect));
            stamped += 1;
        }

        for (page, operations) in operations_per_page {
            let page_id = pages[&page];
            let font_id = self.font_id();
            self.raw_document
                .add_page_resource(page_id, "Font", FONT_NAME, font_id)?;
            if let Some((image_name, _, _)) = &image {
                let image_id = self.image_object_ids[image_name];
                self.raw_document
                    .add_page_resource(page_id, "XObject", image_name, image_id)?;
            }
            self.raw_document.add_to_page_content(page_id, operations)?;
        }
        log::info!(
            "Stamped {} of {} placement(s) for `{}`.",
            stamped,
            placements.len(),
            signer_name
        );
        Ok(stamped)
    }

    /// Record who signed and what produced the file in the document info.
    pub fn set_signer_metadata(&mut self, signer_id: &str) -> Result<(), Error> {
        let existing = self.raw_document.trailer.get(b"Info").ok().cloned();
        let info_id = match existing {
            Some(Object::Reference(info_id)) => info_id,
            Some(Object::Dictionary(info)) => self.raw_document.add_object(info),
            _ => self.raw_document.add_object(lopdf::Dictionary::new()),
        };
        self.raw_document
            .trailer
            .set("Info", Object::Reference(info_id));

        let info = self.raw_document.get_object_mut(info_id)?.as_dict_mut()?;
        info.set("Producer", literal(PRODUCER));
        info.set("Title", literal(TITLE));
        info.set("Signer-Identity", literal(signer_id));
        Ok(())
    }

    pub fn write_document<W: Write>(&mut self, target: &mut W) -> Result<(), Error> {
        self.raw_document.compress();
        self.raw_document.save_to(target)?;
        Ok(())
    }

    /// Decode the signer image once and store it. Returns the resource name
    /// and pixel size, or `None` when the text stamp has to be used.
    fn load_image(
        &mut self,
        signer_name: &str,
        appearance: &StampAppearance,
    ) -> Option<(String, u32, u32)> {
        let png = match &appearance.image {
            Some(png) => png,
            None => return None,
        };
        let (image, mask) = match ImageXObject::try_from_png(png.as_ref()) {
            Ok(decoded) => decoded,
            Err(err) => {
                log::warn!(
                    "Signature image for `{}` could not be read, using a text stamp: {}",
                    signer_name,
                    err
                );
                return None;
            }
        };
        let (width, height) = (image.width, image.height);
        let image_name = format!("Sig_{}", signer_name);
        if !self.image_object_ids.contains_key(&image_name) {
            let image_id = self.raw_document.add_image_object(image, mask);
            self.image_object_ids.insert(image_name.clone(), image_id);
        }
        Some((image_name, width, height))
    }

    fn font_id(&mut self) -> ObjectId {
        match self.font_id {
            Some(font_id) => font_id,
            None => {
                let font_id = self.raw_document.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                    "Encoding" => "WinAnsiEncoding",
                });
                self.font_id = Some(font_id);
                font_id
            }
        }
    }
}

fn literal(text: &str) -> Object {
    Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
}

/// Helvetica glyphs average about half an em.
fn approximate_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * 0.5
}

fn text_operations(text: &str, font_size: f64, x: f64, y: f64) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(FONT_NAME.as_bytes().to_vec()), font_size.into()],
        ),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// A frame around `rect` with the signer named inside.
fn text_stamp_operations(signer_id: &str, rect: &Rectangle) -> Vec<Operation> {
    let text = format!("Digital signature: {}", signer_id);
    let font_size = (rect.height() * 0.4)
        .min(rect.width() * 0.9 / approximate_text_width(&text, 1.0))
        .max(1.0);
    let x = rect.x1 + (rect.width() - approximate_text_width(&text, font_size)).max(0.0) / 2.0;
    let y = rect.y1 + (rect.height() - font_size) / 2.0 + font_size * 0.2;

    let mut operations = vec![
        Operation::new("q", vec![]),
        // Dark blue stroke and fill.
        Operation::new("RG", vec![0.1.into(), 0.2.into(), 0.5.into()]),
        Operation::new("rg", vec![0.1.into(), 0.2.into(), 0.5.into()]),
        Operation::new("w", vec![1.into()]),
        Operation::new(
            "re",
            vec![
                rect.x1.into(),
                rect.y1.into(),
                rect.width().into(),
                rect.height().into(),
            ],
        ),
        Operation::new("S", vec![]),
    ];
    operations.extend(text_operations(&text, font_size, x, y));
    operations.push(Operation::new("Q", vec![]));
    operations
}

/// Small grey timestamp line under the stamp.
fn caption_operations(caption: &str, rect: &Rectangle) -> Vec<Operation> {
    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new("g", vec![0.5.into()]),
    ];
    operations.extend(text_operations(
        caption,
        CAPTION_FONT_SIZE,
        rect.x1,
        rect.y1 - CAPTION_OFFSET,
    ));
    operations.push(Operation::new("Q", vec![]));
    operations
}
