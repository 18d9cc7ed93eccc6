use crate::{geometry::Rectangle, image_xobject::ImageXObject, Error};
use lopdf::{
    content::{Content, Operation},
    Dictionary, Document, Object, ObjectId, Stream,
};

/// Drawing onto existing pages without touching their current content.
pub(crate) trait InsertImageToPage {
    fn add_object<T: Into<Object>>(&mut self, object: T) -> ObjectId;

    /// Register a named entry in one of the page's resource categories
    /// (`XObject`, `Font`, ...).
    fn add_page_resource(
        &mut self,
        page_id: ObjectId,
        category: &str,
        name: &str,
        object_id: ObjectId,
    ) -> Result<(), Error>;

    /// Append operations to the page. The existing content is wrapped in
    /// `q`/`Q` so its graphics state does not leak into the new operations.
    fn add_to_page_content(
        &mut self,
        page_id: ObjectId,
        operations: Vec<Operation>,
    ) -> Result<(), Error>;

    /// Store an image and its soft mask as objects.
    /// Return the ObjectId of the image.
    fn add_image_object(&mut self, image: ImageXObject, mask: Option<ImageXObject>) -> ObjectId {
        let mut image = image;
        if let Some(mask) = mask {
            let mask_id = self.add_object(mask);
            image.s_mask = Some(mask_id);
        }
        self.add_object(image)
    }
}

impl InsertImageToPage for Document {
    fn add_object<T: Into<Object>>(&mut self, object: T) -> ObjectId {
        Document::add_object(self, object)
    }

    fn add_page_resource(
        &mut self,
        page_id: ObjectId,
        category: &str,
        name: &str,
        object_id: ObjectId,
    ) -> Result<(), Error> {
        let resources = self.get_or_create_resources(page_id)?.as_dict_mut()?;
        // The category dictionary is either inline or an indirect object.
        let existing = resources
            .get(category.as_bytes())
            .ok()
            .map(|entries| entries.as_reference().ok());
        let entries = match existing {
            Some(Some(entries_id)) => self.get_object_mut(entries_id)?.as_dict_mut()?,
            Some(None) => resources.get_mut(category.as_bytes())?.as_dict_mut()?,
            None => {
                resources.set(category, Dictionary::new());
                resources.get_mut(category.as_bytes())?.as_dict_mut()?
            }
        };
        entries.set(name, Object::Reference(object_id));
        Ok(())
    }

    fn add_to_page_content(
        &mut self,
        page_id: ObjectId,
        operations: Vec<Operation>,
    ) -> Result<(), Error> {
        let mut contents = match self.get_dictionary(page_id)?.get(b"Contents") {
            Ok(Object::Reference(contents_id)) => {
                match self.get_object(*contents_id)? {
                    Object::Array(list) => list.clone(),
                    _ => vec![Object::Reference(*contents_id)],
                }
            }
            Ok(Object::Array(list)) => list.clone(),
            Ok(_) | Err(_) => Vec::new(),
        };

        let head = Content {
            operations: vec![Operation::new("q", vec![])],
        };
        let mut tail = Content {
            operations: vec![Operation::new("Q", vec![])],
        };
        tail.operations.extend(operations);

        let head_id = self.add_object(Stream::new(Dictionary::new(), head.encode()?));
        let tail_id = self.add_object(Stream::new(Dictionary::new(), tail.encode()?));
        contents.insert(0, Object::Reference(head_id));
        contents.push(Object::Reference(tail_id));

        self.get_object_mut(page_id)?
            .as_dict_mut()?
            .set("Contents", Object::Array(contents));
        Ok(())
    }
}

/// Operations that draw a named image XObject into `rect`.
/// The image is scaled to fill `rect` exactly.
pub(crate) fn image_operations(xobject_name: &str, rect: &Rectangle) -> Vec<Operation> {
    vec![
        // The following lines use commands: see p643 (Table A.1) for more info
        // `q` = Save graphics state
        Operation::new("q", vec![]),
        // `cm` = Concatenate matrix to current transformation matrix
        Operation::new(
            "cm",
            vec![
                rect.width().into(),
                0i32.into(),
                0i32.into(),
                rect.height().into(),
                rect.x1.into(),
                rect.y1.into(),
            ],
        ),
        // `Do` = Invoke named XObject
        Operation::new("Do", vec![Object::Name(xobject_name.as_bytes().to_vec())]),
        // `Q` = Restore graphics state
        Operation::new("Q", vec![]),
    ]
}

/// Largest rectangle with the image's aspect ratio that fits in `bounds`,
/// centered in it.
pub(crate) fn fit_image(image_width: u32, image_height: u32, bounds: &Rectangle) -> Rectangle {
    if image_width == 0 || image_height == 0 {
        return *bounds;
    }
    let scale = (bounds.width() / f64::from(image_width)).min(bounds.height() / f64::from(image_height));
    let width = f64::from(image_width) * scale;
    let height = f64::from(image_height) * scale;
    let x1 = bounds.x1 + (bounds.width() - width) / 2.0;
    let y1 = bounds.y1 + (bounds.height() - height) / 2.0;
    Rectangle {
        x1,
        y1,
        x2: x1 + width,
        y2: y1 + height,
    }
}
