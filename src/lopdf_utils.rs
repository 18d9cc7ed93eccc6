use crate::geometry::Rectangle;
use crate::pdf_object::PdfObjectDeref;
use crate::Error;
use lopdf::{Document, Object};

/// `Integer` or `Real` as `f64`.
pub(crate) fn as_number(obj: &Object) -> Result<f64, Error> {
    match *obj {
        Object::Integer(value) => Ok(value as f64),
        #[allow(clippy::unnecessary_cast)]
        Object::Real(value) => Ok(value as f64),
        _ => Err(Error::LoPdfError(lopdf::Error::Type)),
    }
}

/// Read a `[x1 y1 x2 y2]` array, normalizing the corner order.
pub(crate) fn as_rectangle(obj: &Object, doc: &Document) -> Result<Rectangle, Error> {
    let list = obj.deref(doc)?.as_array()?;
    if list.len() < 4 {
        return Err(Error::from(format!(
            "Rectangle needs 4 numbers, got {}.",
            list.len()
        )));
    }
    let mut values = [0f64; 4];
    for (value, item) in values.iter_mut().zip(list) {
        *value = as_number(item.deref(doc)?)?;
    }
    Ok(Rectangle {
        x1: values[0].min(values[2]),
        y1: values[1].min(values[3]),
        x2: values[0].max(values[2]),
        y2: values[1].max(values[3]),
    })
}
