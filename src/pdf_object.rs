use crate::Error;
use lopdf::{Dictionary, Document, Object};

/// Page tree lookups stop after this many `Parent` hops.
const MAX_INHERITANCE_DEPTH: usize = 32;

pub(crate) trait PdfObjectDeref {
    fn deref<'a>(&'a self, doc: &'a Document) -> Result<&'a Object, Error>;
}

impl PdfObjectDeref for Object {
    fn deref<'a>(&'a self, doc: &'a Document) -> Result<&'a Object, Error> {
        match *self {
            Object::Reference(oid) => doc
                .objects
                .get(&oid)
                .ok_or_else(|| Error::Other(format!("PDF Error: NoSuchReference({:#?})", oid))),
            _ => Ok(self),
        }
    }
}

/// Look up `key` on a page dictionary, walking up the page tree for
/// inheritable attributes such as `MediaBox`.
pub(crate) fn get_inherited<'a>(
    doc: &'a Document,
    page_dict: &'a Dictionary,
    key: &[u8],
) -> Result<Option<&'a Object>, Error> {
    let mut current = page_dict;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if current.has(key) {
            return Ok(Some(current.get(key)?.deref(doc)?));
        }
        if !current.has(b"Parent") {
            return Ok(None);
        }
        current = current.get(b"Parent")?.deref(doc)?.as_dict()?;
    }
    log::warn!(
        "Page tree deeper than {} levels while looking for `{}`.",
        MAX_INHERITANCE_DEPTH,
        String::from_utf8_lossy(key)
    );
    Ok(None)
}
