//! Placing a visual signature stamp on a PDF page and getting the document
//! signed by a remote signing service.
//!
//! The client half ([`SigningSession`], [`PlacementSurface`], [`MarkerBoard`])
//! turns a pointer selection into fractional page coordinates and submits the
//! document with the signer's credential. The service half
//! ([`StampedDocument`]) burns the stamps into the pages at those coordinates.

mod client;
mod config;
mod document;
mod error;
mod flow;
mod geometry;
mod image_insert_to_page;
mod image_xobject;
mod lopdf_utils;
mod pdf_object;
mod placement;
mod request;
mod stamp;
mod wire;

pub use client::{HttpSigningClient, SignedDocument, SigningService};
pub use config::{SignerConfig, StampDimensions, DEFAULT_SERVICE_URL};
pub use document::{PageSize, SourceDocument};
pub use error::{Error, ServiceError, ValidationError};
pub use flow::{FlowState, SigningSession};
pub use geometry::{
    from_signing_service_coordinates, to_signing_service_coordinates, Rectangle, ServicePoint,
    SignatureAnchor,
};
pub use lopdf;
pub use placement::{Marker, MarkerBoard, MarkerId, PageView, PixelRect, PlacementSurface};
pub use request::{SignatureRequest, SignatureRequestBuilder, Upload};
pub use secrecy::SecretString;
pub use stamp::{sanitize_signer_id, StampAppearance, StampedDocument};
pub use wire::{parse_placements, PageBox, PercentPlacement, Placements, SignaturePlacement};
