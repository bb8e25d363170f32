//! Format adapters: bytes in, records out, and back.

pub mod gameplay;
pub mod json;
pub mod xml;

pub use json::{JsonDocument, JsonShapeError};
pub use xml::{XmlDocument, XmlElement, XmlError, XmlNode};
