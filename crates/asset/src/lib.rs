//! Asset loading/parsers: Wavefront OBJ geometry, MTL materials, textures.
//! Assets are fetched through an [`source::AssetSource`] and joined by
//! [`model::load_model`] before anything is uploaded.

pub mod error;
pub mod mesh;
pub mod model;
pub mod mtl;
pub mod obj;
pub mod source;
pub mod texture;
mod text;

pub use error::{FetchError, LoadError, ParseError, ParseErrorKind};
pub use model::{LoadedModel, load_model};
pub use mtl::{Material, MaterialLibrary, parse_mtl};
pub use obj::{Geometry, ObjModel, parse_obj};
