pub mod model;
pub mod palette;
pub mod reference;

pub use model::{
    AppearanceMode, ModeValue, PropertyValue, ThemeDocument, load_document,
    merge_documents, save_document,
};
pub use palette::{Palette, PaletteEntry};
