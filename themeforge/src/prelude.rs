pub use crate::core::error::{Error, Result};
pub use crate::core::logging::init_logger;
pub use crate::core::logging::{debug, error, info, trace, warn};
pub use crate::document::model::{
    AppearanceMode, ModeValue, PropertyValue, ThemeDocument, load_document,
    merge_documents, save_document,
};
pub use crate::document::palette::{Palette, PaletteEntry};
pub use crate::history::{CommandLog, PropertyVector, UndoOutcome};
pub use crate::protocol::channel::{
    CommandListener, CommandSender, CommandSink, Endpoint,
};
pub use crate::protocol::command::{Command, Domain, Operation};
pub use crate::protocol::rendezvous::Rendezvous;
pub use crate::runtime::editor::EditorSession;
pub use crate::runtime::renderer::ShadowView;
pub use crate::runtime::settings::Settings;
