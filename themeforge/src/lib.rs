//! Cross-process synchronization core for a widget-theme editor.
//!
//! Editing happens in one process (the editor); a second, independently
//! launched process renders a live preview. The two never share memory:
//! every edit travels as a framed JSON command over loopback TCP, startup is
//! coordinated through filesystem markers, and every mutation is wrapped in
//! a reversible command log so undo/redo replays cleanly against both sides.

pub mod core;
pub mod document;
pub mod history;
pub mod prelude;
pub mod protocol;
pub mod runtime;
