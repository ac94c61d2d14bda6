pub mod editor;
pub mod renderer;
pub mod settings;
pub mod storage;
