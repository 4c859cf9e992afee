pub mod overlay;
pub mod settings;
