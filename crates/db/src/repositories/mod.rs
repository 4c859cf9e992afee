pub mod overlay_repo;
pub mod settings_repo;

pub use overlay_repo::OverlayRepo;
pub use settings_repo::SettingsRepo;
