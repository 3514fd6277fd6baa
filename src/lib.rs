pub mod dictionary;
pub mod i18n;
pub mod logging;
pub mod prefs;
pub mod screen;
pub mod slider;
pub mod utils;

pub use prefs::PrefStore;
pub use screen::DebugScreen;
