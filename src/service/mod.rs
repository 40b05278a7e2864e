pub mod accounts;
pub mod admission;
pub mod locks;
pub mod settings;

pub use accounts::{AccountsService, Registration};
pub use admission::SessionAdmission;
pub use locks::AccountLocks;
pub use settings::{MAX_SETTINGS, SettingsManager};
