pub mod allocator;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod session;
pub mod storage;
pub mod store;
pub mod users;

// Re-export commonly used types
pub use allocator::{AvailableBarn, Placement};
pub use config::{determine_data_dir, get_config_dir, get_config_path, Config};
pub use error::{RanchError, RanchResult};
pub use export::ExportFormat;
pub use models::{
    parse_allergies, parse_birth_date, Barn, Horse, HorseUpdate, Occupant, User, DATE_FORMAT,
};
pub use session::{BarnSummary, Session};
pub use storage::{Owned, RecordFile, RecordFormat, Storage};
pub use store::{BarnStore, HorseStore};
pub use users::{hash_password, Credentials};
