pub mod copier;
pub mod error;
pub mod manager;
pub mod settings;
pub mod snapshot;

pub use copier::{CopyStats, DirectoryCopier, EntryKind};
pub use error::BackupError;
pub use manager::{BackupManager, BackupReport};
pub use settings::{get_cast_config, get_configs};
pub use snapshot::SnapshotName;
