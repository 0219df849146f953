//! rsv-config
//!
//! Layered YAML configuration for the reserved-balance audit:
//! - later files override earlier ones (deep merge, leaf by leaf)
//! - the merged tree is hashed as canonical JSON so a report can name the
//!   exact configuration it ran under
//! - keys nobody reads are reported (typos otherwise pass silently)

mod layered;
mod settings;
mod unused_keys;

pub use layered::{load_layered_yaml, load_layered_yaml_from_strings, LoadedConfig};
pub use settings::CheckSettings;
pub use unused_keys::{report_unused_keys, UnusedKeyPolicy, UnusedKeyReport, CONSUMED_POINTERS};
