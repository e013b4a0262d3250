pub mod bundle_loader;

pub use bundle_loader::{load_all_bundles, load_bundle};
