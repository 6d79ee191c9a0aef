//! Host layer
//!
//! The driver never renders circuits itself. Loading and exporting go
//! through the [`ExportHost`] trait, implemented here by [`WorkcraftHost`].

mod probe;
mod traits;
mod workcraft;

pub use probe::probe_work_file;
pub use traits::ExportHost;
pub use workcraft::WorkcraftHost;
