pub mod align;
pub mod config;
pub mod error;
pub mod io;
pub mod metrics;
pub mod session;
pub mod signal;

pub use align::{align, align_with_config, AlignConfig};
pub use error::*;
pub use signal::*;
