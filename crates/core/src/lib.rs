pub mod config;
pub mod error;
pub mod event;
pub mod record;
pub mod series;
pub mod threshold;

pub use config::Config;
pub use error::*;
pub use event::*;
pub use record::*;
pub use series::*;
pub use threshold::*;
