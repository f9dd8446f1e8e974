//! KDL configuration loading for yard blueprints.
//!
//! This crate handles:
//! - Decoding resource blocks (`network`, `cluster`, `container`, ...) into the core model
//! - Blueprint metadata files (`*.yard`)
//! - Expression functions such as `${env(HOME)}`
//! - Normalizing relative paths against the declaring file

mod decode;
pub mod error;
pub mod eval;
pub mod loader;
pub mod paths;

pub use error::{ConfigError, ConfigResult};
pub use eval::{EvalContext, EvalContextBuilder};
pub use loader::{load, parse_blueprint_file, parse_blueprint_str, parse_file, parse_folder, parse_str};
