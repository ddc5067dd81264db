pub mod call;
pub mod constants;
pub mod error;
pub mod module;
pub mod types;

pub use call::*;
pub use constants::*;
pub use error::WiringError;
pub use module::*;
pub use types::*;
