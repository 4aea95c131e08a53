pub mod enums;
pub mod finding;
pub mod route;
pub mod session;

pub use enums::*;
pub use finding::*;
pub use route::*;
pub use session::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}
