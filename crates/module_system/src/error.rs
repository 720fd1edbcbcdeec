//! Error types for the module system.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModuleSystemError {
    #[error("Module not registered: {0}")]
    ModuleNotFound(String),

    #[error("Module already registered: {0}")]
    AlreadyRegistered(String),
}
