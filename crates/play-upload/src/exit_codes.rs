//! Exit codes for the CLI
//!
//! Every failure, whichever step it comes from, exits with [`ERROR`].

/// Success
pub const SUCCESS: u8 = 0;

/// Validation, argument or API error
pub const ERROR: u8 = 1;
