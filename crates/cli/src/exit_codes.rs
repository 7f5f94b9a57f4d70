//! Process exit codes.

/// Successful command.
pub const EXIT_SUCCESS: u8 = 0;

/// Any validation failure, caught error, or usage problem.
pub const EXIT_FAILURE: u8 = 1;
