mod compare;
mod convert;
mod init;
mod search;

pub use self::compare::{DiffOutput, compare};
pub use self::convert::convert;
pub use self::init::init;
pub use self::search::{SearchView, search};

/// Exit code for a completed run with a positive outcome.
pub const EXIT_OK: i32 = 0;
/// Exit code for a completed run with a negative outcome (images differ,
/// nothing met the selection).
pub const EXIT_NEGATIVE: i32 = 1;
/// Exit code for a failed operation.
pub const EXIT_FAILURE: i32 = 2;
