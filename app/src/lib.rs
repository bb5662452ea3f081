pub mod convert;
pub mod walk;

/// Prelude with the most commonly used types
pub mod prelude {
    pub use crate::convert::{run_convert, AclConverter, ConvertParams};
    pub use crate::walk::{ParallelTreeWalk, WalkCallback};
}
