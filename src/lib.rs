pub mod error;
pub mod formats;
pub mod store;

mod copy;
mod embed;
mod extract;
mod index;
mod prelude;
mod restore;
mod verify;

pub use error::{Error, Side};
pub use formats::{detect_family, sniff_file};
pub use index::{ChunkIndex, ChunkRange, Family};
pub use prelude::R;
pub use restore::RestoreOffsets;
pub use store::{BlockStorage, BlockType};

pub fn debug_println(args: std::fmt::Arguments) {
    if cfg!(debug_assertions) {
        println!("{}", args);
    }
}

// Helper macro to use it like println!
#[macro_export]
macro_rules! dprintln {
    ($($arg:tt)*) => {
        $crate::debug_println(format_args!($($arg)*))
    };
}
