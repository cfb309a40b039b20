//! AIM file module
//!
//! Reading and writing of AIM volumes in native scanner units.

mod aim_v020_reader;
mod aim_v020_writer;
pub mod layout;
mod reader;
pub mod types;
mod writer;

pub use aim_v020_reader::AimV020Reader;
pub use aim_v020_writer::AimV020Writer;
pub use reader::AimReader;
pub use types::AimImage;
pub use writer::AimWriter;
