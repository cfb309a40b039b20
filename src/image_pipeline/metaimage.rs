//! MetaImage module
//!
//! Reading and writing of the generic volume container (`.mha`), including
//! its free-form metadata entries.

mod metaimage_reader;
mod metaimage_writer;
mod reader;
pub mod types;
mod writer;

pub use metaimage_reader::MetaImageReader;
pub use metaimage_writer::MetaImageWriter;
pub use reader::VolumeReader;
pub use types::ElementType;
pub use writer::VolumeWriter;
