//! Channel loading module
//!
//! This module provides native-depth channel buffers and format readers.

mod reader;
mod tiff_reader;
pub mod types;

pub use reader::ChannelReader;
pub use tiff_reader::TiffChannelReader;
pub use types::{ChannelBuffer, SampleData};
