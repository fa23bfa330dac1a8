use crate::analysis_pipeline::common::error::Result;
use crate::analysis_pipeline::channel::types::ChannelBuffer;

pub trait ChannelReader {
    fn read_channel(&self, data: &[u8], channel_id: &str) -> Result<ChannelBuffer>;
}
