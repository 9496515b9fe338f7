//! Usage and buffer-count assignment for a validated stream set.

use crate::stream::Stream;
use crate::traits::StreamType;
use crate::usage::Usage;

/// In-flight buffer limit given to every stream.
pub const MAX_BUFFERS: u32 = 1;

/// Usage a stream of `stream_type` needs from the allocator.
pub const fn usage_for(stream_type: StreamType) -> Usage {
    let mut usage = Usage::empty();
    if stream_type.is_output() {
        usage = usage.union(Usage::CAMERA_OUTPUT);
    }
    if stream_type.is_input() {
        usage = usage.union(Usage::CAMERA_INPUT);
    }
    usage
}

/// Assigns usage and buffer limits to every stream in the set.
///
/// Only called after [`crate::validation::validate_stream_set`] accepted the
/// set, so it has no failure path.
pub fn setup_streams<'a, I>(streams: I)
where
    I: IntoIterator<Item = &'a mut Stream>,
{
    for stream in streams {
        stream.set_usage(usage_for(stream.stream_type()));
        stream.set_max_buffers(MAX_BUFFERS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{FourCC, StreamDescriptor};

    #[test]
    fn test_usage_per_direction() {
        assert_eq!(usage_for(StreamType::Output), Usage::CAMERA_OUTPUT);
        assert_eq!(usage_for(StreamType::Input), Usage::CAMERA_INPUT);
        assert_eq!(
            usage_for(StreamType::Bidirectional),
            Usage::CAMERA_OUTPUT | Usage::CAMERA_INPUT
        );
    }

    #[test]
    fn test_setup_assigns_every_stream() {
        let mut streams: Vec<Stream> = [StreamType::Output, StreamType::Input, StreamType::Bidirectional]
            .into_iter()
            .map(|kind| Stream::new(0, &StreamDescriptor::new(kind, 640, 480, FourCC::NV21)))
            .collect();

        setup_streams(&mut streams);

        for stream in &streams {
            assert_eq!(stream.max_buffers(), MAX_BUFFERS);
            assert_eq!(stream.usage(), usage_for(stream.stream_type()));
        }
    }
}
