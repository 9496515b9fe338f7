//! Gralloc buffer usage flags.

use bitflags::bitflags;

bitflags! {
    /// How a stream's buffers will be accessed, as reported to the allocator.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Usage: u32 {
        /// CPU reads the buffer often.
        const SW_READ_OFTEN = 0x0000_0003;
        /// CPU writes the buffer often.
        const SW_WRITE_OFTEN = 0x0000_0030;
        /// Camera hardware writes the buffer.
        const HW_CAMERA_WRITE = 0x0002_0000;
        /// Camera hardware reads the buffer.
        const HW_CAMERA_READ = 0x0004_0000;

        /// Everything an output-capable stream needs.
        const CAMERA_OUTPUT = Self::SW_WRITE_OFTEN.bits() | Self::HW_CAMERA_WRITE.bits();
        /// Everything an input-capable stream needs.
        const CAMERA_INPUT = Self::SW_READ_OFTEN.bits() | Self::HW_CAMERA_READ.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_flags() {
        assert!(Usage::CAMERA_OUTPUT.contains(Usage::SW_WRITE_OFTEN));
        assert!(Usage::CAMERA_OUTPUT.contains(Usage::HW_CAMERA_WRITE));
        assert!(!Usage::CAMERA_OUTPUT.intersects(Usage::HW_CAMERA_READ));
        assert_eq!(Usage::CAMERA_INPUT.bits(), 0x0004_0003);
    }
}
