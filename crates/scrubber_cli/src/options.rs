use bitflags::bitflags;

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CliOptions: u32 {
        /// Print `info` as JSON
        const Json = 1 << 0;

        /// Wrap around when stepping past either end
        const Loop = 1 << 1;

        /// Keep every composited frame instead of just keyframes
        const KeepAll = 1 << 2;
    }
}
