use thiserror::Error;

/// Precondition violations detected while shading.
///
/// On the GPU these inputs produce undefined output; the CPU path refuses
/// them instead.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ShadingError {
    /// The flattened atlas layer does not exist.
    #[error("atlas layer {index} out of range (atlas has {layer_count} layers)")]
    AtlasIndexOutOfRange {
        /// Computed layer index, widened so overflow is reported faithfully.
        index: u64,
        /// Layers available.
        layer_count: u32,
    },

    /// A packed field holds a value outside its range.
    #[error("invalid packed field `{field}`: {value:#x}")]
    InvalidPackedField {
        /// Field name.
        field: &'static str,
        /// Offending raw value.
        value: u32,
    },

    /// No frame has been published, or the published frame is not the
    /// one the caller expected.
    #[error("frame not initialized (expected {expected:?}, found {found:?})")]
    FrameNotInitialized {
        /// Version the caller asked for, if any.
        expected: Option<u64>,
        /// Version currently published, if any.
        found: Option<u64>,
    },

    /// A frame was published with a version that does not advance.
    #[error("stale frame version {offered} (current is {current})")]
    StaleFrameVersion {
        /// Currently published version.
        current: u64,
        /// Rejected version.
        offered: u64,
    },

    /// Tile too small for the connected-texture margin.
    #[error("tile {width}x{height} too small for connected-texture sampling")]
    TileTooSmall {
        /// Tile width in texels.
        width: u32,
        /// Tile height in texels.
        height: u32,
    },

    /// The model matrix has no inverse, so normals cannot be transformed.
    #[error("model matrix is not invertible")]
    NonInvertibleModel,
}
