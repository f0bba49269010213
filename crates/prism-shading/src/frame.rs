//! Versioned per-frame state and its single-writer publication point.
//!
//! Frames are published whole. Readers take an `Arc` snapshot and keep it
//! for the duration of their work; publishing the next frame swaps the slot
//! and leaves in-flight snapshots untouched.

use std::sync::{Arc, PoisonError, RwLock};

use glam::Vec3;
use prism_lighting::LightParams;
use tracing::debug;

use crate::connectivity::ConnectedDirections;
use crate::error::ShadingError;
use crate::transform::{FrameTransform, PreparedTransform};

/// Light and view state shared by every fragment of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightFrame {
    /// World-space camera position.
    pub view_pos: Vec3,
    /// World-space light position.
    pub light_pos: Vec3,
    /// Seconds since start. Carried for animated content; unused by shading.
    pub time: f32,
    /// Frame-global connectivity mask.
    pub connected: ConnectedDirections,
    /// Intensity and ambient factor.
    pub light: LightParams,
}

impl Default for LightFrame {
    fn default() -> Self {
        Self {
            view_pos: Vec3::new(0.0, 0.0, 3.0),
            light_pos: Vec3::new(2.0, 4.0, 3.0),
            time: 0.0,
            connected: ConnectedDirections::NONE,
            light: LightParams::default(),
        }
    }
}

/// Immutable descriptor set for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameContext {
    version: u64,
    transform: FrameTransform,
    prepared: PreparedTransform,
    light: LightFrame,
}

impl FrameContext {
    /// Build a frame, preparing its transform.
    pub fn new(version: u64, transform: FrameTransform, light: LightFrame) -> Result<Self, ShadingError> {
        Ok(Self {
            version,
            prepared: transform.prepare()?,
            transform,
            light,
        })
    }

    /// Frame version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Raw matrices.
    pub fn transform(&self) -> &FrameTransform {
        &self.transform
    }

    /// Matrices ready for the vertex stage.
    pub fn prepared(&self) -> &PreparedTransform {
        &self.prepared
    }

    /// Light and view state.
    pub fn light(&self) -> &LightFrame {
        &self.light
    }
}

/// Holds the current frame. One writer publishes; any number of readers
/// snapshot.
#[derive(Debug, Default)]
pub struct FrameSlot {
    current: RwLock<Option<Arc<FrameContext>>>,
}

impl FrameSlot {
    /// An empty slot; snapshots fail until the first publish.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current frame.
    ///
    /// # Errors
    ///
    /// [`ShadingError::StaleFrameVersion`] unless `frame.version()` is
    /// strictly greater than the published version.
    pub fn publish(&self, frame: FrameContext) -> Result<Arc<FrameContext>, ShadingError> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = current.as_ref()
            && frame.version <= existing.version
        {
            return Err(ShadingError::StaleFrameVersion {
                current: existing.version,
                offered: frame.version,
            });
        }
        let frame = Arc::new(frame);
        *current = Some(Arc::clone(&frame));
        debug!(version = frame.version, "frame published");
        Ok(frame)
    }

    /// The current frame.
    ///
    /// # Errors
    ///
    /// [`ShadingError::FrameNotInitialized`] before the first publish.
    pub fn snapshot(&self) -> Result<Arc<FrameContext>, ShadingError> {
        self.read().ok_or(ShadingError::FrameNotInitialized {
            expected: None,
            found: None,
        })
    }

    /// The current frame, which must be `version`.
    pub fn snapshot_for(&self, version: u64) -> Result<Arc<FrameContext>, ShadingError> {
        match self.read() {
            Some(frame) if frame.version == version => Ok(frame),
            other => Err(ShadingError::FrameNotInitialized {
                expected: Some(version),
                found: other.map(|f| f.version),
            }),
        }
    }

    /// Version of the current frame, if any.
    pub fn current_version(&self) -> Option<u64> {
        self.read().map(|f| f.version)
    }

    fn read(&self) -> Option<Arc<FrameContext>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    fn frame(version: u64) -> FrameContext {
        FrameContext::new(version, FrameTransform::default(), LightFrame::default()).unwrap()
    }

    #[test]
    fn test_snapshot_before_publish_fails() {
        let slot = FrameSlot::new();
        assert_eq!(
            slot.snapshot(),
            Err(ShadingError::FrameNotInitialized {
                expected: None,
                found: None
            })
        );
        assert_eq!(slot.current_version(), None);
    }

    #[test]
    fn test_publish_then_snapshot() {
        let slot = FrameSlot::new();
        slot.publish(frame(1)).unwrap();
        assert_eq!(slot.snapshot().unwrap().version(), 1);
        assert_eq!(slot.snapshot_for(1).unwrap().version(), 1);
    }

    #[test]
    fn test_versions_must_increase() {
        let slot = FrameSlot::new();
        slot.publish(frame(5)).unwrap();
        assert_eq!(
            slot.publish(frame(5)),
            Err(ShadingError::StaleFrameVersion {
                current: 5,
                offered: 5
            })
        );
        assert!(slot.publish(frame(4)).is_err());
        assert!(slot.publish(frame(6)).is_ok());
    }

    #[test]
    fn test_snapshot_for_wrong_version_fails() {
        let slot = FrameSlot::new();
        assert_eq!(
            slot.snapshot_for(1),
            Err(ShadingError::FrameNotInitialized {
                expected: Some(1),
                found: None
            })
        );
        slot.publish(frame(2)).unwrap();
        assert_eq!(
            slot.snapshot_for(1),
            Err(ShadingError::FrameNotInitialized {
                expected: Some(1),
                found: Some(2)
            })
        );
    }

    #[test]
    fn test_in_flight_snapshot_survives_publish() {
        let slot = FrameSlot::new();
        slot.publish(frame(1)).unwrap();
        let held = slot.snapshot().unwrap();
        slot.publish(frame(2)).unwrap();
        assert_eq!(held.version(), 1);
        assert_eq!(slot.current_version(), Some(2));
    }

    #[test]
    fn test_invalid_transform_never_becomes_a_frame() {
        let transform = FrameTransform {
            model: Mat4::ZERO,
            ..Default::default()
        };
        assert_eq!(
            FrameContext::new(1, transform, LightFrame::default()),
            Err(ShadingError::NonInvertibleModel)
        );
    }

    #[test]
    fn test_readers_share_across_threads() {
        let slot = FrameSlot::new();
        slot.publish(frame(3)).unwrap();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| assert_eq!(slot.snapshot().unwrap().version(), 3));
            }
        });
    }
}
