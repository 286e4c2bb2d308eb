//! Indirect update of a frame from an observed transform between two control
//! frames lying on either side of it.

use crate::date::AbsoluteDate;
use crate::error::{FrameError, FrameResult};
use crate::transform::Transform;
use crate::tree::{FrameGraph, FrameId};
use log::debug;

impl FrameGraph {
    /// Update the transform from the parent of `frame` so that
    /// `transform_to(f1, f2, date)` becomes `f1_to_f2`.
    ///
    /// Exactly one of the control frames must be `frame` itself or one of its
    /// descendants, the other one must lie outside of this subtree. They can
    /// be anywhere else in the tree.
    ///
    /// The new transform is fully computed before it replaces the old one, so
    /// on error `frame` is left untouched. If `frame` is dynamic, the installed
    /// transform only lasts until its next refresh.
    pub fn update_transform_from_controls(
        &self,
        frame: FrameId,
        f1: FrameId,
        f2: FrameId,
        f1_to_f2: &Transform,
        date: AbsoluteDate,
    ) -> FrameResult<()> {
        let Some(parent) = self.parent(frame)? else {
            return Err(FrameError::RootHasNoParent(self.name(frame)?.to_string()));
        };

        let f1_inside = self.is_in_subtree(f1, frame)?;
        let f2_inside = self.is_in_subtree(f2, frame)?;

        // `inner` is the control frame in the subtree, `outer_to_inner` goes
        // from the other one to it
        let (outer, inner, outer_to_inner) = match (f1_inside, f2_inside) {
            (false, true) => (f1, f2, *f1_to_f2),
            (true, false) => (f2, f1, f1_to_f2.inverse()),
            (true, true) => {
                return Err(FrameError::BothControlFramesInSubtree {
                    f1: self.name(f1)?.to_string(),
                    f2: self.name(f2)?.to_string(),
                    frame: self.name(frame)?.to_string(),
                })
            }
            (false, false) => {
                return Err(FrameError::NoControlFrameInSubtree {
                    f1: self.name(f1)?.to_string(),
                    f2: self.name(f2)?.to_string(),
                    frame: self.name(frame)?.to_string(),
                })
            }
        };

        // neither of these paths crosses the link being replaced
        let parent_to_outer = self.transform_to(parent, outer, date)?;
        let inner_to_frame = self.transform_to(inner, frame, date)?;

        let parent_to_frame = Transform::compose(
            &Transform::compose(&parent_to_outer, &outer_to_inner),
            &inner_to_frame,
        );
        debug!(
            "Solved frame '{}' from controls '{}' -> '{}' at {}",
            self.name(frame)?,
            self.name(f1)?,
            self.name(f2)?,
            date
        );
        self.set_transform(frame, parent_to_frame)
    }
}
