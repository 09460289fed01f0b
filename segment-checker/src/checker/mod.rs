//! Checkers compare the desired state of collections with what query nodes report and emit
//! tasks that move the cluster towards the target.

mod segment;

pub use self::segment::SegmentChecker;

use model::SegmentTask;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum CheckerType {
    #[strum(serialize = "segment-checker")]
    Segment,
}

pub trait Checker {
    fn id(&self) -> CheckerType;

    fn description(&self) -> &'static str;

    /// Run a single pass over the current snapshots. An inactive checker returns no tasks.
    fn check(&self) -> Vec<SegmentTask>;

    fn activate(&self);

    fn deactivate(&self);

    fn is_active(&self) -> bool;
}
