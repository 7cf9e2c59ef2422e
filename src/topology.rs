//! Tree of segments and joints making up one creature.

use crate::anatomy::{Joint, LimbFamily, Segment, SegmentId, SegmentKind};

/// Structural rule a topology broke.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyViolation {
    #[error("expected exactly {expected} {kind:?} segment(s), found {found}")]
    Count { kind: SegmentKind, expected: usize, found: usize },

    #[error("expected 2 upper {0:?} segments")]
    FamilyCount(LimbFamily),

    #[error("segment {0:?} must not have a parent")]
    RootHasParent(SegmentId),

    #[error("segment {0:?} has no parent")]
    Orphan(SegmentId),

    #[error("segment {child:?} has {found} joints to its parent")]
    JointCount { child: SegmentId, found: usize },

    #[error("segment {child:?} is attached to {parent:?}, which is not a valid parent for it")]
    BadParent { child: SegmentId, parent: SegmentId },
}

/// Arena-backed creature body. Segment 0 is always the torso.
#[derive(Clone, Debug)]
pub struct CreatureTopology {
    segments: Vec<Segment>,
    joints: Vec<Joint>,
}

impl CreatureTopology {
    /// Start a body from its root segment.
    pub(crate) fn with_root(torso: Segment) -> Self {
        debug_assert_eq!(torso.id, SegmentId(0));
        debug_assert_eq!(torso.kind, SegmentKind::Torso);
        Self {
            segments: vec![torso],
            joints: Vec::new(),
        }
    }

    /// Id the next pushed segment will receive.
    pub(crate) fn next_id(&self) -> SegmentId {
        SegmentId(self.segments.len())
    }

    pub(crate) fn push_segment(&mut self, segment: Segment) -> SegmentId {
        debug_assert_eq!(segment.id, self.next_id());
        let id = segment.id;
        self.segments.push(segment);
        id
    }

    pub(crate) fn push_joint(&mut self, joint: Joint) {
        self.joints.push(joint);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.0)
    }

    /// The root segment.
    pub fn torso(&self) -> &Segment {
        &self.segments[0]
    }

    pub fn head(&self) -> Option<&Segment> {
        self.of_kind(SegmentKind::Head).next()
    }

    pub fn of_kind(&self, kind: SegmentKind) -> impl Iterator<Item = &Segment> + '_ {
        self.segments.iter().filter(move |s| s.kind == kind)
    }

    pub fn upper_limbs(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.of_kind(SegmentKind::UpperLimb)
    }

    pub fn lower_limbs(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.of_kind(SegmentKind::LowerLimb)
    }

    /// Segments attached directly to `parent`.
    pub fn children(&self, parent: SegmentId) -> impl Iterator<Item = &Segment> + '_ {
        self.segments.iter().filter(move |s| s.parent == Some(parent))
    }

    /// Joint binding `child` to its parent.
    pub fn joint_for(&self, child: SegmentId) -> Option<&Joint> {
        self.joints.iter().find(|j| j.child == child)
    }

    /// Lower segment hanging from an upper limb, if one was grown.
    pub fn lower_of(&self, upper: SegmentId) -> Option<&Segment> {
        self.children(upper).find(|s| s.kind == SegmentKind::LowerLimb)
    }

    /// Upper segment and optional lower segment of every limb chain, in
    /// generation order.
    pub fn chains(&self) -> Vec<(&Segment, Option<&Segment>)> {
        self.upper_limbs()
            .map(|upper| (upper, self.lower_of(upper.id)))
            .collect()
    }

    /// Check the body plan: one torso at the root, one head, two legs and two
    /// arms on the torso, at most one lower segment per upper, and exactly one
    /// joint per non-root segment.
    pub fn validate(&self) -> Result<(), TopologyViolation> {
        for (kind, expected) in [
            (SegmentKind::Torso, 1),
            (SegmentKind::Head, 1),
            (SegmentKind::UpperLimb, 4),
        ] {
            let found = self.of_kind(kind).count();
            if found != expected {
                return Err(TopologyViolation::Count { kind, expected, found });
            }
        }
        for family in LimbFamily::all() {
            if self.upper_limbs().filter(|s| s.family() == Some(*family)).count() != 2 {
                return Err(TopologyViolation::FamilyCount(*family));
            }
        }

        for segment in &self.segments {
            let parent = match (segment.kind, segment.parent) {
                (SegmentKind::Torso, None) => continue,
                (SegmentKind::Torso, Some(_)) => {
                    return Err(TopologyViolation::RootHasParent(segment.id))
                }
                (_, None) => return Err(TopologyViolation::Orphan(segment.id)),
                (_, Some(parent)) => parent,
            };

            let parent_kind = self.segment(parent).map(|p| p.kind);
            let allowed = match segment.kind {
                SegmentKind::Head | SegmentKind::UpperLimb => {
                    parent_kind == Some(SegmentKind::Torso)
                }
                SegmentKind::LowerLimb => {
                    parent_kind == Some(SegmentKind::UpperLimb)
                        && self.children(parent).count() == 1
                }
                SegmentKind::Torso => false,
            };
            if !allowed {
                return Err(TopologyViolation::BadParent { child: segment.id, parent });
            }

            let found = self
                .joints
                .iter()
                .filter(|j| j.child == segment.id && j.parent == parent)
                .count();
            if found != 1 {
                return Err(TopologyViolation::JointCount { child: segment.id, found });
            }
        }
        Ok(())
    }

    /// One-line prose summary of the body plan.
    pub fn describe(&self) -> String {
        let torso = self.torso();
        let mut desc = format!(
            "A {:.2} x {:.2} x {:.2} torso",
            torso.width(),
            torso.height(),
            torso.depth()
        );
        if let Some(head) = self.head() {
            desc.push_str(&format!(" under a {:.2} head", head.width()));
        }

        for family in LimbFamily::all() {
            let chains: Vec<String> = self
                .chains()
                .into_iter()
                .filter(|(upper, _)| upper.family() == Some(*family))
                .map(|(upper, lower)| {
                    let side = upper.side().map(|s| s.label()).unwrap_or("?");
                    match lower {
                        Some(lower) => format!(
                            "{} {:.2}+{:.2}",
                            side,
                            upper.height(),
                            lower.height()
                        ),
                        None => format!("{} {:.2}", side, upper.height()),
                    }
                })
                .collect();
            desc.push_str(&format!(", {}s [{}]", family.label(), chains.join(", ")));
        }

        desc.push_str(&format!(
            ". {} segments, {} joints.",
            self.segments.len(),
            self.joints.len()
        ));
        desc
    }
}
