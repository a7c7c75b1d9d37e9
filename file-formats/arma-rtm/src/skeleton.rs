//! Bone hierarchy abstraction consumed by the import engine.
//!
//! The host application owns the actual skeleton; the engine only needs to
//! enumerate it as a forest of named nodes with parent links and local bind
//! matrices. [`ArmatureDef`] is a plain in-memory implementation used by the
//! tests and suitable as a starting point for hosts without their own
//! hierarchy type.

use glam::Mat4;

/// Opaque handle to a bone within a [`Skeleton`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoneId(pub usize);

/// Read-only view of a target bone hierarchy
pub trait Skeleton {
    /// Root bones, in the provider's order
    fn roots(&self) -> Vec<BoneId>;

    /// Direct children of a bone, in the provider's order
    fn children(&self, bone: BoneId) -> Vec<BoneId>;

    /// Parent of a bone, if any
    fn parent(&self, bone: BoneId) -> Option<BoneId>;

    /// Bone name as known to the host (matched case-insensitively)
    fn name(&self, bone: BoneId) -> &str;

    /// Local rest-pose transform of the bone, relative to its parent
    fn bind_matrix(&self, bone: BoneId) -> Mat4;
}

/// Fixed evaluation order over the hierarchy forest: all roots first, then
/// each root's descendants depth-first. Every bone appears exactly once and
/// parents always precede their children.
pub fn traversal_order<S: Skeleton + ?Sized>(skeleton: &S) -> Vec<BoneId> {
    let roots = skeleton.roots();
    let mut order = roots.clone();
    for root in roots {
        push_descendants(skeleton, root, &mut order);
    }
    order
}

fn push_descendants<S: Skeleton + ?Sized>(skeleton: &S, bone: BoneId, order: &mut Vec<BoneId>) {
    for child in skeleton.children(bone) {
        order.push(child);
        push_descendants(skeleton, child, order);
    }
}

/// Simple owned bone hierarchy
#[derive(Debug, Default, Clone)]
pub struct ArmatureDef {
    bones: Vec<ArmatureBone>,
}

#[derive(Debug, Clone)]
struct ArmatureBone {
    name: String,
    parent: Option<BoneId>,
    children: Vec<BoneId>,
    bind: Mat4,
}

impl ArmatureDef {
    /// Create an empty armature
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bone; pass `None` as parent for a root bone.
    pub fn add_bone(&mut self, name: &str, parent: Option<BoneId>, bind: Mat4) -> BoneId {
        let id = BoneId(self.bones.len());
        self.bones.push(ArmatureBone {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            bind,
        });
        if let Some(parent) = parent {
            self.bones[parent.0].children.push(id);
        }
        id
    }

    /// Number of bones in the armature
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Whether the armature has no bones
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

impl Skeleton for ArmatureDef {
    fn roots(&self) -> Vec<BoneId> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.parent.is_none())
            .map(|(index, _)| BoneId(index))
            .collect()
    }

    fn children(&self, bone: BoneId) -> Vec<BoneId> {
        self.bones[bone.0].children.clone()
    }

    fn parent(&self, bone: BoneId) -> Option<BoneId> {
        self.bones[bone.0].parent
    }

    fn name(&self, bone: BoneId) -> &str {
        &self.bones[bone.0].name
    }

    fn bind_matrix(&self, bone: BoneId) -> Mat4 {
        self.bones[bone.0].bind
    }
}
