use serde::{Deserialize, Serialize};

/// Identifies a material node in the craft graph. Cheap to copy and compare.
///
/// Ids are dense indices assigned in first-seen order, so two graphs built
/// from the same recipe book assign identical ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

impl MaterialId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
