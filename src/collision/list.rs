use super::info::CollisionInfo;

/// A bounded, reusable buffer of collisions.
///
/// When full, new collisions are dropped (not the oldest) and counted in
/// [`CollisionList::dropped`] until the next [`CollisionList::clear`].
#[derive(Debug, Clone)]
pub struct CollisionList {
    collisions: Vec<CollisionInfo>,
    capacity: usize,
    dropped: usize,
}

impl CollisionList {
    pub fn new(capacity: usize) -> Self {
        Self {
            collisions: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Stores `collision` if there is room. Returns whether it was stored.
    pub fn push(&mut self, collision: CollisionInfo) -> bool {
        if self.is_full() {
            self.dropped += 1;
            return false;
        }
        self.collisions.push(collision);
        true
    }

    pub fn clear(&mut self) {
        self.collisions.clear();
        self.dropped = 0;
    }

    pub fn len(&self) -> usize {
        self.collisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collisions.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.collisions.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Collisions refused since the last clear.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn get(&self, index: usize) -> Option<&CollisionInfo> {
        self.collisions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CollisionInfo> {
        self.collisions.iter()
    }
}

impl<'a> IntoIterator for &'a CollisionList {
    type Item = &'a CollisionInfo;
    type IntoIter = std::slice::Iter<'a, CollisionInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
