use std::sync::Arc;

use dashmap::DashSet;

use crate::models::resource::ResourceId;

/// Ids of resources with a deletion currently running.
#[derive(Clone, Debug, Default)]
pub struct InFlightDeletions {
    ids: Arc<DashSet<ResourceId>>,
}

impl InFlightDeletions {
    /// Marks `id` as in flight, or returns `None` if it already is. The mark
    /// is cleared when the guard drops.
    pub fn try_acquire(&self, id: ResourceId) -> Option<InFlightGuard> {
        self.ids.insert(id).then(|| InFlightGuard {
            ids: Arc::clone(&self.ids),
            id,
        })
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.ids.contains(id)
    }
}

#[derive(Debug)]
pub struct InFlightGuard {
    ids: Arc<DashSet<ResourceId>>,
    id: ResourceId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.ids.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_is_rejected_until_released() {
        let in_flight = InFlightDeletions::default();
        let id = ResourceId::new_v4();

        let guard = in_flight.try_acquire(id).unwrap();
        assert!(in_flight.contains(&id));
        assert!(in_flight.try_acquire(id).is_none());

        drop(guard);
        assert!(!in_flight.contains(&id));
        assert!(in_flight.try_acquire(id).is_some());
    }

    #[test]
    fn different_ids_are_independent() {
        let in_flight = InFlightDeletions::default();
        let _a = in_flight.try_acquire(ResourceId::new_v4()).unwrap();
        let _b = in_flight.try_acquire(ResourceId::new_v4()).unwrap();
    }
}
