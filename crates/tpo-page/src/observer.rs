//! Intersection observers
//!
//! Emulates enough of IntersectionObserver for proximity loading: a
//! set of target nodes, a root margin, and a callback invoked with the
//! targets that intersect the margin-expanded viewport. Initial state
//! is delivered asynchronously by the page (0 ms timer); later checks
//! run on scroll.

use std::rc::Rc;
use tpo_dom::NodeId;

/// Observer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

pub(crate) struct Observer {
    id: u32,
    pub targets: Vec<NodeId>,
    pub margin: f32,
    pub callback: Rc<dyn Fn(&[NodeId])>,
    active: bool,
}

/// Registered observers
#[derive(Default)]
pub(crate) struct ObserverSet {
    observers: Vec<Observer>,
    next_id: u32,
}

impl ObserverSet {
    /// Register an observer over a set of targets.
    pub fn add(
        &mut self,
        targets: Vec<NodeId>,
        margin: f32,
        callback: Rc<dyn Fn(&[NodeId])>,
    ) -> ObserverId {
        let id = self.next_id;
        self.next_id += 1;
        self.observers.push(Observer {
            id,
            targets,
            margin,
            callback,
            active: true,
        });
        ObserverId(id)
    }

    /// Disconnect an observer. Unknown ids are ignored.
    pub fn disconnect(&mut self, id: ObserverId) {
        if let Some(obs) = self.observers.iter_mut().find(|o| o.id == id.0) {
            obs.active = false;
        }
    }

    /// Check whether an observer is still connected.
    pub fn is_active(&self, id: ObserverId) -> bool {
        self.observers.iter().any(|o| o.id == id.0 && o.active)
    }

    /// Snapshot the active observers, optionally restricted to one id.
    pub fn snapshot(&self, only: Option<ObserverId>) -> Vec<(ObserverId, Vec<NodeId>, f32, Rc<dyn Fn(&[NodeId])>)> {
        self.observers
            .iter()
            .filter(|o| o.active && only.map(|id| id.0 == o.id).unwrap_or(true))
            .map(|o| (ObserverId(o.id), o.targets.clone(), o.margin, o.callback.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect() {
        let mut set = ObserverSet::default();
        let id = set.add(vec![NodeId(0)], 200.0, Rc::new(|_| {}));

        assert!(set.is_active(id));
        assert_eq!(set.snapshot(None).len(), 1);

        set.disconnect(id);
        assert!(!set.is_active(id));
        assert!(set.snapshot(None).is_empty());
    }

    #[test]
    fn test_snapshot_single() {
        let mut set = ObserverSet::default();
        let a = set.add(vec![NodeId(0)], 0.0, Rc::new(|_| {}));
        let _b = set.add(vec![NodeId(1)], 0.0, Rc::new(|_| {}));

        let snap = set.snapshot(Some(a));
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].0, a);
    }
}
