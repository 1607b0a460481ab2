use crate::typedef::*;

/// An expression whose value is tracked while the machine executes
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Watchpoint {
    /// The number the user refers to this watchpoint by
    pub id: u32,
    /// The source text of the tracked expression
    pub expr: String,
    /// The value of the expression when it was last evaluated
    pub value: Word,
}

/// A watchpoint whose value changed during execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trigger {
    /// The number of the watchpoint that fired
    pub id: u32,
    /// The tracked expression
    pub expr: String,
    /// The value before the change
    pub old: Word,
    /// The value after the change
    pub new: Word,
}

/// The arena owning all live watchpoints
///
/// A watchpoint's id is the index of its slot. Released slots are recycled, lowest id first, so
/// an id is only handed out again once no live watchpoint holds it.
#[derive(Debug, Default)]
pub struct WatchpointPool {
    slots: Vec<Option<Watchpoint>>,
    free: Vec<u32>,
}

impl WatchpointPool {
    /// Creates an empty pool
    pub fn new() -> WatchpointPool {
        Default::default()
    }

    /// Hands out a fresh watchpoint with a unique id. The caller fills in the expression and value.
    pub fn allocate(&mut self) -> &mut Watchpoint {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.slots.push(None);
                (self.slots.len() - 1) as u32
            }
        };

        self.slots[id as usize].get_or_insert(Watchpoint {
            id,
            ..Default::default()
        })
    }

    /// Removes the watchpoint with the given id and returns whether there was one
    pub fn release(&mut self, id: u32) -> bool {
        let released = self
            .slots
            .get_mut(id as usize)
            .and_then(Option::take)
            .is_some();

        if released {
            // Keep the free list sorted descending so `pop` yields the lowest id
            let pos = self
                .free
                .iter()
                .position(|&free| free < id)
                .unwrap_or(self.free.len());
            self.free.insert(pos, id);
        }

        released
    }

    /// Returns the live watchpoint with the given id
    pub fn get(&self, id: u32) -> Option<&Watchpoint> {
        self.slots.get(id as usize).and_then(Option::as_ref)
    }

    /// The number of live watchpoints
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether there are no live watchpoints
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Iterates over all live watchpoints in id order
    pub fn iter(&self) -> impl Iterator<Item = &Watchpoint> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Returns a snapshot of all live watchpoints in id order
    pub fn list(&self) -> Vec<Watchpoint> {
        self.iter().cloned().collect()
    }

    /// Re-evaluates every live watchpoint and returns the ones whose value changed.
    ///
    /// Changed watchpoints remember their new value. Expressions that fail to evaluate are left
    /// untouched.
    pub fn check<F>(&mut self, mut eval: F) -> Vec<Trigger>
    where
        F: FnMut(&str) -> Option<Word>,
    {
        let mut triggers = Vec::new();

        for wp in self.slots.iter_mut().filter_map(Option::as_mut) {
            let new = match eval(&wp.expr) {
                Some(value) => value,
                None => continue,
            };

            if new != wp.value {
                triggers.push(Trigger {
                    id: wp.id,
                    expr: wp.expr.clone(),
                    old: wp.value,
                    new,
                });

                wp.value = new;
            }
        }

        triggers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{thread_rng, Rng};
    use std::collections::HashSet;

    fn add(pool: &mut WatchpointPool, expr: &str, value: Word) -> u32 {
        let wp = pool.allocate();
        wp.expr = expr.into();
        wp.value = value;
        wp.id
    }

    #[test]
    fn ids_start_at_zero_and_count_up() {
        let mut pool = WatchpointPool::new();

        assert_eq!(add(&mut pool, "a0", 0), 0);
        assert_eq!(add(&mut pool, "a1", 0), 1);
        assert_eq!(add(&mut pool, "a2", 0), 2);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn release_removes_exactly_one() {
        let mut pool = WatchpointPool::new();
        let a = add(&mut pool, "a0", 1);
        let b = add(&mut pool, "a1", 2);

        assert!(pool.release(a));
        assert!(pool.get(a).is_none());
        assert_eq!(pool.get(b).map(|wp| wp.value), Some(2));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn release_absent_is_harmless() {
        let mut pool = WatchpointPool::new();
        let a = add(&mut pool, "a0", 1);

        assert!(!pool.release(42));
        assert!(pool.release(a));
        assert!(!pool.release(a));
        assert!(!pool.release(a));
        assert!(pool.is_empty());

        // A double release must not put the id on the free list twice
        let x = add(&mut pool, "t0", 0);
        let y = add(&mut pool, "t1", 0);
        assert_ne!(x, y);
    }

    #[test]
    fn freed_ids_are_reused_lowest_first() {
        let mut pool = WatchpointPool::new();
        for i in 0..5 {
            add(&mut pool, "sp", i);
        }

        pool.release(3);
        pool.release(1);

        assert_eq!(add(&mut pool, "ra", 0), 1);
        assert_eq!(add(&mut pool, "ra", 0), 3);
        assert_eq!(add(&mut pool, "ra", 0), 5);
    }

    #[test]
    fn list_is_ordered_by_id() {
        let mut pool = WatchpointPool::new();
        add(&mut pool, "a0", 10);
        add(&mut pool, "a1", 11);
        add(&mut pool, "a2", 12);
        pool.release(1);
        add(&mut pool, "a3", 13);

        let exprs: Vec<_> = pool.list().into_iter().map(|wp| wp.expr).collect();
        assert_eq!(exprs, vec!["a0", "a3", "a2"]);
    }

    #[test]
    fn live_ids_stay_unique_under_churn() {
        let mut rng = thread_rng();
        let mut pool = WatchpointPool::new();
        let mut live: Vec<u32> = Vec::new();

        for _ in 0..2000 {
            if live.is_empty() || rng.gen_bool(0.6) {
                let id = add(&mut pool, "pc", rng.gen());
                assert!(!live.contains(&id), "id {} handed out twice", id);
                live.push(id);
            } else {
                let victim = live.swap_remove(rng.gen_range(0, live.len()));
                assert!(pool.release(victim));
            }

            let ids: HashSet<u32> = pool.iter().map(|wp| wp.id).collect();
            assert_eq!(ids.len(), live.len());
            assert!(live.iter().all(|id| ids.contains(id)));
        }
    }

    #[test]
    fn check_reports_changes_and_updates_values() {
        let mut pool = WatchpointPool::new();
        add(&mut pool, "a0", 1);
        add(&mut pool, "a1", 2);
        add(&mut pool, "$bogus", 3);

        let triggers = pool.check(|expr| match expr {
            "a0" => Some(1),
            "a1" => Some(7),
            _ => None,
        });

        assert_eq!(
            triggers,
            vec![Trigger {
                id: 1,
                expr: "a1".into(),
                old: 2,
                new: 7,
            }]
        );
        assert_eq!(pool.get(1).map(|wp| wp.value), Some(7));
        assert_eq!(pool.get(2).map(|wp| wp.value), Some(3));

        assert!(pool.check(|_| Some(7)).iter().all(|t| t.id != 1));
    }
}
