//! Pool 与 Arena 单元测试

use crate::runtime::pool::{Arena, Pool, Recycle};

#[derive(Debug, Default)]
struct Check {
    payload: Vec<u32>,
    spawns: usize,
    despawns: usize,
}

impl Recycle for Check {
    fn on_spawn(&mut self) {
        self.spawns += 1;
    }

    fn on_despawn(&mut self) {
        self.payload.clear();
        self.despawns += 1;
    }
}

#[cfg(test)]
mod pool_tests {
    use super::*;

    #[test]
    fn test_spawn_creates_when_empty() {
        let mut pool: Pool<Check> = Pool::new();
        let check = pool.spawn();
        assert_eq!(check.spawns, 1);
        assert_eq!(pool.stats().spawned, 1);
        assert_eq!(pool.stats().reused, 0);
    }

    #[test]
    fn test_despawn_then_spawn_reuses() {
        let mut pool: Pool<Check> = Pool::new();
        let mut check = pool.spawn();
        check.payload.push(7);
        pool.despawn(check);
        assert_eq!(pool.available(), 1);

        let check = pool.spawn();
        assert!(check.payload.is_empty());
        assert_eq!(check.spawns, 2);
        assert_eq!(check.despawns, 1);
        assert_eq!(pool.stats().reused, 1);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_limit_discards_extra_values() {
        let mut pool: Pool<Check> = Pool::with_limit(1);
        let a = pool.spawn();
        let b = pool.spawn();
        pool.despawn(a);
        pool.despawn(b);
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn test_prewarm_respects_limit() {
        let mut pool: Pool<Check> = Pool::with_limit(4);
        pool.prewarm(10);
        assert_eq!(pool.available(), 4);
        pool.clear();
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_reuse_rate() {
        let mut pool: Pool<Check> = Pool::new();
        assert_eq!(pool.stats().reuse_rate(), 0.0);
        let check = pool.spawn();
        pool.despawn(check);
        let _ = pool.spawn();
        assert!((pool.stats().reuse_rate() - 0.5).abs() < f64::EPSILON);
    }
}

#[cfg(test)]
mod arena_tests {
    use super::*;

    #[test]
    fn test_spawn_and_index() {
        let mut arena: Arena<Check> = Arena::new();
        let id = arena.spawn();
        arena[id].payload.push(3);
        assert_eq!(arena[id].payload, vec![3]);
        assert_eq!(arena.live(), 1);
        assert!(arena.contains(id));
    }

    #[test]
    fn test_despawn_invalidates_old_id() {
        let mut arena: Arena<Check> = Arena::new();
        let id = arena.spawn();
        assert!(arena.despawn(id));
        assert!(!arena.contains(id));
        assert!(!arena.despawn(id));
        assert_eq!(arena.live(), 0);
        assert_eq!(arena.available(), 1);
    }

    #[test]
    fn test_released_slot_is_reused_with_new_generation() {
        let mut arena: Arena<Check> = Arena::new();
        let first = arena.spawn();
        arena[first].payload.push(1);
        arena.despawn(first);

        let second = arena.spawn();
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert!(arena[second].payload.is_empty());
        assert!(arena.get(first).is_none());
        assert_eq!(arena.capacity(), 1);
        assert_eq!(arena.stats().reused, 1);
    }

    #[test]
    #[should_panic(expected = "stale arena handle")]
    fn test_index_with_stale_id_panics() {
        let mut arena: Arena<Check> = Arena::new();
        let id = arena.spawn();
        arena.despawn(id);
        let _ = &arena[id];
    }

    #[test]
    fn test_prewarm_then_spawn_uses_free_slots() {
        let mut arena: Arena<Check> = Arena::new();
        arena.prewarm(8);
        assert_eq!(arena.available(), 8);
        for _ in 0..8 {
            arena.spawn();
        }
        assert_eq!(arena.capacity(), 8);
        assert_eq!(arena.available(), 0);
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut arena: Arena<Check> = Arena::new();
        let ids: Vec<_> = (0..5).map(|_| arena.spawn()).collect();
        arena.clear();
        assert_eq!(arena.live(), 0);
        assert_eq!(arena.available(), 5);
        assert!(ids.iter().all(|id| !arena.contains(*id)));
        assert_eq!(arena.iter().count(), 0);
    }
}
