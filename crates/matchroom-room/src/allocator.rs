//! Room allocation: turning the waiting pool into room specs.
//!
//! A room seats one focal participant of one category and `ratio`
//! candidates of the other. Per round the allocator aims for
//!
//! ```text
//! A-focal rooms = min(a, b / ratio)
//! B-focal rooms = min(b, a / ratio)
//! ```
//!
//! Those two counts are upper bounds computed independently, so together
//! they can ask for more people than are waiting (a = b = 3 wants one room
//! of each kind, eight seats for six people). [`plan`] picks the feasible
//! pair within the bounds that seats the most rooms, preferring A-focal
//! rooms on ties. Whenever both bounds fit at once the plan equals them.

use matchroom_protocol::{Category, ParticipantId, RoomId};

use crate::WaitingPool;

/// A participant withdrawn from the pool for a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub id: ParticipantId,
    pub category: Category,
}

/// One room the allocator decided to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSpec {
    pub room_id: RoomId,
    pub focal: Member,
    /// Ordinal `k` is `candidates[k - 1]`.
    pub candidates: Vec<Member>,
}

/// How many rooms of each kind a round creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundPlan {
    /// Rooms with a category-A focal participant and B candidates.
    pub a_focal: usize,
    /// Rooms with a category-B focal participant and A candidates.
    pub b_focal: usize,
}

impl RoundPlan {
    pub fn total(&self) -> usize {
        self.a_focal + self.b_focal
    }
}

/// Hands out room ids, unique for the lifetime of one director.
#[derive(Debug)]
pub struct RoomIds {
    next: u64,
}

impl RoomIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> RoomId {
        let id = RoomId(self.next);
        self.next += 1;
        id
    }
}

impl Default for RoomIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the room counts for `a` waiting A participants and `b`
/// waiting B participants.
pub fn plan(a: usize, b: usize, ratio: usize) -> RoundPlan {
    if ratio == 0 {
        return RoundPlan::default();
    }
    let cap_a = a.min(b / ratio);
    let cap_b = b.min(a / ratio);

    let mut best = RoundPlan::default();
    for a_focal in 0..=cap_a {
        let a_left = a - a_focal;
        let b_left = b - a_focal * ratio;
        let b_focal = cap_b.min(b_left).min(a_left / ratio);
        let candidate = RoundPlan { a_focal, b_focal };
        if candidate.total() >= best.total() {
            best = candidate;
        }
    }
    best
}

/// Withdraws participants from `pool` into new room specs.
///
/// A-focal rooms come first, then B-focal rooms. Within a room the focal
/// participant is withdrawn first, then the candidates; each pick is the
/// longest-waiting participant of the needed category. Returns an empty
/// vector, leaving the pool untouched, when not even one room fits.
pub fn allocate(pool: &mut WaitingPool, ratio: usize, ids: &mut RoomIds) -> Vec<RoomSpec> {
    let counts = plan(
        pool.count_by_category(Category::A),
        pool.count_by_category(Category::B),
        ratio,
    );
    if counts.total() == 0 {
        return Vec::new();
    }

    let kinds = std::iter::repeat_n(Category::A, counts.a_focal)
        .chain(std::iter::repeat_n(Category::B, counts.b_focal));

    let mut specs = Vec::with_capacity(counts.total());
    for focal_category in kinds {
        // The plan only asks for people who are waiting, so every take
        // below succeeds.
        let Some(focal) = pool.take_first(focal_category) else {
            break;
        };
        let candidate_category = focal_category.other();
        let candidates: Vec<Member> = std::iter::from_fn(|| pool.take_first(candidate_category))
            .take(ratio)
            .map(|id| Member {
                id,
                category: candidate_category,
            })
            .collect();

        specs.push(RoomSpec {
            room_id: ids.next_id(),
            focal: Member {
                id: focal,
                category: focal_category,
            },
            candidates,
        });
    }
    specs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> ParticipantId {
        ParticipantId(id)
    }

    fn pool_with(a: u64, b: u64) -> WaitingPool {
        let mut pool = WaitingPool::new();
        for i in 0..a {
            pool.admit(pid(100 + i), Category::A);
        }
        for i in 0..b {
            pool.admit(pid(200 + i), Category::B);
        }
        pool
    }

    #[test]
    fn test_plan_matches_formula_when_both_fit() {
        for (a, b) in [(1, 3), (3, 1), (4, 4), (6, 2), (2, 6), (8, 8)] {
            let got = plan(a, b, 3);
            assert_eq!(got.a_focal, a.min(b / 3), "a-focal for ({a},{b})");
            assert_eq!(got.b_focal, b.min(a / 3), "b-focal for ({a},{b})");
        }
    }

    #[test]
    fn test_plan_empty_cases() {
        assert_eq!(plan(0, 5, 3).total(), 0);
        assert_eq!(plan(5, 0, 3).total(), 0);
        assert_eq!(plan(2, 2, 3).total(), 0);
        assert_eq!(plan(10, 10, 0).total(), 0);
    }

    #[test]
    fn test_plan_resolves_overlapping_bounds() {
        // min(3, 3/3) + min(3, 3/3) = 2 rooms need 8 seats; only one fits.
        assert_eq!(plan(3, 3, 3), RoundPlan { a_focal: 1, b_focal: 0 });
        // 9 A and 3 B: three B-focal rooms seat everyone.
        assert_eq!(plan(9, 3, 3), RoundPlan { a_focal: 0, b_focal: 3 });
    }

    #[test]
    fn test_plan_never_overcommits() {
        for a in 0..20 {
            for b in 0..20 {
                let p = plan(a, b, 3);
                assert!(p.a_focal + 3 * p.b_focal <= a, "A seats for ({a},{b})");
                assert!(p.b_focal + 3 * p.a_focal <= b, "B seats for ({a},{b})");
            }
        }
    }

    #[test]
    fn test_allocate_insufficient_leaves_pool_untouched() {
        let mut pool = pool_with(0, 5);
        let specs = allocate(&mut pool, 3, &mut RoomIds::new());
        assert!(specs.is_empty());
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn test_allocate_withdraws_focal_then_candidates_in_pool_order() {
        let mut pool = WaitingPool::new();
        pool.admit(pid(1), Category::A);
        pool.admit(pid(2), Category::B);
        pool.admit(pid(3), Category::B);
        pool.admit(pid(4), Category::B);

        let specs = allocate(&mut pool, 3, &mut RoomIds::new());
        assert_eq!(specs.len(), 1);
        let spec = &specs[0];
        assert_eq!(spec.room_id, RoomId(1));
        assert_eq!(spec.focal, Member { id: pid(1), category: Category::A });
        let candidates: Vec<_> = spec.candidates.iter().map(|m| m.id).collect();
        assert_eq!(candidates, vec![pid(2), pid(3), pid(4)]);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_allocate_never_reuses_participants() {
        let mut pool = pool_with(8, 8);
        let specs = allocate(&mut pool, 3, &mut RoomIds::new());
        assert_eq!(specs.len(), 4);

        let mut seen = std::collections::HashSet::new();
        for spec in &specs {
            assert_eq!(spec.candidates.len(), 3);
            for m in std::iter::once(&spec.focal).chain(&spec.candidates) {
                assert!(seen.insert(m.id), "{} seated twice", m.id);
                assert!(!pool.contains(m.id));
            }
            for c in &spec.candidates {
                assert_eq!(c.category, spec.focal.category.other());
            }
        }
        assert!(pool.is_empty());
    }

    #[test]
    fn test_allocate_room_ids_are_unique_across_rounds() {
        let mut ids = RoomIds::new();
        let mut first = pool_with(1, 3);
        let mut second = pool_with(3, 1);
        let a = allocate(&mut first, 3, &mut ids);
        let b = allocate(&mut second, 3, &mut ids);
        assert_eq!(a[0].room_id, RoomId(1));
        assert_eq!(b[0].room_id, RoomId(2));
        assert_eq!(b[0].focal.category, Category::B);
    }
}
