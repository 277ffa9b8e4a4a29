//! Root-splitting machinery shared by both solvers: canonical move
//! ordering, the best-length gate, and the worker pool.

use cube_core::{CubeState, Move, ALL_MOVES};
use itertools::Itertools;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

/// Sentinel "no previous face" value for the adjacency rules.
pub(crate) const NO_FACE: u8 = 6;

/// `DISALLOW[f]` names the face after which `f` must not be turned: the same
/// face again, and for each opposite pair only the lower-index face may
/// follow the higher.
const DISALLOW: [u8; 6] = [NO_FACE, 0, NO_FACE, 2, NO_FACE, 4];

pub(crate) fn face_allowed(previous: u8, face: u8) -> bool {
    face != previous && DISALLOW[face as usize] != previous
}

/// One committed first move.
pub(crate) struct Root {
    pub mv: Move,
    pub cube: CubeState,
    pub heuristic: u8,
}

/// The 18 possible first moves, cheapest heuristic first so the best roots
/// land on distinct workers. The ordering is a pure function of the cube, so
/// repeated solves split identically.
pub(crate) fn enumerate_roots(
    cube: &CubeState,
    estimate: impl Fn(&CubeState) -> u8,
) -> Vec<Root> {
    ALL_MOVES
        .iter()
        .map(|&mv| {
            let mut turned = *cube;
            turned.rotate(mv.face, i32::from(mv.turns));
            let heuristic = estimate(&turned);
            Root {
                mv,
                cube: turned,
                heuristic,
            }
        })
        .sorted_by_key(|root| (root.heuristic, root.mv.face, root.mv.turns))
        .collect()
}

/// A finished solution offered by a worker.
pub(crate) struct Candidate {
    pub moves: Vec<Move>,
    pub worker: usize,
    pub order: u64,
}

/// The shared best-length gate plus the slot holding the winning sequence.
/// The gate only ever decreases; a stale read just delays a worker's abort.
pub(crate) struct BestGate {
    bound: AtomicUsize,
    slot: Mutex<Option<Candidate>>,
}

impl BestGate {
    pub fn new(initial_bound: usize) -> BestGate {
        BestGate {
            bound: AtomicUsize::new(initial_bound),
            slot: Mutex::new(None),
        }
    }

    pub fn bound(&self) -> usize {
        self.bound.load(Ordering::Relaxed)
    }

    /// Install `candidate` if it beats the current holder under the
    /// (length, worker id, discovery order) tiebreak.
    pub fn offer(&self, candidate: Candidate) {
        let mut slot = self.slot.lock().expect("gate mutex poisoned");
        let wins = match slot.as_ref() {
            None => true,
            Some(current) => {
                (candidate.moves.len(), candidate.worker, candidate.order)
                    < (current.moves.len(), current.worker, current.order)
            }
        };
        if wins {
            self.bound.fetch_min(candidate.moves.len(), Ordering::Relaxed);
            *slot = Some(candidate);
        }
    }

    pub fn into_solution(self) -> Option<Vec<Move>> {
        self.slot
            .into_inner()
            .expect("gate mutex poisoned")
            .map(|candidate| candidate.moves)
    }
}

/// Hand the sorted roots out round-robin and run one OS thread per worker.
/// Returns once every worker has finished or aborted against the gate.
pub(crate) fn run_workers(
    threads: usize,
    roots: Vec<Root>,
    worker: impl Fn(usize, &[Root]) + Sync,
) {
    let mut assigned: Vec<Vec<Root>> = (0..threads).map(|_| Vec::new()).collect();
    for (i, root) in roots.into_iter().enumerate() {
        assigned[i % threads].push(root);
    }
    thread::scope(|scope| {
        for (id, set) in assigned.iter().enumerate() {
            let worker = &worker;
            scope.spawn(move || worker(id, set.as_slice()));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use cube_core::Face;

    #[test]
    fn adjacency_rules_match_the_face_pairing() {
        // Same face never repeats.
        for f in 0..6 {
            assert!(!face_allowed(f, f));
        }
        // Opposite pairs explore only higher-index face first, then lower.
        assert!(!face_allowed(0, 1), "D must not follow U");
        assert!(face_allowed(1, 0), "U may follow D");
        assert!(!face_allowed(2, 3));
        assert!(face_allowed(3, 2));
        assert!(!face_allowed(4, 5));
        assert!(face_allowed(5, 4));
        // Unrelated faces are always fine.
        assert!(face_allowed(0, 2));
        assert!(face_allowed(NO_FACE, 0));
    }

    #[test]
    fn gate_prefers_shorter_then_lower_worker() {
        let gate = BestGate::new(32);
        let mv = Move::new(Face::Up, 1);
        gate.offer(Candidate {
            moves: vec![mv; 5],
            worker: 3,
            order: 0,
        });
        assert_eq!(gate.bound(), 5);
        gate.offer(Candidate {
            moves: vec![mv; 5],
            worker: 1,
            order: 9,
        });
        gate.offer(Candidate {
            moves: vec![mv; 7],
            worker: 0,
            order: 0,
        });
        assert_eq!(gate.bound(), 5);
        let winner = gate.into_solution().unwrap();
        assert_eq!(winner.len(), 5);
    }

    #[test]
    fn roots_cover_all_first_moves() {
        let cube = CubeState::SOLVED;
        let roots = enumerate_roots(&cube, |_| 0);
        assert_eq!(roots.len(), 18);
        let distinct: std::collections::HashSet<_> =
            roots.iter().map(|r| (r.mv.face, r.mv.turns)).collect();
        assert_eq!(distinct.len(), 18);
    }
}
