//! Two-phase search: bring the cube into ⟨U, D, L2, R2, F2, B2⟩, finish it
//! inside the subgroup, and keep improving until no shorter total is
//! possible.

use crate::pruning::KociembaTables;
use crate::search::{enumerate_roots, face_allowed, run_workers, BestGate, Candidate, NO_FACE};
use crate::{start, success};
use cube_core::{canonicalize, CubeState, Face, Move};
use log::{debug, info};
use std::time::Instant;

/// Diameter of the phase-1 coset space; no root needs a deeper phase 1.
const MAX_PHASE1_DEPTH: usize = 12;
/// Diameter of the phase-2 subgroup.
const MAX_PHASE2_DEPTH: usize = 18;
const INITIAL_BOUND: usize = 32;

pub(crate) fn solve(tables: &KociembaTables, cube: CubeState, threads: usize) -> Vec<Move> {
    if cube.is_solved() {
        return Vec::new();
    }
    info!(start!("Kociemba: solving"));
    let solve_start = Instant::now();
    let gate = BestGate::new(INITIAL_BOUND);

    // A cube already inside the subgroup has the empty phase 1 as a
    // baseline; workers then only compete with longer phase-1 prefixes.
    if tables.phase1_estimate(&cube) == 0 {
        if let Some(moves) = phase2_only(tables, cube) {
            gate.offer(Candidate {
                moves,
                worker: threads,
                order: 0,
            });
        }
    }

    let roots = enumerate_roots(&cube, |c| tables.phase1_estimate(c));
    run_workers(threads, roots, |worker, assigned| {
        let mut search = Phase1Search {
            tables,
            gate: &gate,
            worker,
            order: 0,
            path: Vec::with_capacity(MAX_PHASE1_DEPTH + MAX_PHASE2_DEPTH),
        };
        for depth in 1..=MAX_PHASE1_DEPTH {
            // Strictly greater: depth == bound can still tie the incumbent
            // and win on worker id, which keeps repeated runs reproducible.
            if depth > search.gate.bound() {
                break;
            }
            for root in assigned {
                search.path.clear();
                search.path.push(root.mv);
                search.phase1(root.cube, root.mv.face as u8, depth - 1);
            }
            debug!("worker {worker}: phase-1 depth {depth} exhausted");
        }
    });

    let solution = gate
        .into_solution()
        .expect("two-phase search always publishes a solution");
    info!(
        success!("Kociemba: {} moves in {:.3}s"),
        solution.len(),
        solve_start.elapsed().as_secs_f64()
    );
    solution
}

struct Phase1Search<'a> {
    tables: &'a KociembaTables,
    gate: &'a BestGate,
    worker: usize,
    order: u64,
    path: Vec<Move>,
}

impl Phase1Search<'_> {
    /// Depth-limited DFS over phase-1 space. Every leaf that lands in the
    /// subgroup at exactly the target depth gets a phase-2 attempt.
    fn phase1(&mut self, cube: CubeState, previous: u8, togo: usize) {
        // Nothing below this node can match the published best.
        if self.gate.bound() < self.path.len() + togo {
            return;
        }
        let estimate = self.tables.phase1_estimate(&cube);
        if togo == 0 {
            // A phase-1 solution ending inside the subgroup is a shorter
            // phase-1 solution already handled at a smaller depth.
            if estimate == 0 && !self.path.last().expect("root move committed").in_subgroup() {
                self.phase2_attempt(cube);
            }
            return;
        }
        if usize::from(estimate) > togo {
            return;
        }
        for f in 0..6 {
            if !face_allowed(previous, f) {
                continue;
            }
            let face = Face::ALL[f as usize];
            let mut turned = cube;
            for turns in 1..=3 {
                turned.rotate(face, 1);
                self.path.push(Move::new(face, turns));
                self.phase1(turned, f, togo - 1);
                self.path.pop();
            }
        }
    }

    fn phase2_attempt(&mut self, cube: CubeState) {
        let phase1_length = self.path.len();
        let budget = self
            .gate
            .bound()
            .saturating_sub(phase1_length)
            .min(MAX_PHASE2_DEPTH);
        let estimate = usize::from(self.tables.phase2_estimate(&cube));
        if estimate > budget {
            return;
        }
        let seam = self.path.last().expect("root move committed").face as u8;
        let mut tail = Vec::with_capacity(budget);
        for depth in estimate..=budget {
            if phase2_dfs(self.tables, cube, seam, depth, &mut tail) {
                let mut moves = self.path.clone();
                moves.extend_from_slice(&tail);
                self.order += 1;
                self.gate.offer(Candidate {
                    moves: canonicalize(&moves),
                    worker: self.worker,
                    order: self.order,
                });
                return;
            }
        }
    }
}

/// Solve a cube that is already inside the subgroup.
fn phase2_only(tables: &KociembaTables, cube: CubeState) -> Option<Vec<Move>> {
    let mut path = Vec::with_capacity(MAX_PHASE2_DEPTH);
    for depth in usize::from(tables.phase2_estimate(&cube))..=MAX_PHASE2_DEPTH {
        if phase2_dfs(tables, cube, NO_FACE, depth, &mut path) {
            return Some(path);
        }
    }
    None
}

/// Depth-limited DFS over the ten subgroup moves. On success the solving
/// tail is left in `path`.
fn phase2_dfs(
    tables: &KociembaTables,
    cube: CubeState,
    previous: u8,
    togo: usize,
    path: &mut Vec<Move>,
) -> bool {
    if togo == 0 {
        return cube.is_solved();
    }
    if usize::from(tables.phase2_estimate(&cube)) > togo {
        return false;
    }
    for f in 0..6 {
        if !face_allowed(previous, f) {
            continue;
        }
        let face = Face::ALL[f as usize];
        if f < 2 {
            let mut turned = cube;
            for turns in 1..=3 {
                turned.rotate(face, 1);
                path.push(Move::new(face, turns));
                if phase2_dfs(tables, turned, f, togo - 1, path) {
                    return true;
                }
                path.pop();
            }
        } else {
            let mut turned = cube;
            turned.rotate(face, 2);
            path.push(Move::new(face, 2));
            if phase2_dfs(tables, turned, f, togo - 1, path) {
                return true;
            }
            path.pop();
        }
    }
    false
}
