//! Single-phase IDA* over the full move set, guided by the corner database
//! and the two six-edge databases.

use crate::pruning::KrofTables;
use crate::search::{enumerate_roots, face_allowed, run_workers, BestGate, Candidate};
use crate::{start, success};
use cube_core::{CubeState, Face, Move};
use log::{debug, info};
use std::time::Instant;

/// A whole cube solves in 20; a worker with a committed first move may need
/// one more.
const MAX_DEPTH: usize = 21;

pub(crate) fn solve(tables: &KrofTables, cube: CubeState, threads: usize) -> Vec<Move> {
    if cube.is_solved() {
        return Vec::new();
    }
    info!(start!("KROF: solving"));
    let solve_start = Instant::now();
    let gate = BestGate::new(MAX_DEPTH + 1);

    let roots = enumerate_roots(&cube, |c| tables.estimate(c));
    run_workers(threads, roots, |worker, assigned| {
        let mut path = Vec::with_capacity(MAX_DEPTH);
        let mut order = 0;
        'deepening: for depth in 1..=MAX_DEPTH {
            // Strictly greater: a bound equal to the incumbent length can
            // still win the worker-id tiebreak, keeping results reproducible.
            if depth > gate.bound() {
                break;
            }
            for root in assigned {
                path.clear();
                path.push(root.mv);
                if dfs(tables, &gate, root.cube, root.mv.face as u8, depth - 1, depth, &mut path) {
                    // The first hit at the lowest bound is this worker's
                    // optimum over its roots; deeper bounds cannot improve.
                    order += 1;
                    gate.offer(Candidate {
                        moves: path.clone(),
                        worker,
                        order,
                    });
                    break 'deepening;
                }
            }
            debug!("worker {worker}: bound {depth} exhausted");
        }
    });

    let solution = gate
        .into_solution()
        .expect("iterative deepening always reaches the solved state");
    info!(
        success!("KROF: {} moves in {:.3}s"),
        solution.len(),
        solve_start.elapsed().as_secs_f64()
    );
    solution
}

fn dfs(
    tables: &KrofTables,
    gate: &BestGate,
    cube: CubeState,
    previous: u8,
    togo: usize,
    target: usize,
    path: &mut Vec<Move>,
) -> bool {
    if togo == 0 {
        return cube.is_solved();
    }
    // Another worker finishing below our bound makes this iteration moot;
    // only poll the gate in the upper tree.
    if togo >= 4 && gate.bound() < target {
        return false;
    }
    if usize::from(tables.estimate(&cube)) > togo {
        return false;
    }
    for f in 0..6 {
        if !face_allowed(previous, f) {
            continue;
        }
        let face = Face::ALL[f as usize];
        let mut turned = cube;
        for turns in 1..=3 {
            turned.rotate(face, 1);
            path.push(Move::new(face, turns));
            if dfs(tables, gate, turned, f, togo - 1, target, path) {
                return true;
            }
            path.pop();
        }
    }
    false
}
