use cube_core::{parse_moves, CubeState, Face, MalformedCube, Move};
use itertools::Itertools;
use solver::{new_solver, Kociemba, Krof, SolveError, Solver, TableLoadError};
use std::path::PathBuf;
use std::sync::OnceLock;

const DEEP_SCRAMBLE: &str = "R U F2 D' L B2 U2 R' F D2 B L' D R2 B' U L2 F' R B2";

static SHARED: OnceLock<Kociemba> = OnceLock::new();

/// Most tests share one initialized two-phase solver; building its tables
/// once keeps the suite fast.
fn shared_solver() -> &'static Kociemba {
    SHARED.get_or_init(|| {
        let mut solver = Kociemba::new(2).expect("2 threads is a valid configuration");
        solver.init();
        solver
    })
}

fn scrambled(moves: &str) -> CubeState {
    let mut cube = CubeState::SOLVED;
    cube.apply(&parse_moves(moves).expect("test scrambles parse"));
    cube
}

fn assert_solves(cube: CubeState, solution: &[Move]) {
    let mut check = cube;
    check.apply(solution);
    assert!(check.is_solved(), "solution must restore the cube");
    for (a, b) in solution.iter().tuple_windows() {
        assert_ne!(a.face, b.face, "consecutive moves must not share a face");
    }
    assert!(solution.iter().all(|m| (1..=3).contains(&m.turns)));
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{name}-{}.tables", std::process::id()))
}

#[test_log::test]
fn solved_cube_yields_empty_solution() {
    let solution = shared_solver().solve(CubeState::SOLVED).unwrap();
    assert!(solution.is_empty());
}

#[test_log::test]
fn single_turn_yields_its_inverse() {
    let solution = shared_solver().solve(scrambled("R")).unwrap();
    assert_eq!(solution, vec![Move::new(Face::Right, 3)]);

    let solution = shared_solver().solve(scrambled("U2")).unwrap();
    assert_eq!(solution, vec![Move::new(Face::Up, 2)]);
}

#[test_log::test]
fn two_turns_unwind_in_reverse_order() {
    let solution = shared_solver().solve(scrambled("R U")).unwrap();
    assert_eq!(
        solution,
        vec![Move::new(Face::Up, 3), Move::new(Face::Right, 3)]
    );
}

#[test_log::test]
fn deep_scramble_solves_within_the_two_phase_bound() {
    let cube = scrambled(DEEP_SCRAMBLE);
    let solution = shared_solver().solve(cube).unwrap();
    assert_solves(cube, &solution);
    assert!(
        solution.len() <= 24,
        "two-phase result of {} moves exceeds 24",
        solution.len()
    );
}

#[test_log::test]
fn subgroup_scramble_solves_without_phase_1() {
    let cube = scrambled("U D2 R2 F2 U' L2 B2 D");
    let solution = shared_solver().solve(cube).unwrap();
    assert_solves(cube, &solution);
}

#[test_log::test]
fn twisted_corner_is_rejected() {
    let solved = CubeState::SOLVED;
    let mut co = *solved.corner_orient();
    co[0] = 1;
    let cube =
        CubeState::from_parts(*solved.corner_perm(), co, *solved.edge_perm(), *solved.edge_orient());
    assert_eq!(
        shared_solver().solve(cube),
        Err(SolveError::Malformed(MalformedCube::CornerTwist))
    );
}

#[test_log::test]
fn swapped_corners_are_rejected() {
    let mut cp = *CubeState::SOLVED.corner_perm();
    cp.swap(0, 3);
    let cube = CubeState::from_parts(
        cp,
        *CubeState::SOLVED.corner_orient(),
        *CubeState::SOLVED.edge_perm(),
        *CubeState::SOLVED.edge_orient(),
    );
    assert_eq!(
        shared_solver().solve(cube),
        Err(SolveError::Malformed(MalformedCube::PermutationParity))
    );
}

#[test_log::test]
fn repeated_solves_are_deterministic() {
    let cube = scrambled("L2 B U' R F2 D B2 U2 L F'");
    let first = shared_solver().solve(cube).unwrap();
    let second = shared_solver().solve(cube).unwrap();
    assert_eq!(first, second);
}

#[test_log::test]
fn every_thread_count_solves_correctly() {
    let cube = scrambled("F R' U2 L D' B R2 U");
    for threads in [1, 4] {
        let mut solver = Kociemba::new(threads).unwrap();
        solver.init();
        let solution = solver.solve(cube).unwrap();
        assert_solves(cube, &solution);
        let again = solver.solve(cube).unwrap();
        assert_eq!(solution, again, "fixed thread count stays deterministic");
    }
}

#[test_log::test]
fn tables_round_trip_through_disk() {
    let path = temp_path("kociemba-roundtrip");
    shared_solver().save(&path).unwrap();

    let mut reloaded = Kociemba::new(2).unwrap();
    reloaded.init_from(&path).unwrap();

    let cube = scrambled("B2 D R' F L2 U' B R");
    assert_eq!(
        shared_solver().solve(cube).unwrap(),
        reloaded.solve(cube).unwrap(),
        "loaded tables must behave exactly like built ones"
    );

    let second_path = temp_path("kociemba-roundtrip-copy");
    reloaded.save(&second_path).unwrap();
    assert_eq!(
        std::fs::read(&path).unwrap(),
        std::fs::read(&second_path).unwrap(),
        "save-load-save must be bit-identical"
    );
    std::fs::remove_file(&path).unwrap();
    std::fs::remove_file(&second_path).unwrap();
}

#[test_log::test]
fn loading_a_truncated_file_fails_cleanly() {
    let path = temp_path("kociemba-truncated");
    shared_solver().save(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let mut solver = Kociemba::new(1).unwrap();
    assert!(matches!(
        solver.init_from(&path),
        Err(TableLoadError::Truncated)
    ));
    // The failed load must leave the build fallback intact.
    solver.init();
    let cube = scrambled("R U'");
    assert_solves(cube, &solver.solve(cube).unwrap());
    std::fs::remove_file(&path).unwrap();
}

#[test_log::test]
fn mismatched_magic_is_rejected_by_the_other_loader() {
    let path = temp_path("magic-crossover");
    shared_solver().save(&path).unwrap();
    let mut krof = Krof::new(1).unwrap();
    assert!(matches!(
        krof.init_from(&path),
        Err(TableLoadError::BadMagic)
    ));
    std::fs::remove_file(&path).unwrap();
}

#[test_log::test]
fn factory_surface_matches_the_algorithms() {
    let solver = new_solver("kociemba", 2).unwrap();
    let solution = solver.solve(scrambled("R")).unwrap();
    assert_eq!(solution, vec![Move::new(Face::Right, 3)]);
}

#[test_log::test]
#[ignore = "builds the 87 MB KROF pattern databases"]
fn krof_finds_minimal_solutions() {
    let mut solver = Krof::new(4).unwrap();
    solver.init();

    assert!(solver.solve(CubeState::SOLVED).unwrap().is_empty());

    let solution = solver.solve(scrambled("R")).unwrap();
    assert_eq!(solution, vec![Move::new(Face::Right, 3)]);

    // The optimum can never exceed the scramble length (and 20 is the
    // ceiling for any position).
    let cube = scrambled("R U F' D2 L' B U2 R' F L2");
    let solution = solver.solve(cube).unwrap();
    assert_solves(cube, &solution);
    assert!(solution.len() <= 10);

    let deeper = scrambled("D L2 F R' B2 U L D2 R F' U2 B L'");
    let optimal = solver.solve(deeper).unwrap();
    assert_solves(deeper, &optimal);
    assert!(optimal.len() <= 13);
}

#[test_log::test]
#[ignore = "builds the 87 MB KROF pattern databases"]
fn krof_tables_round_trip_through_disk() {
    let mut solver = Krof::new(4).unwrap();
    solver.init();
    let cube = scrambled("B D' R2 F U L' D2 B'");
    let built = solver.solve(cube).unwrap();

    let path = temp_path("krof-roundtrip");
    solver.save(&path).unwrap();
    let mut reloaded = Krof::new(4).unwrap();
    reloaded.init_from(&path).unwrap();
    assert_eq!(built, reloaded.solve(cube).unwrap());
    std::fs::remove_file(&path).unwrap();
}
