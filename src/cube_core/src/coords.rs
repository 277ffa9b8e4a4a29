//! Bijections between cube states and the small integers that index the
//! pruning tables, plus the per-coordinate move tables.

use crate::cube::{CubeState, Move, ALL_MOVES, SUBGROUP_MOVES};

pub const CORNER_ORIENT_COUNT: usize = 2187; // 3^7
pub const EDGE_ORIENT_COUNT: usize = 2048; // 2^11
pub const SLICE_PLACEMENT_COUNT: usize = 495; // C(12, 4)
pub const CORNER_PERM_COUNT: usize = 40_320; // 8!
pub const EDGE8_PERM_COUNT: usize = 40_320; // 8!
pub const SLICE_PERM_COUNT: usize = 24; // 4!
pub const EDGE_SIX_RANK_COUNT: usize = 665_280; // 12 * 11 * 10 * 9 * 8 * 7

const BINOMIAL: [[u32; 5]; 13] = {
    let mut c = [[0; 5]; 13];
    let mut n = 0;
    while n < 13 {
        c[n][0] = 1;
        let mut k = 1;
        while k < 5 {
            c[n][k] = if n == 0 {
                0
            } else {
                c[n - 1][k - 1] + c[n - 1][k]
            };
            k += 1;
        }
        n += 1;
    }
    c
};

/// Lehmer rank of a full permutation, identity ↦ 0.
fn rank_permutation(perm: &[u8]) -> usize {
    let n = perm.len();
    let mut rank = 0;
    for i in 0..n {
        let smaller = perm[..i].iter().filter(|&&x| x < perm[i]).count();
        rank = rank * (n - i) + perm[i] as usize - smaller;
    }
    rank
}

fn unrank_permutation(mut rank: usize, out: &mut [u8]) {
    let n = out.len();
    let mut digits = [0usize; 12];
    for i in (0..n).rev() {
        digits[i] = rank % (n - i);
        rank /= n - i;
    }
    let mut avail: Vec<u8> = (0..n as u8).collect();
    for i in 0..n {
        out[i] = avail.remove(digits[i]);
    }
}

/// Rank of an ordered placement of `pos.len()` distinct positions out of `n`.
fn rank_placement(pos: &[u8], n: usize) -> usize {
    let mut rank = 0;
    for i in 0..pos.len() {
        let smaller = pos[..i].iter().filter(|&&x| x < pos[i]).count();
        rank = rank * (n - i) + pos[i] as usize - smaller;
    }
    rank
}

fn unrank_placement(mut rank: usize, n: usize, out: &mut [u8]) {
    let k = out.len();
    let mut digits = [0usize; 6];
    for i in (0..k).rev() {
        digits[i] = rank % (n - i);
        rank /= n - i;
    }
    let mut avail: Vec<u8> = (0..n as u8).collect();
    for i in 0..k {
        out[i] = avail.remove(digits[i]);
    }
}

/// First seven corner twists, big-endian base 3. The eighth twist is fixed
/// by the mod-3 invariant.
#[must_use]
pub fn corner_orient(cube: &CubeState) -> usize {
    cube.co[..7]
        .iter()
        .fold(0, |acc, &o| acc * 3 + o as usize)
}

#[must_use]
pub fn decode_corner_orient(mut coord: usize) -> CubeState {
    debug_assert!(coord < CORNER_ORIENT_COUNT);
    let mut cube = CubeState::SOLVED;
    let mut sum = 0;
    for i in (0..7).rev() {
        cube.co[i] = (coord % 3) as u8;
        sum += coord % 3;
        coord /= 3;
    }
    cube.co[7] = ((3 - sum % 3) % 3) as u8;
    cube
}

/// First eleven edge flips, bit `i` = flip at position `i`. The twelfth flip
/// is fixed by the mod-2 invariant.
#[must_use]
pub fn edge_orient(cube: &CubeState) -> usize {
    cube.eo[..11]
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &o)| acc | (o as usize) << i)
}

#[must_use]
pub fn decode_edge_orient(coord: usize) -> CubeState {
    debug_assert!(coord < EDGE_ORIENT_COUNT);
    let mut cube = CubeState::SOLVED;
    let mut sum = 0;
    for i in 0..11 {
        cube.eo[i] = (coord >> i & 1) as u8;
        sum += coord >> i & 1;
    }
    cube.eo[11] = (sum % 2) as u8;
    cube
}

/// Which four positions hold the UD-slice edges, as a combinatorial rank
/// over the complemented position numbers so the solved placement is 0.
#[must_use]
pub fn slice_placement(cube: &CubeState) -> usize {
    let mut complements = [0u8; 4];
    let mut found = 0;
    for p in 0..12 {
        if cube.ep[p] >= 8 {
            complements[found] = 11 - p as u8;
            found += 1;
        }
    }
    complements.sort_unstable();
    complements
        .iter()
        .enumerate()
        .map(|(k, &q)| BINOMIAL[q as usize][k + 1] as usize)
        .sum()
}

#[must_use]
pub fn decode_slice_placement(mut coord: usize) -> CubeState {
    debug_assert!(coord < SLICE_PLACEMENT_COUNT);
    let mut positions = [0u8; 4];
    for k in (0..4).rev() {
        let v = (0..12)
            .rev()
            .find(|&v| BINOMIAL[v][k + 1] as usize <= coord)
            .expect("combinatorial rank in range");
        coord -= BINOMIAL[v][k + 1] as usize;
        positions[k] = 11 - v as u8;
    }
    positions.sort_unstable();

    let mut cube = CubeState::SOLVED;
    let mut slice = 8;
    let mut other = 0;
    for p in 0..12 {
        if positions.contains(&(p as u8)) {
            cube.ep[p] = slice;
            slice += 1;
        } else {
            cube.ep[p] = other;
            other += 1;
        }
    }
    cube
}

/// Lehmer rank of the corner permutation.
#[must_use]
pub fn corner_perm(cube: &CubeState) -> usize {
    rank_permutation(&cube.cp)
}

#[must_use]
pub fn decode_corner_perm(coord: usize) -> CubeState {
    debug_assert!(coord < CORNER_PERM_COUNT);
    let mut cube = CubeState::SOLVED;
    unrank_permutation(coord, &mut cube.cp);
    cube
}

/// Lehmer rank of the eight non-slice edges. Only meaningful for states in
/// the phase-2 subgroup, where those edges stay in the eight U/D positions.
#[must_use]
pub fn edge8_perm(cube: &CubeState) -> usize {
    debug_assert!(cube.ep[..8].iter().all(|&e| e < 8));
    rank_permutation(&cube.ep[..8])
}

#[must_use]
pub fn decode_edge8_perm(coord: usize) -> CubeState {
    debug_assert!(coord < EDGE8_PERM_COUNT);
    let mut cube = CubeState::SOLVED;
    unrank_permutation(coord, &mut cube.ep[..8]);
    cube
}

/// Lehmer rank of the four slice edges among their own positions. Only
/// meaningful for states in the phase-2 subgroup.
#[must_use]
pub fn slice_perm(cube: &CubeState) -> usize {
    debug_assert!(cube.ep[8..].iter().all(|&e| e >= 8));
    let perm = [
        cube.ep[8] - 8,
        cube.ep[9] - 8,
        cube.ep[10] - 8,
        cube.ep[11] - 8,
    ];
    rank_permutation(&perm)
}

#[must_use]
pub fn decode_slice_perm(coord: usize) -> CubeState {
    debug_assert!(coord < SLICE_PERM_COUNT);
    let mut perm = [0u8; 4];
    unrank_permutation(coord, &mut perm);
    let mut cube = CubeState::SOLVED;
    for (i, &e) in perm.iter().enumerate() {
        cube.ep[8 + i] = 8 + e;
    }
    cube
}

/// One of the two six-edge sets tracked by the KROF pattern databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSet {
    /// Edges UR, UF, UL, UB, DR, DF.
    First,
    /// Edges DL, DB, FR, FL, BL, BR.
    Last,
}

impl EdgeSet {
    fn base(self) -> u8 {
        match self {
            EdgeSet::First => 0,
            EdgeSet::Last => 6,
        }
    }
}

/// Placement rank of the tracked six edges plus their six flip bits,
/// bit `t` = flip of tracked edge `t`.
#[must_use]
pub fn edge_six(cube: &CubeState, set: EdgeSet) -> (usize, u8) {
    let base = set.base();
    let mut pos = [0u8; 6];
    let mut flips = 0u8;
    for p in 0..12 {
        let e = cube.ep[p];
        if e >= base && e < base + 6 {
            pos[(e - base) as usize] = p as u8;
            flips |= cube.eo[p] << (e - base);
        }
    }
    (rank_placement(&pos, 12), flips)
}

/// A representative state with the tracked edges at the ranked positions and
/// every orientation zero.
#[must_use]
pub fn decode_edge_six(rank: usize, set: EdgeSet) -> CubeState {
    debug_assert!(rank < EDGE_SIX_RANK_COUNT);
    let base = set.base();
    let mut pos = [0u8; 6];
    unrank_placement(rank, 12, &mut pos);

    let mut cube = CubeState::SOLVED;
    cube.ep = [u8::MAX; 12];
    for (t, &p) in pos.iter().enumerate() {
        cube.ep[p as usize] = base + t as u8;
    }
    let mut rest = (0..12u8).filter(|&e| e < base || e >= base + 6);
    for p in 0..12 {
        if cube.ep[p] == u8::MAX {
            cube.ep[p] = rest.next().expect("six untracked edges");
        }
    }
    cube
}

/// The four coordinates defined for every reachable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinates {
    pub corner_orient: u16,
    pub edge_orient: u16,
    pub slice_placement: u16,
    pub corner_perm: u16,
}

impl CubeState {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            corner_orient: corner_orient(self) as u16,
            edge_orient: edge_orient(self) as u16,
            slice_placement: slice_placement(self) as u16,
            corner_perm: corner_perm(self) as u16,
        }
    }
}

/// `next[c][m]` for one coordinate over one move set, tabulated once by
/// decoding a representative, turning it, and re-encoding.
pub struct MoveTable {
    moves: &'static [Move],
    coords: usize,
    data: Box<[u16]>,
}

impl MoveTable {
    fn build(
        coords: usize,
        moves: &'static [Move],
        encode: impl Fn(&CubeState) -> usize,
        decode: impl Fn(usize) -> CubeState,
    ) -> MoveTable {
        let mut data = vec![0u16; coords * moves.len()];
        for c in 0..coords {
            let repr = decode(c);
            for (mi, m) in moves.iter().enumerate() {
                let mut state = repr;
                state.rotate(m.face, i32::from(m.turns));
                data[c * moves.len() + mi] = encode(&state) as u16;
            }
        }
        MoveTable {
            moves,
            coords,
            data: data.into_boxed_slice(),
        }
    }

    #[must_use]
    pub fn next(&self, coord: usize, mv: usize) -> usize {
        self.data[coord * self.moves.len() + mv] as usize
    }

    #[must_use]
    pub fn moves(&self) -> &'static [Move] {
        self.moves
    }

    #[must_use]
    pub fn coord_count(&self) -> usize {
        self.coords
    }
}

/// The move tables for all six standard coordinates. The two subgroup
/// coordinates are not closed under the other eight moves, so their tables
/// carry the ten subgroup moves only.
pub struct MoveTables {
    pub corner_orient: MoveTable,
    pub edge_orient: MoveTable,
    pub slice_placement: MoveTable,
    pub corner_perm: MoveTable,
    pub edge8_perm: MoveTable,
    pub slice_perm: MoveTable,
}

impl MoveTables {
    #[must_use]
    pub fn build() -> MoveTables {
        MoveTables {
            corner_orient: MoveTable::build(
                CORNER_ORIENT_COUNT,
                &ALL_MOVES,
                corner_orient,
                decode_corner_orient,
            ),
            edge_orient: MoveTable::build(
                EDGE_ORIENT_COUNT,
                &ALL_MOVES,
                edge_orient,
                decode_edge_orient,
            ),
            slice_placement: MoveTable::build(
                SLICE_PLACEMENT_COUNT,
                &ALL_MOVES,
                slice_placement,
                decode_slice_placement,
            ),
            corner_perm: MoveTable::build(
                CORNER_PERM_COUNT,
                &ALL_MOVES,
                corner_perm,
                decode_corner_perm,
            ),
            edge8_perm: MoveTable::build(
                EDGE8_PERM_COUNT,
                &SUBGROUP_MOVES,
                edge8_perm,
                decode_edge8_perm,
            ),
            slice_perm: MoveTable::build(
                SLICE_PERM_COUNT,
                &SUBGROUP_MOVES,
                slice_perm,
                decode_slice_perm,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::{parse_moves, Face};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    fn random_state(rng: &mut Pcg64, moves: &[Move], length: usize) -> CubeState {
        let mut cube = CubeState::SOLVED;
        for _ in 0..length {
            let m = moves[rng.gen_range(0..moves.len())];
            cube.rotate(m.face, i32::from(m.turns));
        }
        cube
    }

    #[test]
    fn solved_state_encodes_to_zero() {
        let c = CubeState::SOLVED.coordinates();
        assert_eq!(
            (c.corner_orient, c.edge_orient, c.slice_placement, c.corner_perm),
            (0, 0, 0, 0)
        );
        assert_eq!(edge8_perm(&CubeState::SOLVED), 0);
        assert_eq!(slice_perm(&CubeState::SOLVED), 0);
        assert_eq!(edge_six(&CubeState::SOLVED, EdgeSet::First), (0, 0));
    }

    #[test]
    fn corner_orient_is_a_bijection() {
        for c in 0..CORNER_ORIENT_COUNT {
            let state = decode_corner_orient(c);
            assert_eq!(state.validate(), Ok(()));
            assert_eq!(corner_orient(&state), c);
        }
    }

    #[test]
    fn edge_orient_is_a_bijection() {
        for c in 0..EDGE_ORIENT_COUNT {
            let state = decode_edge_orient(c);
            assert_eq!(state.validate(), Ok(()));
            assert_eq!(edge_orient(&state), c);
        }
    }

    #[test]
    fn slice_placement_is_a_bijection() {
        for c in 0..SLICE_PLACEMENT_COUNT {
            assert_eq!(slice_placement(&decode_slice_placement(c)), c);
        }
    }

    #[test]
    fn corner_perm_is_a_bijection() {
        for c in 0..CORNER_PERM_COUNT {
            assert_eq!(corner_perm(&decode_corner_perm(c)), c);
        }
    }

    #[test]
    fn edge8_perm_is_a_bijection() {
        for c in 0..EDGE8_PERM_COUNT {
            assert_eq!(edge8_perm(&decode_edge8_perm(c)), c);
        }
    }

    #[test]
    fn slice_perm_is_a_bijection() {
        for c in 0..SLICE_PERM_COUNT {
            assert_eq!(slice_perm(&decode_slice_perm(c)), c);
        }
    }

    #[test]
    fn edge_six_rank_is_a_bijection() {
        for set in [EdgeSet::First, EdgeSet::Last] {
            for rank in (0..EDGE_SIX_RANK_COUNT).step_by(7) {
                assert_eq!(edge_six(&decode_edge_six(rank, set), set), (rank, 0));
            }
        }
    }

    #[test]
    fn encoding_survives_scrambling() {
        let mut rng = Pcg64::seed_from_u64(0xC0DE);
        for _ in 0..100 {
            let cube = random_state(&mut rng, &ALL_MOVES, 25);
            let c = cube.coordinates();
            assert_eq!(
                corner_orient(&decode_corner_orient(c.corner_orient as usize)),
                c.corner_orient as usize
            );
            assert_eq!(
                decode_corner_perm(c.corner_perm as usize).cp,
                cube.cp,
                "corner permutation decodes back to the same arrangement"
            );
            assert_eq!(
                slice_placement(&decode_slice_placement(c.slice_placement as usize)),
                c.slice_placement as usize
            );
        }
    }

    #[test]
    fn move_tables_track_real_rotations() {
        let tables = MoveTables::build();
        let mut rng = Pcg64::seed_from_u64(7);
        for _ in 0..50 {
            let cube = random_state(&mut rng, &ALL_MOVES, 20);
            for (mi, m) in ALL_MOVES.iter().enumerate() {
                let mut turned = cube;
                turned.rotate(m.face, i32::from(m.turns));
                assert_eq!(
                    tables.corner_orient.next(corner_orient(&cube), mi),
                    corner_orient(&turned)
                );
                assert_eq!(
                    tables.edge_orient.next(edge_orient(&cube), mi),
                    edge_orient(&turned)
                );
                assert_eq!(
                    tables.slice_placement.next(slice_placement(&cube), mi),
                    slice_placement(&turned)
                );
                assert_eq!(
                    tables.corner_perm.next(corner_perm(&cube), mi),
                    corner_perm(&turned)
                );
            }
        }
    }

    #[test]
    fn subgroup_move_tables_track_subgroup_states() {
        let tables = MoveTables::build();
        let mut rng = Pcg64::seed_from_u64(11);
        for _ in 0..50 {
            let cube = random_state(&mut rng, &SUBGROUP_MOVES, 20);
            for (mi, m) in SUBGROUP_MOVES.iter().enumerate() {
                let mut turned = cube;
                turned.rotate(m.face, i32::from(m.turns));
                assert_eq!(
                    tables.edge8_perm.next(edge8_perm(&cube), mi),
                    edge8_perm(&turned)
                );
                assert_eq!(
                    tables.slice_perm.next(slice_perm(&cube), mi),
                    slice_perm(&turned)
                );
            }
        }
    }

    #[test]
    fn slice_placement_counts_turns_that_disturb_the_slice() {
        let mut cube = CubeState::SOLVED;
        cube.apply(&parse_moves("U").unwrap());
        assert_eq!(slice_placement(&cube), 0, "U keeps the slice in place");
        let mut cube = CubeState::SOLVED;
        cube.rotate(Face::Right, 1);
        assert_ne!(slice_placement(&cube), 0, "R pulls two slice edges out");
    }
}
