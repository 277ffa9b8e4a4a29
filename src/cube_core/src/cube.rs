use itertools::Itertools;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The six faces, in the fixed index order used everywhere in the engine.
/// Opposite faces pair up as (Up, Down), (Front, Back), (Left, Right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Face {
    Up = 0,
    Down = 1,
    Front = 2,
    Back = 3,
    Left = 4,
    Right = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Up,
        Face::Down,
        Face::Front,
        Face::Back,
        Face::Left,
        Face::Right,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn opposite(self) -> Face {
        Face::ALL[self.index() ^ 1]
    }

    #[must_use]
    pub fn letter(self) -> char {
        b"UDFBLR"[self.index()] as char
    }
}

/// A clockwise face turn. `turns` is always in `{1, 2, 3}` quarter turns;
/// identity rotations are not representable as a `Move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub face: Face,
    pub turns: u8,
}

impl Move {
    #[must_use]
    pub fn new(face: Face, turns: u8) -> Move {
        debug_assert!((1..=3).contains(&turns));
        Move { face, turns }
    }

    #[must_use]
    pub fn inverse(self) -> Move {
        Move {
            face: self.face,
            turns: 4 - self.turns,
        }
    }

    /// Whether this move stays inside the ⟨U, D, L², R², F², B²⟩ subgroup.
    #[must_use]
    pub fn in_subgroup(self) -> bool {
        self.face.index() < 2 || self.turns == 2
    }
}

/// All 18 face moves, face-major, quarter turns ascending.
pub const ALL_MOVES: [Move; 18] = {
    let mut moves = [Move {
        face: Face::Up,
        turns: 1,
    }; 18];
    let mut f = 0;
    while f < 6 {
        let mut t = 1;
        while t <= 3 {
            moves[f * 3 + t - 1] = Move {
                face: Face::ALL[f],
                turns: t as u8,
            };
            t += 1;
        }
        f += 1;
    }
    moves
};

/// The ten moves of the phase-2 subgroup, in `ALL_MOVES` order.
pub const SUBGROUP_MOVES: [Move; 10] = [
    Move { face: Face::Up, turns: 1 },
    Move { face: Face::Up, turns: 2 },
    Move { face: Face::Up, turns: 3 },
    Move { face: Face::Down, turns: 1 },
    Move { face: Face::Down, turns: 2 },
    Move { face: Face::Down, turns: 3 },
    Move { face: Face::Front, turns: 2 },
    Move { face: Face::Back, turns: 2 },
    Move { face: Face::Left, turns: 2 },
    Move { face: Face::Right, turns: 2 },
];

/// A cube as permutation plus orientation vectors over the 8 corner and 12
/// edge positions. `cp[i]` names the corner cubie sitting at position `i`,
/// `co[i]` its clockwise twist; likewise `ep`/`eo` for edges.
///
/// Corner positions 0–7: URF, UFL, ULB, UBR, DFR, DLF, DBL, DRB.
/// Edge positions 0–11: UR, UF, UL, UB, DR, DF, DL, DB, FR, FL, BL, BR.
/// The UD-slice edges are FR, FL, BL, BR (ids 8–11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubeState {
    pub(crate) cp: [u8; 8],
    pub(crate) co: [u8; 8],
    pub(crate) ep: [u8; 12],
    pub(crate) eo: [u8; 12],
}

/// Quarter-turn generators in `Face` order, as cubie permutations with the
/// Singmaster orientation updates (U/D leave corner twist alone, the other
/// four add 1/2 alternating around their corner cycle; F/B flip the four
/// edges they move).
const GENERATORS: [CubeState; 6] = [
    // U: corners URF→UFL→ULB→UBR, edges UR→UF→UL→UB
    CubeState {
        cp: [3, 0, 1, 2, 4, 5, 6, 7],
        co: [0; 8],
        ep: [3, 0, 1, 2, 4, 5, 6, 7, 8, 9, 10, 11],
        eo: [0; 12],
    },
    // D: corners DLF→DFR→DRB→DBL, edges DF→DR→DB→DL
    CubeState {
        cp: [0, 1, 2, 3, 5, 6, 7, 4],
        co: [0; 8],
        ep: [0, 1, 2, 3, 5, 6, 7, 4, 8, 9, 10, 11],
        eo: [0; 12],
    },
    // F: corners UFL→URF→DFR→DLF, edges UF→FR→DF→FL, flipping each
    CubeState {
        cp: [1, 5, 2, 3, 0, 4, 6, 7],
        co: [1, 2, 0, 0, 2, 1, 0, 0],
        ep: [0, 9, 2, 3, 4, 8, 6, 7, 1, 5, 10, 11],
        eo: [0, 1, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0],
    },
    // B: corners UBR→ULB→DBL→DRB, edges UB→BL→DB→BR, flipping each
    CubeState {
        cp: [0, 1, 3, 7, 4, 5, 2, 6],
        co: [0, 0, 1, 2, 0, 0, 2, 1],
        ep: [0, 1, 2, 11, 4, 5, 6, 10, 8, 9, 3, 7],
        eo: [0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 1],
    },
    // L: corners UFL→DLF→DBL→ULB, edges UL→FL→DL→BL
    CubeState {
        cp: [0, 2, 6, 3, 4, 1, 5, 7],
        co: [0, 1, 2, 0, 0, 2, 1, 0],
        ep: [0, 1, 10, 3, 4, 5, 9, 7, 8, 2, 6, 11],
        eo: [0; 12],
    },
    // R: corners DFR→URF→UBR→DRB, edges UR→BR→DR→FR
    CubeState {
        cp: [4, 1, 2, 0, 7, 5, 6, 3],
        co: [2, 0, 0, 1, 1, 0, 0, 2],
        ep: [8, 1, 2, 3, 11, 5, 6, 7, 4, 9, 10, 0],
        eo: [0; 12],
    },
];

impl Default for CubeState {
    fn default() -> Self {
        CubeState::SOLVED
    }
}

impl CubeState {
    pub const SOLVED: CubeState = CubeState {
        cp: [0, 1, 2, 3, 4, 5, 6, 7],
        co: [0; 8],
        ep: [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        eo: [0; 12],
    };

    /// Build a state from raw cubie vectors without validation; call
    /// [`CubeState::validate`] before trusting the result.
    #[must_use]
    pub fn from_parts(cp: [u8; 8], co: [u8; 8], ep: [u8; 12], eo: [u8; 12]) -> CubeState {
        CubeState { cp, co, ep, eo }
    }

    #[must_use]
    pub fn corner_perm(&self) -> &[u8; 8] {
        &self.cp
    }

    #[must_use]
    pub fn corner_orient(&self) -> &[u8; 8] {
        &self.co
    }

    #[must_use]
    pub fn edge_perm(&self) -> &[u8; 12] {
        &self.ep
    }

    #[must_use]
    pub fn edge_orient(&self) -> &[u8; 12] {
        &self.eo
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        *self == CubeState::SOLVED
    }

    /// `self` followed by `other`: the state reached by performing `other`'s
    /// rearrangement on top of `self`.
    #[must_use]
    pub fn compose(&self, other: &CubeState) -> CubeState {
        let mut out = CubeState::SOLVED;
        for i in 0..8 {
            let from = other.cp[i] as usize;
            out.cp[i] = self.cp[from];
            out.co[i] = (self.co[from] + other.co[i]) % 3;
        }
        for i in 0..12 {
            let from = other.ep[i] as usize;
            out.ep[i] = self.ep[from];
            out.eo[i] = self.eo[from] ^ other.eo[i];
        }
        out
    }

    /// The state that composes with `self` to the identity.
    #[must_use]
    pub fn inverse(&self) -> CubeState {
        let mut out = CubeState::SOLVED;
        for i in 0..8 {
            out.cp[self.cp[i] as usize] = i as u8;
            out.co[self.cp[i] as usize] = (3 - self.co[i]) % 3;
        }
        for i in 0..12 {
            out.ep[self.ep[i] as usize] = i as u8;
            out.eo[self.ep[i] as usize] = self.eo[i];
        }
        out
    }

    /// Turn `face` clockwise by `turns` quarter turns. Any integer is
    /// accepted; the count is reduced mod 4 and 0 is the identity.
    pub fn rotate(&mut self, face: Face, turns: i32) {
        for _ in 0..turns.rem_euclid(4) {
            self.rotate_quarter(face);
        }
    }

    fn rotate_quarter(&mut self, face: Face) {
        *self = self.compose(&GENERATORS[face.index()]);
    }

    pub fn apply(&mut self, moves: &[Move]) {
        for m in moves {
            self.rotate(m.face, i32::from(m.turns));
        }
    }

    /// Check the cubie-level well-formedness and parity invariants that every
    /// reachable cube satisfies.
    ///
    /// # Errors
    ///
    /// The first violated invariant, as a [`MalformedCube`].
    pub fn validate(&self) -> Result<(), MalformedCube> {
        let mut seen = [false; 8];
        for &c in &self.cp {
            if c >= 8 || std::mem::replace(&mut seen[c as usize], true) {
                return Err(MalformedCube::CornerPermutation);
            }
        }
        let mut seen = [false; 12];
        for &e in &self.ep {
            if e >= 12 || std::mem::replace(&mut seen[e as usize], true) {
                return Err(MalformedCube::EdgePermutation);
            }
        }
        if self.co.iter().any(|&o| o >= 3) || self.co.iter().map(|&o| u32::from(o)).sum::<u32>() % 3 != 0
        {
            return Err(MalformedCube::CornerTwist);
        }
        if self.eo.iter().any(|&o| o >= 2) || self.eo.iter().map(|&o| u32::from(o)).sum::<u32>() % 2 != 0
        {
            return Err(MalformedCube::EdgeFlip);
        }
        if permutation_parity(&self.cp) != permutation_parity(&self.ep) {
            return Err(MalformedCube::PermutationParity);
        }
        Ok(())
    }
}

fn permutation_parity(perm: &[u8]) -> u8 {
    let mut parity = 0;
    for i in 0..perm.len() {
        for j in i + 1..perm.len() {
            if perm[i] > perm[j] {
                parity ^= 1;
            }
        }
    }
    parity
}

/// A cube state that no sequence of face turns can produce.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedCube {
    #[error("corner positions do not hold each corner cubie exactly once")]
    CornerPermutation,
    #[error("edge positions do not hold each edge cubie exactly once")]
    EdgePermutation,
    #[error("corner twists do not sum to 0 mod 3")]
    CornerTwist,
    #[error("edge flips do not sum to 0 mod 2")]
    EdgeFlip,
    #[error("corner and edge permutation parities disagree")]
    PermutationParity,
    #[error("facelet grid names an impossible corner at position {0}")]
    UnrecognizedCorner(usize),
    #[error("facelet grid names an impossible edge at position {0}")]
    UnrecognizedEdge(usize),
    #[error("facelet grid center {0} does not match its face")]
    CenterMismatch(usize),
}

/// Fold every run of same-face moves into one move mod 4, dropping identity
/// results. The output never has two consecutive moves on the same face.
#[must_use]
pub fn canonicalize(moves: &[Move]) -> Vec<Move> {
    let mut out: Vec<Move> = Vec::with_capacity(moves.len());
    for &m in moves {
        if let Some(last) = out.last().copied() {
            if last.face == m.face {
                let turns = (last.turns + m.turns) % 4;
                out.pop();
                if turns != 0 {
                    out.push(Move::new(last.face, turns));
                }
                continue;
            }
        }
        out.push(m);
    }
    out
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.face.letter())?;
        match self.turns {
            1 => Ok(()),
            2 => write!(f, "2"),
            _ => write!(f, "'"),
        }
    }
}

/// A token that is not a face turn in standard notation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized move {0:?}")]
pub struct ParseMoveError(pub String);

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMoveError(s.to_owned());
        let mut chars = s.chars();
        let face = match chars.next().ok_or_else(err)? {
            'U' => Face::Up,
            'D' => Face::Down,
            'F' => Face::Front,
            'B' => Face::Back,
            'L' => Face::Left,
            'R' => Face::Right,
            _ => return Err(err()),
        };
        let turns = match chars.as_str() {
            "" => 1,
            "2" => 2,
            "'" | "3" => 3,
            _ => return Err(err()),
        };
        Ok(Move::new(face, turns))
    }
}

/// Parse a whitespace-separated scramble in standard notation.
///
/// # Errors
///
/// [`ParseMoveError`] on the first unrecognized token.
pub fn parse_moves(s: &str) -> Result<Vec<Move>, ParseMoveError> {
    s.split_whitespace().map(str::parse).collect()
}

#[must_use]
pub fn format_moves(moves: &[Move]) -> String {
    moves.iter().map(ToString::to_string).join(" ")
}
