use crate::cube::{CubeState, Face, MalformedCube};

/// Sticker indices of each corner position, U/D sticker first, then the
/// other two clockwise around the cubie. Index = face · 9 + row-major cell.
const CORNER_FACELETS: [[usize; 3]; 8] = [
    [8, 45, 20],  // URF
    [6, 18, 38],  // UFL
    [0, 36, 29],  // ULB
    [2, 27, 47],  // UBR
    [11, 26, 51], // DFR
    [9, 44, 24],  // DLF
    [15, 35, 42], // DBL
    [17, 53, 33], // DRB
];

/// Sticker indices of each edge position, the orientation-defining sticker
/// first.
const EDGE_FACELETS: [[usize; 2]; 12] = [
    [5, 46],  // UR
    [7, 19],  // UF
    [3, 37],  // UL
    [1, 28],  // UB
    [14, 52], // DR
    [10, 25], // DF
    [12, 43], // DL
    [16, 34], // DB
    [23, 48], // FR
    [21, 41], // FL
    [32, 39], // BL
    [30, 50], // BR
];

fn home_color(facelet: usize) -> Face {
    Face::ALL[facelet / 9]
}

/// The sticker-grid form of a cube: 54 colors, 9 per face in `Face` order,
/// row-major within a face. A color is the face whose center carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceletCube(pub [Face; 54]);

impl FaceletCube {
    pub const SOLVED: FaceletCube = {
        let mut stickers = [Face::Up; 54];
        let mut i = 0;
        while i < 54 {
            stickers[i] = Face::ALL[i / 9];
            i += 1;
        }
        FaceletCube(stickers)
    };
}

impl From<&CubeState> for FaceletCube {
    fn from(cube: &CubeState) -> FaceletCube {
        let mut out = FaceletCube::SOLVED;
        for (pos, slots) in CORNER_FACELETS.iter().enumerate() {
            let cubie = cube.cp[pos] as usize;
            let twist = cube.co[pos] as usize;
            for (k, &home) in CORNER_FACELETS[cubie].iter().enumerate() {
                out.0[slots[(k + twist) % 3]] = home_color(home);
            }
        }
        for (pos, slots) in EDGE_FACELETS.iter().enumerate() {
            let cubie = cube.ep[pos] as usize;
            let flip = cube.eo[pos] as usize;
            for (k, &home) in EDGE_FACELETS[cubie].iter().enumerate() {
                out.0[slots[(k + flip) % 2]] = home_color(home);
            }
        }
        out
    }
}

impl TryFrom<&FaceletCube> for CubeState {
    type Error = MalformedCube;

    /// Read the cubie arrangement back out of a sticker grid.
    ///
    /// # Errors
    ///
    /// [`MalformedCube`] when a sticker triple or pair matches no cubie, a
    /// center is off-color, or the resulting arrangement breaks a parity
    /// invariant.
    fn try_from(grid: &FaceletCube) -> Result<CubeState, MalformedCube> {
        for face in 0..6 {
            if grid.0[face * 9 + 4] != Face::ALL[face] {
                return Err(MalformedCube::CenterMismatch(face));
            }
        }

        let mut cube = CubeState::SOLVED;
        for (pos, slots) in CORNER_FACELETS.iter().enumerate() {
            let twist = (0..3)
                .find(|&o| matches!(grid.0[slots[o]], Face::Up | Face::Down))
                .ok_or(MalformedCube::UnrecognizedCorner(pos))?;
            let around = [
                grid.0[slots[twist]],
                grid.0[slots[(twist + 1) % 3]],
                grid.0[slots[(twist + 2) % 3]],
            ];
            let cubie = (0..8)
                .find(|&c| {
                    let home = CORNER_FACELETS[c].map(home_color);
                    around == home
                })
                .ok_or(MalformedCube::UnrecognizedCorner(pos))?;
            cube.cp[pos] = cubie as u8;
            cube.co[pos] = twist as u8;
        }
        for (pos, slots) in EDGE_FACELETS.iter().enumerate() {
            let colors = [grid.0[slots[0]], grid.0[slots[1]]];
            let (cubie, flip) = (0..12)
                .find_map(|e| {
                    let home = EDGE_FACELETS[e].map(home_color);
                    if colors == home {
                        Some((e, 0))
                    } else if colors == [home[1], home[0]] {
                        Some((e, 1))
                    } else {
                        None
                    }
                })
                .ok_or(MalformedCube::UnrecognizedEdge(pos))?;
            cube.ep[pos] = cubie as u8;
            cube.eo[pos] = flip;
        }

        cube.validate()?;
        Ok(cube)
    }
}
