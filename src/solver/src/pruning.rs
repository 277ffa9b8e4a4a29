//! Pruning-table construction by breadth-first flooding over coordinate
//! move graphs, and the on-disk table cache.

use crate::nibble::{AtomicNibbleTable, NibbleTable, UNREACHED};
use crate::{start, success, working};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use cube_core::coords::{
    self, EdgeSet, MoveTables, CORNER_ORIENT_COUNT, CORNER_PERM_COUNT, EDGE8_PERM_COUNT,
    EDGE_ORIENT_COUNT, EDGE_SIX_RANK_COUNT, SLICE_PERM_COUNT, SLICE_PLACEMENT_COUNT,
};
use cube_core::{CubeState, ALL_MOVES};
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::thread;
use std::time::Instant;
use thiserror::Error;

/// Indices of the ten subgroup moves within [`ALL_MOVES`], in
/// [`cube_core::SUBGROUP_MOVES`] order.
const SUBGROUP_IN_ALL: [usize; 10] = [0, 1, 2, 3, 4, 5, 7, 10, 13, 16];

/// Depths are tracked up to 14; anything deeper stays [`UNREACHED`].
const MAX_TRACKED_DEPTH: u8 = 14;

const FORMAT_VERSION: u32 = 1;
pub(crate) const KOCIEMBA_MAGIC: [u8; 8] = *b"KOCIEMB\0";
pub(crate) const KROF_MAGIC: [u8; 8] = *b"KROFTBL\0";

/// Names the coordinate product a stored table covers. The numeric codes are
/// part of the file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableId {
    Phase1CornerOrient = 1,
    Phase1EdgeOrientSlice = 2,
    Phase2CornerPerm = 3,
    Phase2EdgeSlicePerm = 4,
    KrofCorners = 5,
    KrofEdgesFirst = 6,
    KrofEdgesLast = 7,
}

impl TableId {
    fn from_code(code: u32) -> Option<TableId> {
        match code {
            1 => Some(TableId::Phase1CornerOrient),
            2 => Some(TableId::Phase1EdgeOrientSlice),
            3 => Some(TableId::Phase2CornerPerm),
            4 => Some(TableId::Phase2EdgeSlicePerm),
            5 => Some(TableId::KrofCorners),
            6 => Some(TableId::KrofEdgesFirst),
            7 => Some(TableId::KrofEdgesLast),
            _ => None,
        }
    }

    fn code(self) -> u32 {
        self as u32
    }

    #[must_use]
    pub fn entry_count(self) -> usize {
        match self {
            TableId::Phase1CornerOrient => CORNER_ORIENT_COUNT,
            TableId::Phase1EdgeOrientSlice => EDGE_ORIENT_COUNT * SLICE_PLACEMENT_COUNT,
            TableId::Phase2CornerPerm => CORNER_PERM_COUNT,
            TableId::Phase2EdgeSlicePerm => EDGE8_PERM_COUNT * SLICE_PERM_COUNT,
            TableId::KrofCorners => CORNER_PERM_COUNT * CORNER_ORIENT_COUNT,
            TableId::KrofEdgesFirst | TableId::KrofEdgesLast => EDGE_SIX_RANK_COUNT * 64,
        }
    }
}

/// The table file could not be read back.
#[derive(Error, Debug)]
pub enum TableLoadError {
    #[error("could not read pruning tables: {0}")]
    Io(#[from] io::Error),
    #[error("not a pruning-table file for this solver (magic mismatch)")]
    BadMagic,
    #[error("unsupported pruning-table format version {0}")]
    UnsupportedVersion(u32),
    #[error("expected {expected} tables, file declares {actual}")]
    TableCount { expected: u32, actual: u32 },
    #[error("unrecognized coordinate-product identifier {0}")]
    UnknownTableId(u32),
    #[error("table {id:?} declares {length} entries, expected {expected}")]
    LengthMismatch {
        id: TableId,
        length: usize,
        expected: usize,
    },
    #[error("expected table {expected:?}, file stores identifier {found}")]
    UnexpectedTable { expected: TableId, found: u32 },
    #[error("file ends before the declared table data")]
    Truncated,
    #[error("trailing bytes after the declared table data")]
    TrailingData,
}

/// The table file could not be written.
#[derive(Error, Debug)]
pub enum TableSaveError {
    #[error("could not write pruning tables: {0}")]
    Io(#[from] io::Error),
}

fn read_error(err: io::Error) -> TableLoadError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        TableLoadError::Truncated
    } else {
        TableLoadError::Io(err)
    }
}

/// Flood distances outward from the seeded goal entries. At each depth every
/// worker scans a disjoint index range for entries at that depth and claims
/// still-unreached successors; which worker wins a claim does not matter.
fn flood(
    label: &str,
    distances: &AtomicNibbleTable,
    move_count: usize,
    threads: usize,
    successor: &(impl Fn(usize, usize) -> usize + Sync),
) {
    let build_start = Instant::now();
    let entries = distances.entry_count();
    let chunk = entries.div_ceil(threads);
    let mut depth = 0;
    loop {
        let pass_start = Instant::now();
        let reached: usize = thread::scope(|scope| {
            let workers: Vec<_> = (0..threads)
                .map(|t| {
                    let lo = (t * chunk).min(entries);
                    let hi = ((t + 1) * chunk).min(entries);
                    scope.spawn(move || {
                        let mut claimed = 0;
                        for index in lo..hi {
                            if distances.get(index) != depth {
                                continue;
                            }
                            for mv in 0..move_count {
                                let next = successor(index, mv);
                                if distances.get(next) == UNREACHED
                                    && distances.try_claim(next, depth + 1)
                                {
                                    claimed += 1;
                                }
                            }
                        }
                        claimed
                    })
                })
                .collect();
            workers
                .into_iter()
                .map(|w| w.join().expect("flood worker panicked"))
                .sum()
        });
        debug!(
            working!("{}: depth {} holds {} entries ({:.3}s)"),
            label,
            depth + 1,
            reached,
            pass_start.elapsed().as_secs_f64()
        );
        if reached == 0 || depth + 1 >= MAX_TRACKED_DEPTH {
            break;
        }
        depth += 1;
    }
    debug!(
        working!("{}: flood finished in {:.3}s"),
        label,
        build_start.elapsed().as_secs_f64()
    );
}

/// The four Kociemba tables. Phase-1 tables flood over all 18 moves,
/// phase-2 tables over the ten subgroup moves.
pub struct KociembaTables {
    corner_orient: NibbleTable,
    eo_slice: NibbleTable,
    corner_perm: NibbleTable,
    edge_slice: NibbleTable,
}

impl KociembaTables {
    const LAYOUT: [TableId; 4] = [
        TableId::Phase1CornerOrient,
        TableId::Phase1EdgeOrientSlice,
        TableId::Phase2CornerPerm,
        TableId::Phase2EdgeSlicePerm,
    ];

    #[must_use]
    pub fn build(threads: usize) -> KociembaTables {
        info!(start!("Building Kociemba pruning tables"));
        let build_start = Instant::now();
        let moves = MoveTables::build();

        let corner_orient = AtomicNibbleTable::new(CORNER_ORIENT_COUNT);
        corner_orient.set(0, 0);
        flood("phase-1 corner orientation", &corner_orient, 18, threads, &|c, m| {
            moves.corner_orient.next(c, m)
        });

        let eo_slice = AtomicNibbleTable::new(EDGE_ORIENT_COUNT * SLICE_PLACEMENT_COUNT);
        eo_slice.set(0, 0);
        flood("phase-1 edge orientation x slice", &eo_slice, 18, threads, &|c, m| {
            let eo = c / SLICE_PLACEMENT_COUNT;
            let slice = c % SLICE_PLACEMENT_COUNT;
            moves.edge_orient.next(eo, m) * SLICE_PLACEMENT_COUNT
                + moves.slice_placement.next(slice, m)
        });

        let corner_perm = AtomicNibbleTable::new(CORNER_PERM_COUNT);
        corner_perm.set(0, 0);
        flood("phase-2 corner permutation", &corner_perm, 10, threads, &|c, m| {
            moves.corner_perm.next(c, SUBGROUP_IN_ALL[m])
        });

        let edge_slice = AtomicNibbleTable::new(EDGE8_PERM_COUNT * SLICE_PERM_COUNT);
        edge_slice.set(0, 0);
        flood("phase-2 edge x slice permutation", &edge_slice, 10, threads, &|c, m| {
            let edge = c / SLICE_PERM_COUNT;
            let slice = c % SLICE_PERM_COUNT;
            moves.edge8_perm.next(edge, m) * SLICE_PERM_COUNT + moves.slice_perm.next(slice, m)
        });

        info!(
            success!("Kociemba pruning tables ready in {:.3}s"),
            build_start.elapsed().as_secs_f64()
        );
        KociembaTables {
            corner_orient: corner_orient.freeze(),
            eo_slice: eo_slice.freeze(),
            corner_perm: corner_perm.freeze(),
            edge_slice: edge_slice.freeze(),
        }
    }

    /// # Errors
    ///
    /// [`TableLoadError`] when the file is absent, malformed, or not a
    /// Kociemba table set.
    pub fn load(path: &Path) -> Result<KociembaTables, TableLoadError> {
        let mut tables = read_tables(path, &KOCIEMBA_MAGIC, &Self::LAYOUT)?.into_iter();
        Ok(KociembaTables {
            corner_orient: tables.next().expect("four tables read"),
            eo_slice: tables.next().expect("four tables read"),
            corner_perm: tables.next().expect("four tables read"),
            edge_slice: tables.next().expect("four tables read"),
        })
    }

    /// # Errors
    ///
    /// [`TableSaveError`] on any I/O failure.
    pub fn save(&self, path: &Path) -> Result<(), TableSaveError> {
        write_tables(
            path,
            &KOCIEMBA_MAGIC,
            &[
                (TableId::Phase1CornerOrient, &self.corner_orient),
                (TableId::Phase1EdgeOrientSlice, &self.eo_slice),
                (TableId::Phase2CornerPerm, &self.corner_perm),
                (TableId::Phase2EdgeSlicePerm, &self.edge_slice),
            ],
        )
    }

    /// Lower bound on the moves needed to reach ⟨U, D, L2, R2, F2, B2⟩.
    pub(crate) fn phase1_estimate(&self, cube: &CubeState) -> u8 {
        let eo_slice =
            coords::edge_orient(cube) * SLICE_PLACEMENT_COUNT + coords::slice_placement(cube);
        self.corner_orient
            .get(coords::corner_orient(cube))
            .max(self.eo_slice.get(eo_slice))
    }

    /// Lower bound on the subgroup moves needed to finish a phase-1-solved
    /// cube.
    pub(crate) fn phase2_estimate(&self, cube: &CubeState) -> u8 {
        let edge_slice = coords::edge8_perm(cube) * SLICE_PERM_COUNT + coords::slice_perm(cube);
        self.corner_perm
            .get(coords::corner_perm(cube))
            .max(self.edge_slice.get(edge_slice))
    }
}

/// The three KROF pattern databases.
pub struct KrofTables {
    corners: NibbleTable,
    edges_first: NibbleTable,
    edges_last: NibbleTable,
}

impl KrofTables {
    const LAYOUT: [TableId; 3] = [
        TableId::KrofEdgesFirst,
        TableId::KrofEdgesLast,
        TableId::KrofCorners,
    ];

    #[must_use]
    pub fn build(threads: usize) -> KrofTables {
        info!(start!("Building KROF pattern databases"));
        let build_start = Instant::now();
        let moves = MoveTables::build();
        let edge_step = build_edge_step_table(threads);
        let edge_successor = |c: usize, m: usize| {
            let step = edge_step[(c >> 6) * 18 + m] as usize;
            (step >> 6) << 6 | (c ^ step) & 63
        };

        let edges_first = AtomicNibbleTable::new(EDGE_SIX_RANK_COUNT * 64);
        let (first_goal, _) = coords::edge_six(&CubeState::SOLVED, EdgeSet::First);
        edges_first.set(first_goal << 6, 0);
        flood("first-six-edges database", &edges_first, 18, threads, &edge_successor);

        let edges_last = AtomicNibbleTable::new(EDGE_SIX_RANK_COUNT * 64);
        let (last_goal, _) = coords::edge_six(&CubeState::SOLVED, EdgeSet::Last);
        edges_last.set(last_goal << 6, 0);
        flood("last-six-edges database", &edges_last, 18, threads, &edge_successor);

        let corners = AtomicNibbleTable::new(CORNER_PERM_COUNT * CORNER_ORIENT_COUNT);
        corners.set(0, 0);
        flood("corner database", &corners, 18, threads, &|c, m| {
            let perm = c / CORNER_ORIENT_COUNT;
            let orient = c % CORNER_ORIENT_COUNT;
            moves.corner_perm.next(perm, m) * CORNER_ORIENT_COUNT
                + moves.corner_orient.next(orient, m)
        });

        info!(
            success!("KROF pattern databases ready in {:.3}s"),
            build_start.elapsed().as_secs_f64()
        );
        KrofTables {
            corners: corners.freeze(),
            edges_first: edges_first.freeze(),
            edges_last: edges_last.freeze(),
        }
    }

    /// # Errors
    ///
    /// [`TableLoadError`] when the file is absent, malformed, or not a KROF
    /// table set.
    pub fn load(path: &Path) -> Result<KrofTables, TableLoadError> {
        let mut tables = read_tables(path, &KROF_MAGIC, &Self::LAYOUT)?.into_iter();
        Ok(KrofTables {
            edges_first: tables.next().expect("three tables read"),
            edges_last: tables.next().expect("three tables read"),
            corners: tables.next().expect("three tables read"),
        })
    }

    /// # Errors
    ///
    /// [`TableSaveError`] on any I/O failure.
    pub fn save(&self, path: &Path) -> Result<(), TableSaveError> {
        write_tables(
            path,
            &KROF_MAGIC,
            &[
                (TableId::KrofEdgesFirst, &self.edges_first),
                (TableId::KrofEdgesLast, &self.edges_last),
                (TableId::KrofCorners, &self.corners),
            ],
        )
    }

    /// Lower bound on the distance to the solved cube.
    pub(crate) fn estimate(&self, cube: &CubeState) -> u8 {
        let corners = coords::corner_perm(cube) * CORNER_ORIENT_COUNT + coords::corner_orient(cube);
        let (first_rank, first_flips) = coords::edge_six(cube, EdgeSet::First);
        let (last_rank, last_flips) = coords::edge_six(cube, EdgeSet::Last);
        self.corners
            .get(corners)
            .max(self.edges_first.get(first_rank << 6 | first_flips as usize))
            .max(self.edges_last.get(last_rank << 6 | last_flips as usize))
    }
}

/// For every six-edge placement rank and move: the successor rank packed
/// with the flip mask the move applies to the tracked edges. Placement ranks
/// ignore edge labels, so one table serves both tracked sets.
fn build_edge_step_table(threads: usize) -> Box<[u32]> {
    let mut data = vec![0u32; EDGE_SIX_RANK_COUNT * 18];
    let per_worker = EDGE_SIX_RANK_COUNT.div_ceil(threads);
    thread::scope(|scope| {
        for (worker, chunk) in data.chunks_mut(per_worker * 18).enumerate() {
            scope.spawn(move || {
                for (offset, slot) in chunk.chunks_mut(18).enumerate() {
                    let rank = worker * per_worker + offset;
                    let repr = coords::decode_edge_six(rank, EdgeSet::First);
                    for (mv, entry) in slot.iter_mut().enumerate() {
                        let mut state = repr;
                        state.rotate(ALL_MOVES[mv].face, i32::from(ALL_MOVES[mv].turns));
                        let (next, flips) = coords::edge_six(&state, EdgeSet::First);
                        *entry = (next << 6 | flips as usize) as u32;
                    }
                }
            });
        }
    });
    data.into_boxed_slice()
}

fn write_tables(
    path: &Path,
    magic: &[u8; 8],
    tables: &[(TableId, &NibbleTable)],
) -> Result<(), TableSaveError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(magic)?;
    writer.write_u32::<LittleEndian>(FORMAT_VERSION)?;
    writer.write_u32::<LittleEndian>(tables.len() as u32)?;
    for (id, table) in tables {
        writer.write_u32::<LittleEndian>(table.entry_count() as u32)?;
        writer.write_u32::<LittleEndian>(id.code())?;
        writer.write_all(table.bytes())?;
    }
    writer.flush()?;
    Ok(())
}

fn read_tables(
    path: &Path,
    magic: &[u8; 8],
    layout: &[TableId],
) -> Result<Vec<NibbleTable>, TableLoadError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut header = [0u8; 8];
    reader.read_exact(&mut header).map_err(read_error)?;
    if header != *magic {
        return Err(TableLoadError::BadMagic);
    }
    let version = reader.read_u32::<LittleEndian>().map_err(read_error)?;
    if version != FORMAT_VERSION {
        return Err(TableLoadError::UnsupportedVersion(version));
    }
    let count = reader.read_u32::<LittleEndian>().map_err(read_error)?;
    if count as usize != layout.len() {
        return Err(TableLoadError::TableCount {
            expected: layout.len() as u32,
            actual: count,
        });
    }

    let mut tables = Vec::with_capacity(layout.len());
    for &expected in layout {
        let length = reader.read_u32::<LittleEndian>().map_err(read_error)? as usize;
        let code = reader.read_u32::<LittleEndian>().map_err(read_error)?;
        let id = TableId::from_code(code).ok_or(TableLoadError::UnknownTableId(code))?;
        if id != expected {
            return Err(TableLoadError::UnexpectedTable {
                expected,
                found: code,
            });
        }
        if length != id.entry_count() {
            return Err(TableLoadError::LengthMismatch {
                id,
                length,
                expected: id.entry_count(),
            });
        }
        let mut bytes = vec![0u8; length.div_ceil(2)];
        reader.read_exact(&mut bytes).map_err(read_error)?;
        tables.push(NibbleTable::from_bytes(length, bytes.into_boxed_slice()));
    }

    if reader.read(&mut [0u8; 1])? != 0 {
        return Err(TableLoadError::TrailingData);
    }
    Ok(tables)
}
