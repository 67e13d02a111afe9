//! Compact terrain encodings for transmitting a finished grid: a 1-bit-
//! per-cell packed form for fixed-size payloads, and a run-length form for
//! grids with large uniform regions.

use crate::error::DungeonError;
use crate::grid::{Grid, FLOOR, WALL};

/// Pack `grid` into one bit per cell, row-major, LSB-first within each
/// byte. Walls (`0`) clear the bit, any non-zero cell sets it — this is a
/// lossy encoding for anything beyond floor/wall, by design.
pub fn pack_bits(grid: &Grid) -> Vec<u8> {
    let total_cells = grid.width() * grid.height();
    let mut packed = vec![0u8; (total_cells + 7) / 8];

    for (index, &cell) in grid.cells().iter().enumerate() {
        if cell != WALL {
            packed[index / 8] |= 1 << (index % 8);
        }
    }
    packed
}

pub fn unpack_bits(packed: &[u8], width: usize, height: usize) -> Result<Grid, DungeonError> {
    let total_cells = width * height;
    if packed.len() * 8 < total_cells {
        return Err(DungeonError::GenerationFailed(
            "packed payload is shorter than width * height bits".to_string(),
        ));
    }

    let mut grid = Grid::filled(width, height, WALL);
    for index in 0..total_cells {
        let byte = packed[index / 8];
        let bit_set = (byte >> (index % 8)) & 1 == 1;
        if bit_set {
            let x = (index % width) as i64;
            let y = (index / width) as i64;
            grid.set(x, y, FLOOR);
        }
    }
    Ok(grid)
}

/// Run-length encode the raw cell bytes as `(value, run_length)` pairs,
/// run lengths as little-endian `u32`.
pub fn rle_encode(grid: &Grid) -> Vec<u8> {
    let mut out = Vec::new();
    let cells = grid.cells();
    let mut index = 0;
    while index < cells.len() {
        let value = cells[index];
        let mut run = 1u32;
        while index + (run as usize) < cells.len() && cells[index + run as usize] == value {
            run += 1;
        }
        out.push(value);
        out.extend_from_slice(&run.to_le_bytes());
        index += run as usize;
    }
    out
}

pub fn rle_decode(data: &[u8], width: usize, height: usize) -> Result<Grid, DungeonError> {
    let mut cells = Vec::with_capacity(width * height);
    let mut cursor = 0;
    while cursor < data.len() {
        if cursor + 5 > data.len() {
            return Err(DungeonError::GenerationFailed(
                "truncated run-length record".to_string(),
            ));
        }
        let value = data[cursor];
        let run = u32::from_le_bytes(data[cursor + 1..cursor + 5].try_into().unwrap());
        cells.extend(std::iter::repeat(value).take(run as usize));
        cursor += 5;
    }

    if cells.len() != width * height {
        return Err(DungeonError::GenerationFailed(format!(
            "decoded {} cells, expected {}",
            cells.len(),
            width * height
        )));
    }

    let mut grid = Grid::filled(width, height, WALL);
    for (index, &value) in cells.iter().enumerate() {
        let x = (index % width) as i64;
        let y = (index / width) as i64;
        grid.set(x, y, value);
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> Grid {
        let mut grid = Grid::filled(8, 8, WALL);
        grid.fill_rect(2, 2, 4, 4, FLOOR);
        grid
    }

    #[test]
    fn bit_packing_round_trips() {
        let grid = sample_grid();
        let packed = pack_bits(&grid);
        let restored = unpack_bits(&packed, 8, 8).unwrap();
        assert_eq!(grid.floor_count(), restored.floor_count());
        for y in 0..8i64 {
            for x in 0..8i64 {
                assert_eq!(grid.is_floor(x, y), restored.is_floor(x, y));
            }
        }
    }

    #[test]
    fn rle_round_trips() {
        let grid = sample_grid();
        let encoded = rle_encode(&grid);
        let decoded = rle_decode(&encoded, 8, 8).unwrap();
        assert_eq!(grid.cells(), decoded.cells());
    }

    #[test]
    fn rle_rejects_truncated_payload() {
        let grid = sample_grid();
        let mut encoded = rle_encode(&grid);
        encoded.truncate(encoded.len() - 2);
        assert!(rle_decode(&encoded, 8, 8).is_err());
    }

    #[test]
    fn unpack_rejects_short_payload() {
        assert!(unpack_bits(&[0u8; 1], 8, 8).is_err());
    }
}
