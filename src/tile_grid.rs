//! Fixed-size matrix of tiles for one room state, addressed `[col][row]`.

use crate::error::{CodecError, Result};
use crate::tile::Tile;

#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    cells: Vec<Vec<Option<Tile>>>,
}

impl TileGrid {
    /// `width_screens`/`height_screens` are in 16-tile screens; the grid itself is
    /// addressed in tiles.
    pub fn new(width_screens: usize, height_screens: usize) -> Self {
        let width = width_screens * 16;
        let height = height_screens * 16;
        TileGrid {
            width,
            height,
            cells: vec![vec![None; height]; width],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, col: usize, row: usize) -> Option<&Tile> {
        self.cells.get(col).and_then(|c| c.get(row)).and_then(|t| t.as_ref())
    }

    pub fn set(&mut self, col: usize, row: usize, tile: Tile) {
        self.cells[col][row] = Some(tile);
    }

    /// Fills every cell with a copy of `tile` (or the default tile if `None`).
    pub fn fill(&mut self, tile: Option<Tile>) {
        let filler = tile.unwrap_or_default();
        for col in self.cells.iter_mut() {
            for cell in col.iter_mut() {
                *cell = Some(filler);
            }
        }
    }

    /// Copies every non-empty cell of `src` onto `self`, offset by `(left, top)`.
    /// Cells that would fall outside `self`'s bounds are clipped.
    pub fn overlay(&mut self, src: &TileGrid, left: usize, top: usize) {
        for col in 0..src.width {
            for row in 0..src.height {
                if let Some(tile) = src.cells[col][row] {
                    let dest_col = col + left;
                    let dest_row = row + top;
                    if dest_col < self.width && dest_row < self.height {
                        self.cells[dest_col][dest_row] = Some(tile);
                    }
                }
            }
        }
    }

    /// Flat byte stream for the compressor: every cell's layer-1 attribute word,
    /// row-major (y outer, x inner), followed by every cell's BTS number byte in the
    /// same order. Exactly `3 * width * height` bytes. Fails if any cell is empty.
    pub fn uncompressed_data(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(3 * self.width * self.height);

        for row in 0..self.height {
            for col in 0..self.width {
                let tile = self.cell_or_err(col, row)?;
                out.extend_from_slice(&tile.l1_attributes_bytes());
            }
        }
        for row in 0..self.height {
            for col in 0..self.width {
                let tile = self.cell_or_err(col, row)?;
                out.push(tile.bts_number_byte());
            }
        }

        Ok(out)
    }

    fn cell_or_err(&self, col: usize, row: usize) -> Result<&Tile> {
        self.cells[col][row]
            .as_ref()
            .ok_or(CodecError::EmptyCell { col, row })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_length_matches_tile_count() {
        let mut g = TileGrid::new(1, 1);
        g.fill(None);
        let data = g.uncompressed_data().unwrap();
        assert_eq!(data.len(), 3 * 16 * 16);
    }

    #[test]
    fn empty_cell_is_an_error() {
        let g = TileGrid::new(1, 1);
        assert!(g.uncompressed_data().is_err());
    }

    #[test]
    fn overlay_clips_to_destination_bounds() {
        let mut dest = TileGrid::new(1, 1);
        dest.fill(None);
        let mut src = TileGrid::new(2, 2);
        src.fill(Some(Tile::with_tileno(7).unwrap()));
        dest.overlay(&src, 8, 8);
        assert_eq!(dest.get(15, 15).unwrap().tileno, 7);
        // Nothing out of bounds panics; cells beyond (16,16) are simply dropped.
    }

    #[test]
    fn overlay_skips_empty_source_cells() {
        let mut dest = TileGrid::new(1, 1);
        dest.fill(Some(Tile::with_tileno(1).unwrap()));
        let src = TileGrid::new(1, 1); // all empty
        dest.overlay(&src, 0, 0);
        assert_eq!(dest.get(0, 0).unwrap().tileno, 1);
    }
}
