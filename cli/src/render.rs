use std::io::{self, Write};

use sweeper_core::{Board, Cell, CellState, GameState, Grid, GridShape, LifeBoard, RowCol};

/// Glyph for one cell; hidden mines are shown once the game is lost.
fn glyph(cell: Cell, show_mines: bool) -> char {
    use CellState::*;
    match cell.state {
        New if show_mines && cell.is_mine() => '*',
        New => '.',
        Uncertain => '?',
        Flagged => 'F',
        Exploded => 'X',
        Open => match cell.threat_value {
            0 => ' ',
            n => char::from_digit(n.into(), 10).unwrap_or('!'),
        },
    }
}

fn write_grid(
    out: &mut impl Write,
    grid: Grid,
    mut glyph_at: impl FnMut(RowCol) -> char,
) -> io::Result<()> {
    for row in 0..grid.rows {
        // odd hex rows sit half a cell to the right
        if grid.shape == GridShape::Hex && row % 2 == 1 {
            write!(out, " ")?;
        }
        for col in 0..grid.cols {
            write!(out, "{} ", glyph_at(RowCol::new(row, col)))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_board(out: &mut impl Write, board: &Board) -> io::Result<()> {
    let show_mines = board.state() == GameState::GameOver;
    write_grid(out, board.grid(), |rc| {
        board
            .cell(rc)
            .map_or('!', |cell| glyph(cell, show_mines))
    })?;
    writeln!(
        out,
        "{:?}, mines left: {}, version: {}",
        board.state(),
        board.mines_left(),
        board.version()
    )
}

pub fn write_life(out: &mut impl Write, board: &LifeBoard) -> io::Result<()> {
    writeln!(
        out,
        "generation {}, population {}",
        board.generation(),
        board.population()
    )?;
    write_grid(out, board.grid(), |rc| {
        if board.is_alive(rc) { 'O' } else { '.' }
    })
}
