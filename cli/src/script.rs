use anyhow::{Context, Result, bail};
use sweeper_core::{Command, Coord, Coordinate, RowCol};

/// One line of a play script.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Step(Command, Coordinate),
    Show,
    Quit,
}

/// Parses a script line, `None` for blank lines and `#` comments.
///
/// ```text
/// poke 3 4     # row, column
/// flag 17      # linear index
/// pause
/// show
/// quit
/// ```
pub fn parse_line(line: &str) -> Result<Option<Action>> {
    let line = line.split('#').next().unwrap_or_default().trim();
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let action = match verb.to_ascii_lowercase().as_str() {
        "poke" | "p" | "open" => Action::Step(Command::Poke, parse_coordinate(&args)?),
        "flag" | "f" => Action::Step(Command::Flag, parse_coordinate(&args)?),
        "pause" | "resume" => Action::Step(Command::TogglePause, Coordinate::Index(0)),
        "show" => Action::Show,
        "quit" | "q" => Action::Quit,
        other => bail!("Unknown command {other:?}"),
    };
    Ok(Some(action))
}

fn parse_coordinate(args: &[&str]) -> Result<Coordinate> {
    match args {
        [index] => Ok(Coordinate::Index(
            index.parse().with_context(|| format!("Bad cell index {index:?}"))?,
        )),
        [row, col] => Ok(Coordinate::RowCol(RowCol::new(
            parse_axis(row)?,
            parse_axis(col)?,
        ))),
        _ => bail!("Expected `<index>` or `<row> <col>`, got {} argument(s)", args.len()),
    }
}

fn parse_axis(text: &str) -> Result<Coord> {
    text.parse()
        .with_context(|| format!("Bad coordinate {text:?}"))
}
