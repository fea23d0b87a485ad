// Line protocol parsing
//
// Session:  `<snakeCount> <width> <height> [<mode>]`
// Per turn: the apple line `<x> <y>`, our roster index, then one status line
// per snake: `dead` or `alive <length> <kills> <x,y> <x,y> ...` where the
// coordinates are a kink chain. A line containing "Game Over" ends input.
//
// Only the init line and I/O can fail. Anything malformed inside a turn
// degrades the affected field instead of aborting the match.

use log::warn;
use std::io::{self, BufRead};

use crate::board::reconstruct_body;
use crate::types::{Coord, SessionConfig, Snake, TurnSnapshot};

const GAME_OVER: &str = "Game Over";

/// Parses the init line. The optional fourth field is the game mode.
pub fn parse_init(line: &str) -> Result<SessionConfig, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(format!("Init line needs at least 3 fields, got '{}'", line.trim()));
    }

    let number = |i: usize, name: &str| -> Result<i32, String> {
        fields[i]
            .parse::<i32>()
            .map_err(|e| format!("Invalid {} '{}' in init line: {}", name, fields[i], e))
    };

    let snake_count = number(0, "snake count")?;
    let width = number(1, "width")?;
    let height = number(2, "height")?;
    if snake_count < 0 || width <= 0 || height <= 0 {
        return Err(format!("Init line has non-positive dimensions: '{}'", line.trim()));
    }
    let mode = fields.get(3).and_then(|m| m.parse::<i32>().ok());

    Ok(SessionConfig {
        snake_count: snake_count as usize,
        width,
        height,
        mode,
    })
}

/// Parses the apple line; `None` when it is unreadable
pub fn parse_apple(line: &str) -> Option<Coord> {
    let mut fields = line.split_whitespace();
    let x = fields.next()?.parse().ok()?;
    let y = fields.next()?.parse().ok()?;
    Some(Coord::new(x, y))
}

fn parse_point(token: &str) -> Option<Coord> {
    let (x, y) = token.split_once(',')?;
    Some(Coord::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// Parses one snake status line into a snake with its full body.
///
/// Never fails: a `dead` line, an unreadable line, or a kink chain with points
/// off the board all produce a dead snake.
pub fn parse_snake_line(line: &str, session: &SessionConfig) -> Snake {
    let line = line.trim();
    let mut fields = line.split_whitespace();
    match fields.next() {
        Some("alive") => {}
        Some("dead") => return Snake::dead(),
        _ => {
            warn!("Unrecognised snake line '{}', treating as dead", line);
            return Snake::dead();
        }
    }

    let length = fields.next().and_then(|f| f.parse::<usize>().ok());
    let kills = fields.next().and_then(|f| f.parse::<u32>().ok());
    let kinks: Option<Vec<Coord>> = fields.map(parse_point).collect();

    let (Some(length), Some(kills), Some(kinks)) = (length, kills, kinks) else {
        warn!("Malformed snake line '{}', treating as dead", line);
        return Snake::dead();
    };
    if length == 0 || kinks.is_empty() {
        warn!("Snake line without body '{}', treating as dead", line);
        return Snake::dead();
    }
    if let Some(off) = kinks.iter().find(|k| !session.in_bounds(**k)) {
        warn!("Snake line has point {:?} off the board, treating as dead", off);
        return Snake::dead();
    }

    Snake {
        alive: true,
        length,
        kills,
        body: reconstruct_body(&kinks, length),
    }
}

/// Reads the session header and then one turn block at a time
pub struct TurnReader<R: BufRead> {
    input: R,
    session: Option<SessionConfig>,
    turn: u32,
    line: String,
}

impl<R: BufRead> TurnReader<R> {
    pub fn new(input: R) -> Self {
        TurnReader {
            input,
            session: None,
            turn: 0,
            line: String::new(),
        }
    }

    pub fn session(&self) -> Option<&SessionConfig> {
        self.session.as_ref()
    }

    /// Next line without its terminator, or `None` at end of input
    fn next_line(&mut self) -> io::Result<Option<&str>> {
        self.line.clear();
        if self.input.read_line(&mut self.line)? == 0 {
            return Ok(None);
        }
        Ok(Some(self.line.trim_end_matches(['\r', '\n'])))
    }

    /// Reads the init line. `Ok(None)` when input ends before it arrives.
    pub fn read_session(&mut self) -> io::Result<Option<SessionConfig>> {
        let Some(line) = self.next_line()? else {
            return Ok(None);
        };
        let session = parse_init(line).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.session = Some(session.clone());
        Ok(Some(session))
    }

    /// Reads the next turn block. `Ok(None)` on "Game Over" or end of input.
    ///
    /// Every snake line of the block is consumed even when earlier lines are
    /// malformed, so the reader stays aligned with the next turn.
    pub fn next_turn(&mut self) -> io::Result<Option<TurnSnapshot>> {
        let Some(session) = self.session.clone() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "next_turn called before read_session",
            ));
        };
        let turn = self.turn;

        let apple = match self.next_line()? {
            None => return Ok(None),
            Some(line) if line.contains(GAME_OVER) => return Ok(None),
            Some(line) => {
                let apple = parse_apple(line);
                if apple.is_none() {
                    warn!("Turn {}: unreadable apple line '{}'", turn, line);
                }
                apple
            }
        };

        let me = match self.next_line()? {
            None => return Ok(None),
            Some(line) if line.contains(GAME_OVER) => return Ok(None),
            Some(line) => line.trim().parse::<usize>().unwrap_or_else(|_| {
                warn!("Turn {}: unreadable roster index '{}'", turn, line);
                usize::MAX
            }),
        };

        let mut snakes = Vec::with_capacity(session.snake_count);
        for _ in 0..session.snake_count {
            match self.next_line()? {
                None => return Ok(None),
                Some(line) if line.contains(GAME_OVER) => return Ok(None),
                Some(line) => snakes.push(parse_snake_line(line, &session)),
            }
        }

        let snapshot = TurnSnapshot {
            turn,
            apple,
            me,
            snakes,
        };
        self.turn += 1;
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionConfig {
        SessionConfig {
            snake_count: 2,
            width: 50,
            height: 50,
            mode: Some(1),
        }
    }

    #[test]
    fn test_parse_init_with_and_without_mode() {
        assert_eq!(parse_init("4 50 50 1").unwrap().mode, Some(1));
        let session = parse_init("2 20 30").unwrap();
        assert_eq!((session.snake_count, session.width, session.height), (2, 20, 30));
        assert_eq!(session.mode, None);
    }

    #[test]
    fn test_parse_init_rejects_garbage() {
        assert!(parse_init("").is_err());
        assert!(parse_init("4 fifty 50").is_err());
        assert!(parse_init("4 0 50").is_err());
    }

    #[test]
    fn test_parse_apple() {
        assert_eq!(parse_apple("12 7"), Some(Coord::new(12, 7)));
        assert_eq!(parse_apple("-1 -1"), Some(Coord::new(-1, -1)));
        assert_eq!(parse_apple("12"), None);
        assert_eq!(parse_apple("x y"), None);
    }

    #[test]
    fn test_parse_alive_snake_expands_kinks() {
        let snake = parse_snake_line("alive 4 2 5,5 5,8", &session());
        assert!(snake.alive);
        assert_eq!(snake.kills, 2);
        assert_eq!(
            snake.body,
            vec![
                Coord::new(5, 5),
                Coord::new(5, 6),
                Coord::new(5, 7),
                Coord::new(5, 8)
            ]
        );
    }

    #[test]
    fn test_malformed_snake_lines_are_dead() {
        let s = session();
        assert!(!parse_snake_line("dead", &s).alive);
        assert!(!parse_snake_line("alive", &s).alive);
        assert!(!parse_snake_line("alive 4 0", &s).alive);
        assert!(!parse_snake_line("alive 4 0 5;5 5,8", &s).alive);
        assert!(!parse_snake_line("alive 4 0 5,5 5,80", &s).alive);
        assert!(!parse_snake_line("zombie 4 0 5,5", &s).alive);
    }

    #[test]
    fn test_reader_stops_at_game_over() {
        let input = "2 10 10 1\n3 3\n0\nalive 2 0 1,1 1,2\ndead\nGame Over\n";
        let mut reader = TurnReader::new(input.as_bytes());
        assert!(reader.read_session().unwrap().is_some());
        let turn = reader.next_turn().unwrap().unwrap();
        assert_eq!(turn.turn, 0);
        assert_eq!(turn.apple, Some(Coord::new(3, 3)));
        assert_eq!(turn.snakes.len(), 2);
        assert!(reader.next_turn().unwrap().is_none());
    }
}
