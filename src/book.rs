use log::{info, warn};
use std::{fs, io, path::Path};

/// Lines shorter than this still work but give the engines little variety.
const MIN_BOOK_PLIES: usize = 2;

#[derive(Debug, Clone)]
pub struct OpeningBook {
    lines: Vec<Vec<String>>,
}

impl OpeningBook {
    /// A single empty line: every game starts from the initial position.
    pub fn start_position_only() -> OpeningBook {
        OpeningBook { lines: vec![vec![]] }
    }

    pub fn from_lines<'a>(text: impl IntoIterator<Item = &'a str>) -> OpeningBook {
        let lines: Vec<Vec<String>> = text
            .into_iter()
            .map(|line| line.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|moves| !moves.is_empty())
            .collect();
        for moves in lines.iter().filter(|m| m.len() < MIN_BOOK_PLIES) {
            warn!("Too short opening line: {}", moves.join(" "));
        }
        if lines.is_empty() {
            OpeningBook::start_position_only()
        } else {
            OpeningBook { lines }
        }
    }

    pub fn load(path: &Path) -> io::Result<OpeningBook> {
        let text = fs::read_to_string(path)?;
        let book = OpeningBook::from_lines(text.lines());
        info!("Read {} openings from {}", book.len(), path.display());
        Ok(book)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> &[String] {
        &self.lines[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        let book = OpeningBook::from_lines("h0R a7R\n\n  d0c0  a3R g3h3\n".lines());
        assert_eq!(book.len(), 2);
        assert_eq!(book.line(0), ["h0R", "a7R"]);
        assert_eq!(book.line(1), ["d0c0", "a3R", "g3h3"]);
    }

    #[test]
    fn empty_book_plays_from_start() {
        let book = OpeningBook::from_lines("\n \n".lines());
        assert_eq!(book.len(), 1);
        assert!(book.line(0).is_empty());
        assert_eq!(OpeningBook::start_position_only().len(), 1);
    }

    #[test]
    fn load_missing_file() {
        assert!(OpeningBook::load(Path::new("/nonexistent/book.txt")).is_err());
    }
}
