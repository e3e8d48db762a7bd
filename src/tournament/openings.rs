use crate::roster::Roster;

/// 31-multiplier polynomial over UTF-16 code units, wrapping at 32 bits. Changing it
/// changes the opening order for every pair.
pub fn name_hash(s: &str) -> u32 {
    s.encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as u32))
}

/// Smallest `i` in `2..=min(x, y)` with `x % i == y % i`, or 0 if there is none.
fn lcd(x: usize, y: usize) -> usize {
    (2..=x.min(y)).find(|i| x % i == y % i).unwrap_or(0)
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SkipOffset {
    pub skip: usize,
    pub offset: usize,
}

impl SkipOffset {
    /// `lo` and `hi` are the two player names in lexicographic order.
    pub fn for_names(lo: &str, hi: &str, book_len: usize) -> SkipOffset {
        SkipOffset {
            skip: skip(lo, hi, book_len),
            offset: name_hash(&format!("{hi}<->{lo}")) as usize % book_len,
        }
    }

    /// Book index for the `k`-th game of a pairing with this colour assignment.
    pub fn index(&self, k: usize, book_len: usize) -> usize {
        (self.offset + (k % book_len) * self.skip) % book_len
    }
}

/// A stride coprime with `n`, so walking the book by it visits every line.
fn skip(lo: &str, hi: &str, n: usize) -> usize {
    if n < 3 {
        return 1;
    }
    let mut sk = name_hash(&format!("{lo}|{hi}")) as usize;
    loop {
        sk %= n;
        if sk == 0 {
            sk = 1;
        }
        let m = n % sk;
        if m != 0 && lcd(m, sk) == 0 {
            return sk;
        }
        sk += 1;
    }
}

/// Precomputed strides and starting points for every ordered pair of players.
#[derive(Debug, Clone)]
pub struct OpeningSchedule {
    players: usize,
    book_len: usize,
    table: Vec<SkipOffset>,
}

impl OpeningSchedule {
    pub fn new(roster: &Roster, book_len: usize) -> OpeningSchedule {
        let players = roster.len();
        let mut table = Vec::with_capacity(players * players);
        for white in roster.iter() {
            for black in roster.iter() {
                let (lo, hi) = if white.name <= black.name {
                    (&white.name, &black.name)
                } else {
                    (&black.name, &white.name)
                };
                table.push(SkipOffset::for_names(lo, hi, book_len));
            }
        }
        OpeningSchedule {
            players,
            book_len,
            table,
        }
    }

    pub fn get(&self, white: usize, black: usize) -> SkipOffset {
        self.table[white * self.players + black]
    }

    pub fn index(&self, white: usize, black: usize, k: usize) -> usize {
        self.get(white, black).index(k, self.book_len)
    }
}
