use log::{debug, info};

use crate::error::LevelFormatError;
use crate::model::{
    LEVEL_ROWS, LevelFile, LevelSource, PORTAL_BASE, Portal, SPECIAL_BASE, SpecialFlags,
    SpecialTile, Trigger,
};

/// Parse a whole level file into `LevelFile`.
///
/// The file is expected to contain, in order:
///   • special tile lines   `<symbol> <tile>[><replacement>] <flags|->`
///   • a blank line
///   • portal lines         `<symbol> <destination> <colour>`
///   • a blank line
///   • an optional          `Finish: <offset>`
///   • level blocks, each a name line followed by exactly 16 rows
pub fn load_levels(text: &str) -> Result<LevelFile, LevelFormatError> {
    let mut lines = Lines::new(text);
    let mut file = LevelFile::default();

    for (line, text) in lines.section() {
        parse_special(&mut file, line, text)?;
    }
    debug!(
        "Found {} special tiles and {} triggers",
        file.specials.len(),
        file.triggers.len()
    );

    for (line, text) in lines.section() {
        parse_portal(&mut file, line, text)?;
    }
    for (&symbol, portal) in &file.portals {
        if !file.portals.contains_key(&portal.destination) {
            return Err(LevelFormatError::UnknownDestination {
                portal: symbol,
                destination: portal.destination,
            });
        }
    }
    debug!("Found {} portals", file.portals.len());

    lines.skip_blank();
    if let Some((line, text)) = lines.peek() {
        if let Some(value) = text.strip_prefix("Finish:") {
            file.finish = value.trim().parse().map_err(|_| LevelFormatError::Header {
                line,
                reason: format!("bad finishing offset `{}`", value.trim()),
            })?;
            lines.next();
        }
    }

    loop {
        lines.skip_blank();
        let Some((name_line, name)) = lines.next() else {
            break;
        };
        let name = name.trim().to_string();

        let mut rows = Vec::with_capacity(LEVEL_ROWS);
        while rows.len() < LEVEL_ROWS {
            match lines.peek() {
                Some((_, row)) if !row.trim().is_empty() => {
                    rows.push(row.trim_end().to_string());
                    lines.next();
                }
                _ => {
                    return Err(LevelFormatError::ShortLevel {
                        line: name_line,
                        name,
                        found: rows.len(),
                    });
                }
            }
        }
        if let Some((line, row)) = lines.peek() {
            if !row.trim().is_empty() {
                return Err(LevelFormatError::LongLevel { line, name });
            }
        }
        debug!("Level `{}` parsed, {} columns", name, rows.iter().map(|r| r.len()).max().unwrap_or(0));
        file.levels.push(LevelSource { name, rows });
    }

    if file.levels.is_empty() {
        return Err(LevelFormatError::NoLevels);
    }
    info!("Parsed {} level(s)", file.levels.len());
    Ok(file)
}

// ─────────────────────────────────────────────────────
/// Helper: numbered line cursor.
struct Lines<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self { lines: text.lines().collect(), pos: 0 }
    }

    fn peek(&self) -> Option<(usize, &'a str)> {
        self.lines.get(self.pos).map(|l| (self.pos + 1, *l))
    }

    fn next(&mut self) -> Option<(usize, &'a str)> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    fn skip_blank(&mut self) {
        while matches!(self.peek(), Some((_, l)) if l.trim().is_empty()) {
            self.pos += 1;
        }
    }

    /// Lines up to (and swallowing) the next blank line.
    fn section(&mut self) -> Vec<(usize, &'a str)> {
        let mut out = Vec::new();
        while let Some((line, text)) = self.next() {
            if text.trim().is_empty() {
                break;
            }
            out.push((line, text));
        }
        out
    }
}

fn fields(line: usize, text: &str, expected: usize) -> Result<Vec<&str>, LevelFormatError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() != expected {
        return Err(LevelFormatError::FieldCount { line, expected, found: fields.len() });
    }
    Ok(fields)
}

fn single_char(line: usize, field: &str, what: &str) -> Result<char, LevelFormatError> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(LevelFormatError::Header {
            line,
            reason: format!("{what} `{field}` must be a single character"),
        }),
    }
}

fn check_unused(file: &LevelFile, line: usize, symbol: char) -> Result<(), LevelFormatError> {
    if file.specials.contains_key(&symbol)
        || file.triggers.contains_key(&symbol)
        || file.portals.contains_key(&symbol)
    {
        return Err(LevelFormatError::DuplicateSymbol { line, symbol });
    }
    Ok(())
}

fn parse_special(file: &mut LevelFile, line: usize, text: &str) -> Result<(), LevelFormatError> {
    let f = fields(line, text, 3)?;
    let symbol = single_char(line, f[0], "symbol")?;
    check_unused(file, line, symbol)?;
    let flags: SpecialFlags = f[2]
        .parse()
        .map_err(|reason| LevelFormatError::Header { line, reason })?;

    // `a @>.` declares a trigger rather than a special tile.
    if let Some((initial, replacement)) = f[1].split_once('>') {
        let trigger = Trigger {
            initial: single_char(line, initial, "initial tile")?,
            replacement: single_char(line, replacement, "replacement tile")?,
        };
        file.triggers.insert(symbol, trigger);
        return Ok(());
    }

    let index = u8::try_from(file.specials.len())
        .ok()
        .and_then(|n| SPECIAL_BASE.checked_add(n))
        .filter(|&i| i < PORTAL_BASE)
        .ok_or_else(|| LevelFormatError::Header {
            line,
            reason: "too many special tiles".into(),
        })?;
    let tile = single_char(line, f[1], "tile")?;
    file.specials.insert(symbol, SpecialTile { tile, index, flags });
    Ok(())
}

fn parse_portal(file: &mut LevelFile, line: usize, text: &str) -> Result<(), LevelFormatError> {
    let f = fields(line, text, 3)?;
    let symbol = single_char(line, f[0], "symbol")?;
    check_unused(file, line, symbol)?;
    let destination = single_char(line, f[1], "destination")?;
    let colour = f[2]
        .parse()
        .map_err(|reason| LevelFormatError::Header { line, reason })?;

    let index = u8::try_from(file.portals.len())
        .ok()
        .and_then(|n| PORTAL_BASE.checked_add(n))
        .ok_or_else(|| LevelFormatError::Header {
            line,
            reason: "too many portals".into(),
        })?;
    file.portals.insert(symbol, Portal { index, destination, colour });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Colour;

    fn rows(n: usize, row: &str) -> String {
        vec![row; n].join("\n")
    }

    fn sample() -> String {
        format!(
            "a @ visible\nb ? collectable,treasure\nt @>. -\n\nA B red\nB A cyan\n\nFinish: 420\n\nCourtyard\n{}\n\nKeep\n{}\n",
            rows(16, "....@@...."),
            rows(16, "##")
        )
    }

    #[test]
    fn parses_headers_and_levels() {
        let file = load_levels(&sample()).unwrap();

        assert_eq!(file.specials.len(), 2);
        let a = &file.specials[&'a'];
        assert_eq!((a.tile, a.index), ('@', 16));
        assert_eq!(a.flags.0, SpecialFlags::VISIBLE);
        let b = &file.specials[&'b'];
        assert_eq!(b.index, 17);
        assert_eq!(b.flags.0, SpecialFlags::COLLECTABLE | SpecialFlags::TREASURE);

        assert_eq!(file.triggers[&'t'], Trigger { initial: '@', replacement: '.' });

        assert_eq!(file.portals[&'A'].index, 128);
        assert_eq!(file.portals[&'A'].destination, 'B');
        assert_eq!(file.portals[&'B'].colour, Colour::Cyan);
        assert_eq!(file.portals[&'B'].index, 129);

        assert_eq!(file.finish, 420);
        assert_eq!(file.levels.len(), 2);
        assert_eq!(file.levels[0].name, "Courtyard");
        assert_eq!(file.levels[0].rows.len(), 16);
        assert_eq!(file.levels[1].rows[15], "##");
    }

    #[test]
    fn finish_is_optional() {
        let text = format!("\n\nOnly\n{}\n", rows(16, "."));
        let file = load_levels(&text).unwrap();
        assert_eq!(file.finish, 0);
        assert!(file.specials.is_empty());
        assert!(file.portals.is_empty());
        assert_eq!(file.levels[0].name, "Only");
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        let text = format!("a @\n\n\nL\n{}\n", rows(16, "."));
        assert_eq!(
            load_levels(&text),
            Err(LevelFormatError::FieldCount { line: 1, expected: 3, found: 2 })
        );
    }

    #[test]
    fn short_level_is_rejected() {
        let text = format!("\n\nStub\n{}\n", rows(15, "."));
        assert_eq!(
            load_levels(&text),
            Err(LevelFormatError::ShortLevel { line: 3, name: "Stub".into(), found: 15 })
        );

        // A blank line inside the block cuts it short too.
        let text = format!("\n\nStub\n{}\n\n{}\n", rows(8, "."), rows(8, "."));
        assert!(matches!(
            load_levels(&text),
            Err(LevelFormatError::ShortLevel { found: 8, .. })
        ));
    }

    #[test]
    fn long_level_is_rejected() {
        let text = format!("\n\nL\n{}\n\nM\n{}\n", rows(17, "...."), rows(16, "...."));
        assert_eq!(
            load_levels(&text),
            Err(LevelFormatError::LongLevel { line: 20, name: "L".into() })
        );

        // Two blocks run together are not read as two levels.
        let text = format!("\n\nL\n{}\n", rows(33, "...."));
        assert_eq!(
            load_levels(&text),
            Err(LevelFormatError::LongLevel { line: 20, name: "L".into() })
        );
    }

    #[test]
    fn destinations_must_be_portals() {
        let text = format!("\nA Z red\n\nL\n{}\n", rows(16, "."));
        assert_eq!(
            load_levels(&text),
            Err(LevelFormatError::UnknownDestination { portal: 'A', destination: 'Z' })
        );
    }

    #[test]
    fn duplicate_symbols_are_rejected() {
        let text = format!("a @ -\n\na a red\n\nL\n{}\n", rows(16, "."));
        assert_eq!(
            load_levels(&text),
            Err(LevelFormatError::DuplicateSymbol { line: 3, symbol: 'a' })
        );
    }

    #[test]
    fn bad_finish_and_colour() {
        let text = format!("\n\nFinish: -3\n\nL\n{}\n", rows(16, "."));
        assert!(matches!(load_levels(&text), Err(LevelFormatError::Header { line: 3, .. })));

        let text = format!("\nA A mauve\n\nL\n{}\n", rows(16, "."));
        assert!(matches!(load_levels(&text), Err(LevelFormatError::Header { line: 2, .. })));
    }

    #[test]
    fn empty_file_has_no_levels() {
        assert_eq!(load_levels("\n\n"), Err(LevelFormatError::NoLevels));
    }
}
