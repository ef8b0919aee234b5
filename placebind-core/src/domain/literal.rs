//! Quoted-literal scanner
//!
//! Finds every `'...'`, `"..."` and `` `...` `` span in a SQL template so the
//! substitutor can tell a real placeholder from a `?` that is just text.

use super::dialect::Dialect;

const DELIMITERS: [u8; 3] = [b'\'', b'"', b'`'];

/// Byte range `[start, end)` of one quoted literal, delimiters included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralRange {
    pub start: usize,
    pub end: usize,
}

impl LiteralRange {
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// An opening delimiter that never found its closing partner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedLiteral {
    pub offset: usize,
    pub delimiter: char,
}

/// Output of [`scan_literals`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiteralScan {
    /// Non-overlapping, ascending by `start`
    pub ranges: Vec<LiteralRange>,
    pub malformed: Vec<MalformedLiteral>,
}

impl LiteralScan {
    /// Whether `offset` falls inside any literal
    pub fn contains(&self, offset: usize) -> bool {
        // ranges are sorted and disjoint: the candidate is the last range
        // starting at or before `offset`
        let idx = self.ranges.partition_point(|r| r.start <= offset);
        idx > 0 && self.ranges[idx - 1].contains(offset)
    }

    pub fn is_well_formed(&self) -> bool {
        self.malformed.is_empty()
    }
}

/// Scan `template` for quoted literals.
///
/// Never fails. An unterminated literal is reported in
/// [`LiteralScan::malformed`] and scanning resumes right after its opening
/// delimiter. After that, further openings with the same delimiter are not
/// attempted: they can only run to the end of input as well.
pub fn scan_literals(template: &str, dialect: Dialect) -> LiteralScan {
    let bytes = template.as_bytes();
    let mut scan = LiteralScan::default();
    let mut exhausted = [false; DELIMITERS.len()];
    let mut pos = 0;

    while pos < bytes.len() {
        let Some(slot) = DELIMITERS.iter().position(|&d| d == bytes[pos]) else {
            pos += 1;
            continue;
        };

        let escaped_outside =
            dialect.backslash_escapes() && pos > 0 && bytes[pos - 1] == b'\\';
        if exhausted[slot] || escaped_outside {
            pos += 1;
            continue;
        }

        match find_close(bytes, pos, dialect) {
            Some(close) => {
                scan.ranges.push(LiteralRange {
                    start: pos,
                    end: close + 1,
                });
                pos = close + 1;
            }
            None => {
                scan.malformed.push(MalformedLiteral {
                    offset: pos,
                    delimiter: char::from(bytes[pos]),
                });
                exhausted[slot] = true;
                pos += 1;
            }
        }
    }

    scan
}

/// Offset of the delimiter closing the literal opened at `open`
fn find_close(bytes: &[u8], open: usize, dialect: Dialect) -> Option<usize> {
    let delimiter = bytes[open];
    let mut i = open + 1;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && dialect.backslash_escapes() {
            // skip whatever is escaped, including another backslash
            i += 2;
            continue;
        }
        if b == delimiter {
            if !dialect.backslash_escapes() && bytes.get(i + 1) == Some(&delimiter) {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(template: &str) -> Vec<(usize, usize)> {
        scan_literals(template, Dialect::MySql)
            .ranges
            .iter()
            .map(|r| (r.start, r.end))
            .collect()
    }

    fn slices(template: &str, dialect: Dialect) -> Vec<&str> {
        scan_literals(template, dialect)
            .ranges
            .iter()
            .map(|r| &template[r.start..r.end])
            .collect()
    }

    #[test]
    fn test_no_literals() {
        let scan = scan_literals("SELECT * FROM t WHERE id = ?", Dialect::MySql);
        assert!(scan.ranges.is_empty());
        assert!(scan.is_well_formed());
    }

    #[test]
    fn test_all_three_delimiters() {
        let sql = "SELECT `col?` FROM t WHERE a = 'x?' AND b = \"y?\"";
        assert_eq!(slices(sql, Dialect::MySql), vec!["`col?`", "'x?'", "\"y?\""]);
    }

    #[test]
    fn test_range_includes_delimiters() {
        assert_eq!(ranges("a = 'b'"), vec![(4, 7)]);
    }

    #[test]
    fn test_other_delimiters_inside_literal_are_text() {
        let sql = "x = 'it\"s `fine`' AND y = \"a'b\"";
        assert_eq!(slices(sql, Dialect::MySql), vec!["'it\"s `fine`'", "\"a'b\""]);
    }

    #[test]
    fn test_backslash_escaped_delimiter_does_not_close() {
        let sql = r"WHERE name = 'O\'Brien?' AND x = ?";
        assert_eq!(slices(sql, Dialect::MySql), vec![r"'O\'Brien?'"]);
    }

    #[test]
    fn test_backslash_escapes_double_quote_and_backtick() {
        let sql = r#"a = "x\"?" AND `c\`?` = ?"#;
        assert_eq!(slices(sql, Dialect::MySql), vec![r#""x\"?""#, r"`c\`?`"]);
    }

    #[test]
    fn test_escaped_backslash_before_closing_quote() {
        // `\\` is one escaped backslash, so the following quote closes
        let sql = r"a = 'dir\\' AND b = ?";
        assert_eq!(slices(sql, Dialect::MySql), vec![r"'dir\\'"]);
    }

    #[test]
    fn test_escaped_delimiter_outside_literal_does_not_open() {
        let sql = r"a = \'x AND b = 'y'";
        assert_eq!(slices(sql, Dialect::MySql), vec!["'y'"]);
    }

    #[test]
    fn test_empty_literal() {
        assert_eq!(ranges("a = '' AND b = ?"), vec![(4, 6)]);
    }

    #[test]
    fn test_adjacent_literals() {
        assert_eq!(ranges("'a''b'"), vec![(0, 3), (3, 6)]);
    }

    #[test]
    fn test_standard_doubled_quote_continues_literal() {
        let sql = "a = 'it''s?' AND b = ?";
        assert_eq!(slices(sql, Dialect::Standard), vec!["'it''s?'"]);
    }

    #[test]
    fn test_standard_backslash_is_ordinary() {
        let sql = r"a = 'C:\' AND b = ?";
        assert_eq!(slices(sql, Dialect::Standard), vec![r"'C:\'"]);
        // the same template is unterminated under backslash escaping
        assert!(!scan_literals(sql, Dialect::MySql).is_well_formed());
    }

    #[test]
    fn test_unterminated_literal_is_reported() {
        let scan = scan_literals("SELECT 'abc ? FROM t", Dialect::MySql);
        assert!(scan.ranges.is_empty());
        assert_eq!(
            scan.malformed,
            vec![MalformedLiteral {
                offset: 7,
                delimiter: '\''
            }]
        );
    }

    #[test]
    fn test_scanning_resumes_after_unterminated_literal() {
        let sql = "a = 'oops AND b = \"ok\" AND c = ?";
        let scan = scan_literals(sql, Dialect::MySql);
        assert_eq!(scan.malformed.len(), 1);
        assert_eq!(slices(sql, Dialect::MySql), vec!["\"ok\""]);
    }

    #[test]
    fn test_repeated_unterminated_delimiter_reported_once() {
        let scan = scan_literals("' ' '", Dialect::MySql);
        assert_eq!(scan.ranges, vec![LiteralRange { start: 0, end: 3 }]);
        assert_eq!(scan.malformed.len(), 1);
        assert_eq!(scan.malformed[0].offset, 4);
    }

    #[test]
    fn test_trailing_backslash_does_not_overrun() {
        let scan = scan_literals("'abc\\", Dialect::MySql);
        assert!(scan.ranges.is_empty());
        assert_eq!(scan.malformed.len(), 1);
    }

    #[test]
    fn test_multibyte_text_offsets() {
        let sql = "name = 'café?' AND id = ?";
        let scan = scan_literals(sql, Dialect::MySql);
        assert_eq!(&sql[scan.ranges[0].start..scan.ranges[0].end], "'café?'");
        assert!(!scan.contains(sql.rfind('?').unwrap()));
    }

    #[test]
    fn test_contains_uses_half_open_ranges() {
        let scan = scan_literals("x'ab'y", Dialect::MySql);
        assert!(!scan.contains(0));
        assert!(scan.contains(1));
        assert!(scan.contains(4));
        assert!(!scan.contains(5));
    }
}
