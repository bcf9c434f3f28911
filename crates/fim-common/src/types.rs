use std::ops::Range;

pub type Spanned<T> = (T, Span);
pub type Span = Range<usize>;

/// Zero-based line and column of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    (line, before[line_start..].chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn line_col_counts_from_zero() {
        let source = "I said 1.\nI said 2.\n";
        assert_eq!((0, 0), line_col(source, 0));
        assert_eq!((0, 7), line_col(source, 7));
        assert_eq!((1, 2), line_col(source, 12));
        assert_eq!((2, 0), line_col(source, source.len()));
    }
}
