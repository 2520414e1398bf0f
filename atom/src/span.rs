use std::fmt;
use std::ops::Range;

/// Half-open byte range `[start, end)` into a [`Source`].
///
/// Spans never own characters; they are resolved against the source they were
/// produced from. An absent span is expressed as `Option<Span>::None`.
///
/// [`Source`]: crate::source::Source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start {start} is past its end {end}");
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.range()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod test {
    use super::Span;

    #[test]
    fn empty_span_at_zero_is_still_a_span() {
        let span = Span::new(0, 0);
        assert!(span.is_empty());
        assert_eq!(0..0, span.range());
        assert_ne!(None, Some(span));
    }

    #[test]
    fn length() {
        assert_eq!(3, Span::new(4, 7).len());
        assert_eq!("4..7", Span::new(4, 7).to_string());
    }
}
