use unicode_width::UnicodeWidthStr;

pub trait SplitFirstChar {
    fn split_first(&self) -> Option<(char, &Self)>;
}

impl SplitFirstChar for str {
    fn split_first(&self) -> Option<(char, &Self)> {
        let mut chars = self.chars();
        let c = chars.next()?;
        Some((c, chars.as_str()))
    }
}

/// Terminal column width of `s`, so that tokens with combining marks or wide characters line
/// up in chart diagrams.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Pads `s` with spaces on the right up to `width` columns.
pub(crate) fn pad_to(s: &str, width: usize) -> String {
    let mut out = s.to_string();
    out.push_str(&" ".repeat(width.saturating_sub(display_width(s))));
    out
}
