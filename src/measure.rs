use unicode_width::UnicodeWidthStr;

/// Pads column names in a CREATE TABLE body so their types line up.
///
/// Widths are display widths, so names in wide scripts (CJK) align in a
/// monospace editor as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnAlignment {
    pub name_width: usize,
}

impl ColumnAlignment {
    pub fn for_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let name_width = names.into_iter().map(display_width).max().unwrap_or(0);
        Self { name_width }
    }

    /// `name` followed by enough spaces to reach the common width.
    pub fn pad(&self, name: &str) -> String {
        let fill = self.name_width.saturating_sub(display_width(name));
        format!("{}{}", name, " ".repeat(fill))
    }
}

pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_width() {
        assert_eq!(display_width("[Total]"), 7);
    }

    #[test]
    fn test_unicode_width() {
        // 全角文字は幅2
        assert_eq!(display_width("[名前]"), 6);
    }

    #[test]
    fn test_pad_to_widest() {
        let align = ColumnAlignment::for_names(["[Id]", "[Status]", "[名前]"]);
        assert_eq!(align.name_width, 8);
        assert_eq!(align.pad("[Id]"), "[Id]    ");
        assert_eq!(align.pad("[名前]"), "[名前]  ");
        assert_eq!(align.pad("[Status]"), "[Status]");
    }

    #[test]
    fn test_no_names() {
        let align = ColumnAlignment::for_names(std::iter::empty());
        assert_eq!(align.name_width, 0);
        assert_eq!(align.pad("[A]"), "[A]");
    }
}
