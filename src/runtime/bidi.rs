//! Unicode directional isolation for interpolated values.
//!
//! Wrapping a placeable's output in FSI ... PDI keeps right-to-left arguments
//! from reordering the surrounding left-to-right text (and vice versa).

/// U+2068 FIRST STRONG ISOLATE
pub const FSI: char = '\u{2068}';
/// U+2069 POP DIRECTIONAL ISOLATE
pub const PDI: char = '\u{2069}';

/// Appends `text` to `out`, wrapped in isolation marks when `isolate` is set.
pub fn push_isolated(out: &mut String, text: &str, isolate: bool) {
    if isolate {
        out.reserve(text.len() + FSI.len_utf8() + PDI.len_utf8());
        out.push(FSI);
        out.push_str(text);
        out.push(PDI);
    } else {
        out.push_str(text);
    }
}

/// Removes every isolation mark, e.g. to compare output against plain text.
///
/// # Examples
///
/// ```rust
/// use ftl_engine::runtime::bidi::strip_isolates;
/// assert_eq!(strip_isolates("Hi \u{2068}Ana\u{2069}!"), "Hi Ana!");
/// ```
pub fn strip_isolates(text: &str) -> String {
    text.chars().filter(|&ch| ch != FSI && ch != PDI).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_isolated() {
        let mut out = String::from("a ");
        push_isolated(&mut out, "b", true);
        push_isolated(&mut out, " c", false);
        assert_eq!(out, "a \u{2068}b\u{2069} c");
    }
}
