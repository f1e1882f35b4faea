//! Comma splitting that ignores delimiters inside a masked region.
//!
//! Two masking styles are supported:
//! - a single character that toggles the mask on every occurrence (quotes)
//! - an opener/closer pair that sets and clears it (brackets)
//!
//! Only one level of masking is tracked; nested openers do not stack.
//! Unbalanced masks are not an error, the mask simply stays on until the
//! end of the line.

/// Field delimiter for every extract.
pub const DELIMITER: char = ',';

/// Splits `line` at commas, ignoring commas between occurrences of `mask`.
///
/// A line of at most one character is returned as its only field. A
/// trailing unmasked comma produces an explicit empty last field.
///
/// # Examples
///
/// ```
/// use campus_power::text::split_masked;
///
/// let fields = split_masked(r#"7,"Snell, Library",12"#, '"');
/// assert_eq!(fields, vec!["7", r#""Snell, Library""#, "12"]);
/// ```
pub fn split_masked(line: &str, mask: char) -> Vec<&str> {
    split_with(line, |c, inside| (c == mask).then_some(!inside))
}

/// Splits `line` at commas, ignoring commas between `opener` and `closer`.
///
/// Falls back to [`split_masked`] when both characters are the same.
///
/// # Examples
///
/// ```
/// use campus_power::text::split_between;
///
/// let fields = split_between("[1.0, 2.0], [3.0, 4.0]", '[', ']');
/// assert_eq!(fields, vec!["[1.0, 2.0]", " [3.0, 4.0]"]);
/// ```
pub fn split_between(line: &str, opener: char, closer: char) -> Vec<&str> {
    if opener == closer {
        return split_masked(line, opener);
    }
    split_with(line, |c, _| {
        if c == opener {
            Some(true)
        } else if c == closer {
            Some(false)
        } else {
            None
        }
    })
}

/// Core splitting loop. `mask_update` returns the new mask state when `c`
/// is a masking character, `None` otherwise. The final character never
/// changes the mask.
fn split_with(line: &str, mut mask_update: impl FnMut(char, bool) -> Option<bool>) -> Vec<&str> {
    if line.chars().nth(1).is_none() {
        return vec![line];
    }

    let mut fields = Vec::new();
    let mut start = 0usize;
    let mut inside = false;

    for (i, c) in line.char_indices() {
        let last = i + c.len_utf8() == line.len();

        if !last {
            if let Some(next) = mask_update(c, inside) {
                inside = next;
                continue;
            }
        }

        if last {
            if c == DELIMITER && !inside {
                fields.push(&line[start..i]);
                fields.push("");
            } else {
                fields.push(&line[start..]);
            }
        } else if c == DELIMITER && !inside {
            fields.push(&line[start..i]);
            start = i + DELIMITER.len_utf8();
        }
    }

    fields
}
