use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Fit a string into exactly `width` display columns.
///
/// Shorter strings are right-padded with spaces; longer ones are cut and
/// end in "…". Widths are measured in terminal columns, so CJK and emoji
/// stay aligned.
pub(crate) fn fit(s: &str, width: usize) -> String {
    let single_line: String = s.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();
    let sw = UnicodeWidthStr::width(single_line.as_str());

    if sw <= width {
        return format!("{}{}", single_line, " ".repeat(width - sw));
    }
    if width == 0 {
        return String::new();
    }

    let budget = width - 1;
    let mut out = String::new();
    let mut used = 0;
    for ch in single_line.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Prefix every line of `text` with `prefix`.
pub(crate) fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}
