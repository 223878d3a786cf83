//! Heading demotion for document concatenation.
//!
//! Each source document is written as if it owned the page, so its headings
//! start at level 1. Concatenating documents under one synthetic book title
//! would produce dozens of colliding level-1 headings; demoting every heading
//! by a fixed offset nests each document beneath the title instead. Levels
//! clamp at `max_level`: a heading can collapse into the deepest supported
//! level, but demotion never errors.
//!
//! Lines inside fenced code blocks are left alone: `# comment` in a shell
//! sample is not a heading.

/// Shift every ATX heading in `text` down by `offset` levels, clamped to
/// `max_level`.
pub fn demote_headings(text: &str, offset: u8, max_level: u8) -> String {
    if offset == 0 {
        return text.to_string();
    }
    let max_level = usize::from(max_level.clamp(1, 6));

    let mut out = String::with_capacity(text.len() + 64);
    let mut in_fence = false;
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            out.push_str(line);
            out.push('\n');
            continue;
        }

        if !in_fence {
            if let Some(rest) = heading_rest(line) {
                let level = line.len() - rest.len();
                let demoted = (level + usize::from(offset)).min(max_level);
                for _ in 0..demoted {
                    out.push('#');
                }
                out.push_str(rest);
                out.push('\n');
                continue;
            }
        }

        out.push_str(line);
        out.push('\n');
    }

    if !text.ends_with('\n') {
        out.pop();
    }
    out
}

/// For an ATX heading line, the remainder after its 1–6 leading `#`s
/// (starting at the whitespace separator). `None` for any other line.
fn heading_rest(line: &str) -> Option<&str> {
    let hashes = line.len() - line.trim_start_matches('#').len();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if rest.starts_with(' ') || rest.starts_with('\t') {
        Some(rest)
    } else {
        None
    }
}
