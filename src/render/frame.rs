use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::record::TaskSnapshot;

pub const OUTPUT_INDENT: &str = "    ";

/// One status line per task in start order, then its output window, then an
/// overflow line when output was evicted.
///
/// With a known terminal width every line is cut to `width - 1` columns so a
/// row never wraps onto the next one.
pub fn build_frame(snapshots: &[TaskSnapshot], width: Option<u16>) -> Vec<String> {
    let mut ordered: Vec<&TaskSnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|snapshot| snapshot.start_order);

    let mut frame = Vec::new();
    for snapshot in ordered {
        frame.push(status_line(snapshot));
        for line in &snapshot.lines {
            frame.push(format!("{OUTPUT_INDENT}{line}"));
        }
        if snapshot.overflow > 0 {
            frame.push(overflow_line(snapshot.overflow));
        }
    }

    if let Some(width) = width {
        let columns = usize::from(width.saturating_sub(1)).max(1);
        for line in &mut frame {
            fit_width(line, columns);
        }
    }
    frame
}

pub fn status_line(snapshot: &TaskSnapshot) -> String {
    match snapshot.exit_reason() {
        Some(reason) => format!("{} [{}] {}", snapshot.name, snapshot.status.label(), reason),
        None => format!("{} [{}]", snapshot.name, snapshot.status.label()),
    }
}

pub fn overflow_line(count: u64) -> String {
    format!("{OUTPUT_INDENT}...{count} more lines not shown")
}

fn fit_width(line: &mut String, columns: usize) {
    if line.width() <= columns {
        return;
    }
    let mut used = 0;
    let mut cut = line.len();
    for (offset, c) in line.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > columns {
            cut = offset;
            break;
        }
        used += w;
    }
    line.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{ExitReason, TaskStatus};

    fn snapshot(name: &str, order: usize, status: TaskStatus, lines: &[&str], overflow: u64) -> TaskSnapshot {
        TaskSnapshot {
            name: name.to_string(),
            start_order: order,
            status,
            lines: lines.iter().map(|l| l.to_string()).collect(),
            overflow,
        }
    }

    #[test]
    fn rows_follow_start_order() {
        let frame = build_frame(
            &[
                snapshot("second", 1, TaskStatus::Succeeded, &[], 0),
                snapshot("first", 0, TaskStatus::Running, &[], 0),
            ],
            None,
        );
        assert_eq!(frame, vec!["first [Processing...]", "second [Finished ✓]"]);
    }

    #[test]
    fn silent_success_is_a_single_row() {
        let frame = build_frame(&[snapshot("quiet", 0, TaskStatus::Succeeded, &[], 0)], None);
        assert_eq!(frame, vec!["quiet [Finished ✓]"]);
    }

    #[test]
    fn overflow_line_follows_output() {
        let frame = build_frame(
            &[snapshot("a", 0, TaskStatus::Succeeded, &["3", "4", "5"], 2)],
            None,
        );
        assert_eq!(
            frame,
            vec![
                "a [Finished ✓]",
                "    3",
                "    4",
                "    5",
                "    ...2 more lines not shown",
            ]
        );
    }

    #[test]
    fn exit_reason_only_on_failure() {
        let failed = snapshot("b", 0, TaskStatus::Failed(ExitReason::Code(1)), &[], 0);
        let cancelled = snapshot("c", 1, TaskStatus::Cancelled, &[], 0);
        assert_eq!(status_line(&failed), "b [Failed ✗] 1");
        assert_eq!(status_line(&cancelled), "c [Cancelled]");
    }

    #[test]
    fn lines_are_cut_to_terminal_width() {
        let frame = build_frame(
            &[snapshot("task", 0, TaskStatus::Running, &["0123456789abcdef"], 0)],
            Some(11),
        );
        assert_eq!(frame[0], "task [Proc");
        assert_eq!(frame[1], "    012345");
    }

    #[test]
    fn wide_characters_count_double() {
        let mut line = "日本語".to_string();
        fit_width(&mut line, 5);
        assert_eq!(line, "日本");
    }
}
