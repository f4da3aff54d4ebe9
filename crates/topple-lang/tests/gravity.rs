//! Preprocessor tests: falling, grounding, and the editor-facing queries.

use topple_lang::gravity::{process, process_with_report, unsupported_positions, Grid};

fn assert_grounded(out: &str) {
    let grid = Grid::new(out);
    let Some(foundation) = grid.foundation_row() else {
        assert!(out.is_empty(), "no foundation but output is not empty: {out:?}");
        return;
    };
    for row in 0..foundation {
        for col in 0..grid.width() {
            if grid.get(row, col) != ' ' {
                assert!(grid.is_supported(row, col), "({row}, {col}) is floating in {out:?}");
            }
        }
    }
}

const PROGRAMS: &[&str] = &[
    "x = 10\n###",
    "x = 10\n######",
    "  x\n#",
    "ab\n\n\n#",
    "fun f() {\n   return 1\n}\ny = f()\n##########",
    "      hello\n  world\n\n ####",
    "a\n#\n  b\n c",
    "\"#\" x\n  ##",
    "",
];

#[test]
fn processing_is_idempotent() {
    for src in PROGRAMS {
        let once = process(src);
        assert_eq!(process(&once), once, "second pass changed {src:?}");
    }
}

#[test]
fn output_is_grounded() {
    for src in PROGRAMS {
        assert_grounded(&process(src));
    }
}

#[test]
fn full_width_foundation_keeps_line() {
    assert_eq!(process("x = 10\n######"), "x = 10\n######");
}

#[test]
fn overhang_past_foundation_falls_out() {
    // `10` sits two columns past the last `#`
    assert_eq!(process("x = 10\n###"), "x =\n###");
    assert_eq!(unsupported_positions("x = 10\n###"), vec![(0, 4), (0, 5)]);
}

#[test]
fn floating_char_beyond_foundation_falls_out() {
    assert_eq!(process("  x\n#"), "\n#");
}

#[test]
fn floating_line_lands_on_foundation() {
    assert_eq!(process("y = 2\n\n\n#####"), "\n\ny = 2\n#####");
}

#[test]
fn fall_is_straight_down_only() {
    // `b` would be diagonally supported once `a` lands, but its own column is empty
    assert_eq!(process("ab\n\n\n#"), "\n\na\n#");
}

#[test]
fn stacked_characters_keep_order() {
    let (out, report) = process_with_report("a\nb\nc\n\n\n#");
    assert_eq!(out, "\n\na\nb\nc\n#");
    assert_eq!(report.moved, 3);
    assert_eq!(report.dropped, 0);
}

#[test]
fn report_counts_dropped() {
    let (_, report) = process_with_report("   xy\n#");
    assert_eq!(report.dropped, 2);
    assert_eq!(report.moved, 0);
}

#[test]
fn tall_staircase_is_supported() {
    let height = 60;
    let lines: Vec<String> = (0..height).map(|i| format!("{}s", " ".repeat(height - i))).collect();
    // the bottom step is one column right of the `#`, each line above one further right
    let src = format!("{}\n#", lines.join("\n"));
    assert_eq!(process(&src), src);
    assert!(unsupported_positions(&src).is_empty());
}

#[test]
fn wide_unsupported_grid_terminates() {
    let row = "x".repeat(80);
    let src = format!("{}\n\n{}", vec![row.as_str(); 40].join("\n"), "#");
    let out = process(&src);
    assert_grounded(&out);
    // only column 0 has anything to land on
    assert_eq!(out.matches('x').count(), 40);
}

#[test]
fn quoted_hash_does_not_count_as_foundation() {
    assert_eq!(process("x = \"#\""), "");
    assert_eq!(Grid::new("#\nx = \"#\"").foundation_row(), Some(0));
}

#[test]
fn lines_below_foundation_are_untouched() {
    let src = "#\n   floating\n      everywhere";
    assert_eq!(process(src), src);
    assert!(unsupported_positions(src).is_empty());
}

#[test]
fn query_does_not_mutate() {
    let src = "ab  c\n##";
    let grid = Grid::new(src);
    assert_eq!(grid.unsupported_positions(), vec![(0, 4)]);
    assert_eq!(grid.render(), src);
}
