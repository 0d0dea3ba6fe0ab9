//! Keep only the lines of a preprocessed stream that belong to one file.
//!
//! Preprocessor output interleaves every included file and marks each switch with a
//! line marker (`# 12 "serial.h" 1`). [`LineFilter`] tracks one flag: whether the most
//! recent marker named a file other than the target. Marker lines are never emitted.

use pest::Parser;
use pest_derive::Parser as PestParser;
use std::io::{self, BufRead, Write};

#[derive(PestParser)]
#[grammar = "marker.pest"]
struct MarkerParser;

/// File name recorded by a line marker, or `None` if `line` is not a marker.
pub fn marker_file(line: &str) -> Option<String> {
    let marker = MarkerParser::parse(Rule::marker, line).ok()?.next()?;
    marker
        .into_inner()
        .find(|p| p.as_rule() == Rule::file_name)
        .map(|p| p.as_str().to_string())
}

#[derive(Debug, Clone)]
pub struct LineFilter {
    target: String,
    suppressing: bool,
}

impl LineFilter {
    pub fn new(target: impl Into<String>) -> Self {
        LineFilter {
            target: target.into(),
            suppressing: false,
        }
    }

    pub fn is_suppressing(&self) -> bool {
        self.suppressing
    }

    /// Returns the line if it should be emitted.
    pub fn feed<'a>(&mut self, line: &'a str) -> Option<&'a str> {
        if line.starts_with('#') {
            if let Some(file) = marker_file(line) {
                self.suppressing = file != self.target;
                return None;
            }
        }
        if self.suppressing {
            None
        } else {
            Some(line)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub lines_read: usize,
    pub lines_written: usize,
    pub markers: usize,
}

/// Filter `reader` into `writer`, keeping line endings byte for byte.
pub fn filter_stream<R: BufRead, W: Write>(
    target: &str,
    mut reader: R,
    mut writer: W,
) -> io::Result<FilterStats> {
    let mut filter = LineFilter::new(target);
    let mut stats = FilterStats::default();
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        stats.lines_read += 1;
        let line = String::from_utf8_lossy(&raw);
        if line.starts_with('#') && marker_file(&line).is_some() {
            stats.markers += 1;
        }
        if filter.feed(&line).is_some() {
            writer.write_all(&raw)?;
            stats.lines_written += 1;
        }
    }
    writer.flush()?;
    log::debug!(
        "filter {}: {} of {} lines kept, {} markers",
        target,
        stats.lines_written,
        stats.lines_read,
        stats.markers
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_forms() {
        assert_eq!(marker_file("# 1 \"serial.h\"\n").as_deref(), Some("serial.h"));
        assert_eq!(marker_file("# 12 \"/usr/include/stdint.h\" 1 3 4").as_deref(), Some("/usr/include/stdint.h"));
        assert_eq!(marker_file("#line 7 \"a.c\"").as_deref(), Some("a.c"));
        assert_eq!(marker_file("#pragma once"), None);
        assert_eq!(marker_file("#define X 1"), None);
        assert_eq!(marker_file("int x;"), None);
    }

    #[test]
    fn keeps_only_target_sections() {
        let src = "\
# 1 \"serial.c\"
int before;
# 1 \"stdint.h\" 1
typedef int int32_t;
# 3 \"serial.c\" 2
struct S { int a; };
";
        let mut out = Vec::new();
        let stats = filter_stream("serial.c", src.as_bytes(), &mut out).expect("filter");
        assert_eq!(String::from_utf8(out).expect("utf8"), "int before;\nstruct S { int a; };\n");
        assert_eq!(stats.markers, 3);
        assert_eq!(stats.lines_read, 6);
        assert_eq!(stats.lines_written, 2);
    }

    #[test]
    fn lines_before_any_marker_pass_through() {
        let mut f = LineFilter::new("a.c");
        assert_eq!(f.feed("x\n"), Some("x\n"));
        assert_eq!(f.feed("# 1 \"b.h\"\n"), None);
        assert!(f.is_suppressing());
        assert_eq!(f.feed("y\n"), None);
        assert_eq!(f.feed("# 2 \"a.c\"\n"), None);
        assert!(!f.is_suppressing());
    }

    #[test]
    fn non_marker_directives_are_ordinary_lines() {
        let mut f = LineFilter::new("a.c");
        assert_eq!(f.feed("#pragma pack(1)\n"), Some("#pragma pack(1)\n"));
    }
}
