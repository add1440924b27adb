use std::fs;
use std::path::MAIN_SEPARATOR;

use backtrace::Backtrace;
use serde::Serialize;

/// One resolved stack frame.
///
/// Symbol resolution is best-effort: any field may be missing in stripped or
/// heavily optimized builds, so each is optional and the renderer decides
/// what to do with incomplete frames.
#[derive(Debug, Clone, Serialize)]
pub struct StackFrame {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub function: Option<String>,
    /// Text of the source line, looked up from the file at capture time.
    pub source: Option<String>,
}

impl StackFrame {
    /// Frames belonging to the backtrace machinery or to the capture
    /// function itself; these sit above the caller and never get reported.
    fn is_capture_internal(&self) -> bool {
        self.function
            .as_deref()
            .is_some_and(|name| name.starts_with("backtrace::") || name.contains("capture_stack"))
    }
}

// ─── Capture ─────────────────────────────────────────────────────

/// Captures the current call stack, innermost frame first.
///
/// The backtrace machinery and this function's own frame are always
/// dropped; `skip_frames` additionally discards that many wrapper frames
/// on top, so index 0 of the result is the wrapper's caller.
pub fn capture_stack(skip_frames: usize) -> Vec<StackFrame> {
    let backtrace = Backtrace::new();

    let mut frames = Vec::new();
    for frame in backtrace.frames() {
        for symbol in frame.symbols() {
            let file = symbol.filename().map(|p| p.display().to_string());
            let line = symbol.lineno();
            let source = match (&file, line) {
                (Some(file), Some(line)) => source_line(file, line),
                _ => None,
            };
            frames.push(StackFrame {
                file,
                line,
                function: symbol.name().map(|n| n.to_string()),
                source,
            });
        }
    }

    let machinery = frames
        .iter()
        .position(|f| !f.is_capture_internal())
        .unwrap_or(frames.len());
    let trim = (machinery + skip_frames).min(frames.len());
    frames.split_off(trim)
}

/// Best-effort lookup of one source line (1-based), trimmed.
fn source_line(file: &str, line: u32) -> Option<String> {
    let text = fs::read_to_string(file).ok()?;
    text.lines()
        .nth(line.checked_sub(1)? as usize)
        .map(|l| l.trim().to_string())
}

// ─── Rendering ───────────────────────────────────────────────────

/// Renders a frame sequence into a display string safe for embedding in
/// markup: every field is escaped, frames are joined with newlines, and
/// each complete frame becomes a two-line entry of the form
///
/// ```text
/// <directory>/<file> in <function>(<line>)
///   <source line>
/// ```
///
/// Frames missing file, line, or function are skipped; a frame without
/// source text renders as its first line only. Pure and idempotent.
pub fn render_stacktrace(frames: &[StackFrame]) -> String {
    let mut entries = Vec::with_capacity(frames.len());

    for frame in frames {
        let (Some(file), Some(line), Some(function)) = (&frame.file, frame.line, &frame.function)
        else {
            continue;
        };

        let (dir, name) = match file.rsplit_once(MAIN_SEPARATOR) {
            Some((dir, name)) => (dir, name),
            None => ("", file.as_str()),
        };

        let mut entry = format!(
            "{}{}{} in {}({})",
            escape(dir),
            if dir.is_empty() { "" } else { "/" },
            escape(name),
            escape(function),
            line,
        );
        if let Some(source) = &frame.source {
            entry.push_str("\n  ");
            entry.push_str(&escape(source));
        }
        entries.push(entry);
    }

    entries.join("\n")
}

fn escape(text: &str) -> String {
    html_escape::encode_safe(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(
        file: Option<&str>,
        line: Option<u32>,
        function: Option<&str>,
        source: Option<&str>,
    ) -> StackFrame {
        StackFrame {
            file: file.map(String::from),
            line,
            function: function.map(String::from),
            source: source.map(String::from),
        }
    }

    #[test]
    fn renders_two_line_entries() {
        let frames = vec![frame(
            Some("/app/src/views.rs"),
            Some(42),
            Some("app::views::index"),
            Some("let user = cache.get(key);"),
        )];

        assert_eq!(
            render_stacktrace(&frames),
            "/app/src/views.rs in app::views::index(42)\n  let user = cache.get(key);"
        );
    }

    #[test]
    fn incomplete_frames_are_skipped() {
        let frames = vec![
            frame(None, Some(1), Some("a"), None),
            frame(Some("/app/lib.rs"), Some(7), Some("app::run"), None),
            frame(Some("/app/lib.rs"), None, Some("app::other"), None),
        ];

        assert_eq!(render_stacktrace(&frames), "/app/lib.rs in app::run(7)");
    }

    #[test]
    fn fields_are_escaped() {
        let frames = vec![frame(
            Some("/app/src/views.rs"),
            Some(3),
            Some("app::compare::<u8>"),
            Some("if a < b && c > d {"),
        )];

        let rendered = render_stacktrace(&frames);
        assert!(rendered.contains("app::compare::&lt;u8&gt;"));
        assert!(rendered.contains("if a &lt; b &amp;&amp; c &gt; d {"));
        assert!(!rendered.contains("<u8>"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let frames = vec![
            frame(Some("/a/b.rs"), Some(1), Some("x::y"), Some("y();")),
            frame(Some("/a/c.rs"), Some(2), Some("x::z"), None),
        ];

        assert_eq!(render_stacktrace(&frames), render_stacktrace(&frames));
    }

    #[test]
    fn capture_yields_frames() {
        let frames = capture_stack(0);
        assert!(!frames.is_empty());
    }
}
