// sanitize.rs — Input cleanup applied before text is logged or echoed.

/// Strip control characters (keeping newline and tab) and truncate to at
/// most `max_len` characters.
///
/// This is independent of any allow/deny decision; it only makes text safe
/// to persist and display.
pub fn sanitize_input(input: &str, max_len: usize) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(max_len)
        .collect()
}
