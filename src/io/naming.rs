//! Output artifact naming.
//!
//! Batch inputs carry an iteration number after their last `_`, e.g.
//! `st_fwd_23074018_raw_4500027.events.jsonl`. The output name is built from
//! a fixed-width token taken from that position.

/// Placeholder replaced by the token in name templates.
pub const TOKEN_PLACEHOLDER: &str = "{token}";

/// Take `width` characters following the last `_` in `input`.
///
/// Without an `_` the token starts at the beginning of the identifier.
/// Shorter tails yield shorter tokens.
pub fn iteration_token(input: &str, width: usize) -> &str {
    let start = input.rfind('_').map_or(0, |i| i + 1);
    let tail = &input[start..];
    match tail.char_indices().nth(width) {
        Some((end, _)) => &tail[..end],
        None => tail,
    }
}

/// Interpolate the iteration token of `input` into `template`.
pub fn output_name(input: &str, template: &str, width: usize) -> String {
    template.replace(TOKEN_PLACEHOLDER, iteration_token(input, width))
}
