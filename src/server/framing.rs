//! Event-stream framing of relayed fragments.

/// Prefix of every data line written by the relay.
pub const DATA_MARKER: &str = "data: ";

/// Frame one fragment as a single event.
///
/// Every line of the fragment becomes its own `data:` line and the event is
/// closed by a blank line, so `"4"` is framed as `"data: 4\n\n"`. A carriage
/// return right before a line break (or at the end of the fragment) is
/// dropped, since a reader takes it as part of the line terminator. Other
/// carriage returns pass through.
pub fn encode_frame(fragment: &str) -> String {
    let mut frame = String::with_capacity(fragment.len() + DATA_MARKER.len() + 2);
    for line in fragment.split('\n') {
        frame.push_str(DATA_MARKER);
        frame.push_str(line.strip_suffix('\r').unwrap_or(line));
        frame.push('\n');
    }
    frame.push('\n');
    frame
}
