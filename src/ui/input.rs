/// Whether the typed text may be sent.
///
/// Blank input is never sent, and only one reply streams at a time.
pub fn can_submit(input: &str, loading: bool) -> bool {
    !loading && !input.trim().is_empty()
}

pub fn send_label(loading: bool) -> &'static str {
    if loading {
        "Sending..."
    } else {
        "Send"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_is_rejected() {
        assert!(!can_submit("", false));
        assert!(!can_submit(" \n\t", false));
        assert!(can_submit("2+2", false));
    }

    #[test]
    fn nothing_is_sent_while_loading() {
        assert!(!can_submit("2+2", true));
        assert_eq!(send_label(true), "Sending...");
        assert_eq!(send_label(false), "Send");
    }
}
