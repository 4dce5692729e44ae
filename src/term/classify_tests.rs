use super::*;

#[test]
fn valid_utf8_prefix_full_ascii() {
    assert_eq!(valid_utf8_prefix_len(b"hello"), 5);
}

#[test]
fn valid_utf8_prefix_truncated_multibyte_rune() {
    // "é" is 0xC3 0xA9; send only the lead byte.
    let data = [b'h', b'i', 0xC3];
    assert_eq!(valid_utf8_prefix_len(&data), 2);
}

#[test]
fn valid_utf8_prefix_complete_multibyte_rune() {
    let data = "hié".as_bytes();
    assert_eq!(valid_utf8_prefix_len(data), data.len());
}

#[test]
fn valid_utf8_prefix_all_continuation_bytes_is_zero() {
    let data = [0x80, 0x80, 0x80];
    assert_eq!(valid_utf8_prefix_len(&data), 0);
}

#[test]
fn width_and_height_parses_pair() {
    assert_eq!(get_width_and_height(b"80 24"), (80, 24));
}

#[test]
fn width_and_height_rejects_malformed() {
    assert_eq!(get_width_and_height(b"80"), (-1, -1));
    assert_eq!(get_width_and_height(b"80 24 1"), (-1, -1));
    assert_eq!(get_width_and_height(b"abc 24"), (-1, -1));
}

#[test]
fn bell_cr_tab_classification() {
    assert!(is_bell(&[7]));
    assert!(!is_bell(&[7, 7]));
    assert!(is_cr(&[13]));
    assert!(is_tab(&[9]));
}

#[test]
fn arrow_suffix_detection() {
    assert!(has_up_arrow_suffix(b"ls\x1b[A"));
    assert!(has_down_arrow_suffix(b"ls\x1b[B"));
    assert!(!has_up_arrow_suffix(b"ls"));
}

#[test]
fn escape_tab_completion_suppresses_bell_and_multi_candidate() {
    assert_eq!(escape_tab_completion(&[7]), Vec::<u8>::new());
    assert_eq!(escape_tab_completion(b"foo bar"), Vec::<u8>::new());
    assert_eq!(escape_tab_completion(b"foo.txt"), b"foo.txt");
    // trailing space (single candidate with a space appended) passes through.
    assert_eq!(escape_tab_completion(b"foo "), b"foo ");
}

#[test]
fn escape_history_command_suppresses_bell_only() {
    assert_eq!(escape_history_command(&[7]), Vec::<u8>::new());
    assert_eq!(escape_history_command(b"ls -la"), b"ls -la");
}
