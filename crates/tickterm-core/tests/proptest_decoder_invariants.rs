//! Property-based invariant tests for the input decoder.
//!
//! Verifies:
//! 1. Chunk invariance: any split of a byte stream decodes to the same events
//! 2. Chunk invariance holds for streams of well-formed sequences
//! 3. SGR mouse press reports exactly the button, position, and modifiers sent
//! 4. Printable text decodes to one Text event per character
//! 5. Modified cursor keys carry matching name prefixes and modifier bits
//! 6. Recovery: after flushing, a well-formed sequence always decodes
//! 7. Oversized sequences report an overflow and never suppress later input

use proptest::prelude::*;
use tickterm_core::event::{
    Event, KeyEvent, KeyEventKind, Modifiers, MouseEvent, MouseEventKind,
};
use tickterm_core::input_decoder::{DEFAULT_MAX_SEQUENCE_LEN, InputDecoder};

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_fragment() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        "[a-zA-Z0-9 ]{1,4}".prop_map(String::into_bytes),
        Just(b"\x1b[A".to_vec()),
        Just(b"\x1b[1;5C".to_vec()),
        Just(b"\x1b[3~".to_vec()),
        Just(b"\x1bOq".to_vec()),
        Just(b"\x1bx".to_vec()),
        Just(vec![0x03]),
        Just("é€😀".as_bytes().to_vec()),
        (0u16..96, 1u16..500, 1u16..500)
            .prop_map(|(b, x, y)| format!("\x1b[<{b};{x};{y}M").into_bytes()),
        (0u8..3, 1u8..200, 1u8..200).prop_map(|(b, x, y)| vec![
            0x1b,
            b'[',
            b'M',
            32 + b,
            32 + x,
            32 + y
        ]),
    ]
}

fn arb_stream() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(arb_fragment(), 0..16).prop_map(|parts| parts.concat())
}

fn decode_whole(bytes: &[u8]) -> Vec<Event> {
    let mut decoder = InputDecoder::new();
    decoder.parse(bytes)
}

fn decode_split(bytes: &[u8], cuts: &[usize]) -> Vec<Event> {
    let mut decoder = InputDecoder::new();
    let mut points: Vec<usize> = cuts
        .iter()
        .map(|c| if bytes.is_empty() { 0 } else { c % (bytes.len() + 1) })
        .collect();
    points.sort_unstable();
    let mut events = Vec::new();
    let mut start = 0;
    for point in points.into_iter().chain(std::iter::once(bytes.len())) {
        events.extend(decoder.parse(&bytes[start..point]));
        start = point;
    }
    events
}

fn xterm_modifiers(param: u8) -> Modifiers {
    let bits = param - 1;
    let mut mods = Modifiers::NONE;
    if bits & 1 != 0 {
        mods |= Modifiers::SHIFT;
    }
    if bits & 2 != 0 {
        mods |= Modifiers::ALT;
    }
    if bits & 4 != 0 {
        mods |= Modifiers::CTRL;
    }
    mods
}

proptest! {
    // 1
    #[test]
    fn arbitrary_bytes_are_chunk_invariant(
        bytes in prop::collection::vec(any::<u8>(), 0..256),
        cuts in prop::collection::vec(any::<usize>(), 0..8),
    ) {
        prop_assert_eq!(decode_whole(&bytes), decode_split(&bytes, &cuts));
    }

    // 2
    #[test]
    fn well_formed_streams_are_chunk_invariant(
        bytes in arb_stream(),
        cuts in prop::collection::vec(any::<usize>(), 0..8),
    ) {
        let whole = decode_whole(&bytes);
        prop_assert!(!bytes.is_empty() || whole.is_empty());
        prop_assert_eq!(whole, decode_split(&bytes, &cuts));
    }

    // 3
    #[test]
    fn sgr_press_reports_what_was_sent(
        button in 0u16..3,
        line in 1u16..=1000,
        column in 1u16..=1000,
        shift in any::<bool>(),
        alt in any::<bool>(),
        ctrl in any::<bool>(),
    ) {
        let code = button
            | if shift { 4 } else { 0 }
            | if alt { 8 } else { 0 }
            | if ctrl { 16 } else { 0 };
        let mut expected_mods = Modifiers::NONE;
        expected_mods.set(Modifiers::SHIFT, shift);
        expected_mods.set(Modifiers::ALT, alt);
        expected_mods.set(Modifiers::CTRL, ctrl);

        let events = decode_whole(format!("\x1b[<{code};{column};{line}M").as_bytes());
        let expected = MouseEvent::new(MouseEventKind::Press, (button + 1) as u8, line, column)
            .with_modifiers(expected_mods);
        prop_assert_eq!(events, vec![Event::Mouse(expected)]);
    }

    // 4
    #[test]
    fn printable_text_is_one_event_per_char(text in "[^\\p{Cc}]{0,32}") {
        let events = decode_whole(text.as_bytes());
        let expected: Vec<Event> = text
            .chars()
            .map(|c| Event::Key(KeyEvent::text(c)))
            .collect();
        prop_assert_eq!(events, expected);
    }

    // 5
    #[test]
    fn modified_cursor_keys(
        param in 2u8..=8,
        final_byte in prop::sample::select(vec![b'A', b'B', b'C', b'D', b'H', b'F']),
    ) {
        let events = decode_whole(&[&b"\x1b[1;"[..], &[b'0' + param, final_byte]].concat());
        let mods = xterm_modifiers(param);
        prop_assert_eq!(events.len(), 1);
        let Event::Key(key) = &events[0] else {
            return Err(TestCaseError::fail("expected a key event"));
        };
        prop_assert_eq!(key.kind, KeyEventKind::Key);
        prop_assert_eq!(key.modifiers, mods);
        prop_assert_eq!(key.text.starts_with("C-"), mods.contains(Modifiers::CTRL));
        prop_assert_eq!(key.text.contains("M-"), mods.contains(Modifiers::ALT));
        prop_assert_eq!(key.text.contains("S-"), mods.contains(Modifiers::SHIFT));
    }

    // 6
    #[test]
    fn recovers_after_garbage(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let mut decoder = InputDecoder::new();
        let _ = decoder.feed(&bytes);
        for _ in 0..8 {
            if !decoder.is_pending() {
                break;
            }
            decoder.flush_pending();
        }
        prop_assert!(!decoder.is_pending());
        decoder.events().for_each(drop);

        prop_assert_eq!(
            decoder.parse(b"\x1b[B"),
            vec![Event::Key(KeyEvent::key("Down"))]
        );
    }

    // 7
    #[test]
    fn oversized_sequences_never_suppress_later_input(extra in 1usize..512) {
        let mut decoder = InputDecoder::new();
        let mut bytes = b"\x1b[".to_vec();
        bytes.extend(std::iter::repeat_n(b'1', DEFAULT_MAX_SEQUENCE_LEN + extra));
        bytes.extend_from_slice(b"~z");

        let err = decoder.feed(&bytes).unwrap_err();
        prop_assert_eq!(err.limit, DEFAULT_MAX_SEQUENCE_LEN);
        prop_assert_eq!(
            decoder.events().collect::<Vec<_>>(),
            vec![Event::Key(KeyEvent::text("z"))]
        );
    }
}
