//! Tests for the SSE decoder

use super::*;

#[test]
fn test_single_event() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"event: ping\ndata: {\"type\":\"ping\"}\n\n");

    assert_eq!(events, vec![SseEvent::with_type("ping", "{\"type\":\"ping\"}")]);
    assert!(!decoder.has_remaining());
}

#[test]
fn test_event_split_across_reads() {
    let mut decoder = SseDecoder::new();

    assert!(decoder.feed(b"event: message_start\nda").is_empty());
    assert!(decoder.feed(b"ta: {\"a\":").is_empty());
    let events = decoder.feed(b"1}\n\ndata: [DONE]\n\n");

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type.as_deref(), Some("message_start"));
    assert_eq!(events[0].data, "{\"a\":1}");
    assert!(events[1].is_done());
}

#[test]
fn test_utf8_character_split_across_reads() {
    let payload = "data: {\"text\":\"héllo 世界\"}\n\n".as_bytes();
    // Cut inside the three-byte '世'
    let cut = payload
        .windows(3)
        .position(|w| w == "世".as_bytes())
        .unwrap()
        + 1;

    let mut decoder = SseDecoder::new();
    assert!(decoder.feed(&payload[..cut]).is_empty());
    let events = decoder.feed(&payload[cut..]);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "{\"text\":\"héllo 世界\"}");
}

#[test]
fn test_invalid_byte_keeps_trailing_split_character() {
    let mut decoder = SseDecoder::new();
    let mut first = b"data: a\xFFb ".to_vec();
    // First two bytes of '世'
    first.extend_from_slice(&"世".as_bytes()[..2]);

    assert!(decoder.feed(&first).is_empty());
    let mut second = "世".as_bytes()[2..].to_vec();
    second.extend_from_slice(b"\n\n");
    let events = decoder.feed(&second);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "a\u{FFFD}b 世");
}

#[test]
fn test_split_utf8_replaces_each_invalid_sequence() {
    let (text, rest) = split_utf8(b"x\xC0y\xFFz\xE4");

    assert_eq!(text, "x\u{FFFD}y\u{FFFD}z");
    assert_eq!(rest, vec![0xE4]);
}

#[test]
fn test_every_byte_boundary() {
    let payload = "event: a\ndata: ünï\n\nevent: b\ndata: 2\n\n".as_bytes();
    for cut in 0..payload.len() {
        let mut decoder = SseDecoder::new();
        let mut events = decoder.feed(&payload[..cut]);
        events.extend(decoder.feed(&payload[cut..]));
        assert_eq!(events.len(), 2, "cut at {}", cut);
        assert_eq!(events[0].data, "ünï");
        assert_eq!(events[1].event_type.as_deref(), Some("b"));
    }
}

#[test]
fn test_crlf_delimiters() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"event: a\r\ndata: 1\r\n\r\nevent: b\r\ndata: 2\r\n\r\n");

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type.as_deref(), Some("a"));
    assert_eq!(events[0].data, "1");
    assert_eq!(events[1].data, "2");
}

#[test]
fn test_multiline_data_and_comments() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b": keep-alive\n\ndata: line one\ndata: line two\nid: 7\n\n");

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "line one\nline two");
    assert_eq!(events[0].id.as_deref(), Some("7"));
}

#[test]
fn test_finish_flushes_unterminated_event() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.feed(b"data: tail").is_empty());
    assert!(decoder.has_remaining());

    assert_eq!(decoder.finish(), Some(SseEvent::new("tail")));
    assert!(!decoder.has_remaining());
    assert_eq!(decoder.finish(), None);
}

#[test]
fn test_clear() {
    let mut decoder = SseDecoder::new();
    decoder.feed(b"data: partial");
    decoder.clear();
    assert_eq!(decoder.remaining(), "");
}
