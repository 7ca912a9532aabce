#![no_main]
use libfuzzer_sys::fuzz_target;
use docencode::{Boundary, CopyEncoder, Document, DocumentEncoder, EncoderFlags, Range, Selection};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let (knobs, rest) = data.split_at(3);
    let Ok(s) = std::str::from_utf8(rest) else {
        return;
    };
    let Ok(doc) = Document::parse_html(s) else {
        return;
    };
    let flags = EncoderFlags::from_bits_truncate(u32::from(knobs[0]));
    let nodes: Vec<_> = doc.descendants(doc.root()).collect();
    if nodes.is_empty() {
        return;
    }

    // Whole document, then a range between two arbitrary points; neither
    // may panic and a failed promotion must be an error, not a crash.
    let mut encoder = DocumentEncoder::new();
    encoder.init(&doc, "text/html", flags);
    let _ = encoder.encode();

    let start = nodes[usize::from(knobs[1]) % nodes.len()];
    let end = nodes[usize::from(knobs[2]) % nodes.len()];
    let range = Range::new(
        Boundary::new(start, usize::from(knobs[1] >> 4)),
        Boundary::new(end, usize::from(knobs[2] >> 4)),
    );
    let mut copy = CopyEncoder::new();
    copy.init(&doc, "text/html", flags);
    if copy.set_selection(&Selection::from(range)).is_ok() {
        let _ = copy.encode_with_context();
    }
});
