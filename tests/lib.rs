//! Tests for format detection and the top-level strip() dispatcher.

use metastrip::{
    detect_format, format_for_media_type, sniff, strip, strip_batch, strip_with_options,
    suggested_file_name, ErrorKind, ImageFormat, StripOptions,
};

const PNG_SIG: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

fn png_chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    v.extend_from_slice(tag);
    v.extend_from_slice(payload);
    v.extend_from_slice(&[0xA1, 0xB2, 0xC3, 0xD4]);
    v
}

fn minimal_png() -> Vec<u8> {
    let mut v = PNG_SIG.to_vec();
    v.extend(png_chunk(b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0]));
    v.extend(png_chunk(b"tEXt", b"Comment\0secret"));
    v.extend(png_chunk(b"IDAT", &[0x78, 0x9C, 0x63, 0x60, 0x00, 0x00]));
    v.extend(png_chunk(b"IEND", &[]));
    v
}

fn minimal_jpeg() -> Vec<u8> {
    vec![
        0xFF, 0xD8, // SOI
        0xFF, 0xFE, 0x00, 0x06, b'n', b'o', b't', b'e', // COM
        0xFF, 0xDB, 0x00, 0x03, 0x00, // DQT
        0xFF, 0xDA, 0x00, 0x02, // SOS
        0x11, 0x22, 0x33, // scan
        0xFF, 0xD9, // EOI
    ]
}

#[test]
fn detect_png() {
    assert_eq!(detect_format(&PNG_SIG), ImageFormat::Png);
}

#[test]
fn detect_jpeg() {
    assert_eq!(detect_format(&[0xFF, 0xD8]), ImageFormat::Jpeg);
}

#[test]
fn detect_unknown() {
    assert_eq!(detect_format(&[0u8; 8]), ImageFormat::Unrecognized);
    assert_eq!(detect_format(&PNG_SIG[..4]), ImageFormat::Unrecognized);
    assert_eq!(detect_format(&[]), ImageFormat::Unrecognized);
}

#[test]
fn media_type_normalization() {
    assert_eq!(format_for_media_type("image/png"), Some(ImageFormat::Png));
    assert_eq!(format_for_media_type(" IMAGE/JPEG ; q=1"), Some(ImageFormat::Jpeg));
    assert_eq!(format_for_media_type("image/jpg"), Some(ImageFormat::Jpeg));
    assert_eq!(format_for_media_type("image/gif"), None);
}

#[test]
fn declared_type_needs_matching_signature() {
    let jpeg = minimal_jpeg();
    assert_eq!(sniff(&jpeg, Some("image/png")), ImageFormat::Jpeg);
    assert_eq!(sniff(&jpeg, Some("image/jpeg")), ImageFormat::Jpeg);
    assert_eq!(sniff(b"hello world", Some("image/png")), ImageFormat::Unrecognized);
    assert_eq!(sniff(&minimal_png(), None), ImageFormat::Png);
}

#[test]
fn empty_input() {
    let err = strip(&[], Some("image/png"), Some("a.png")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputEmpty);
}

#[test]
fn plain_text_is_unsupported() {
    let err = strip(b"hello world", None, Some("notes.txt")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    let msg = err.to_string();
    assert!(msg.contains("PNG") && msg.contains("JPEG"), "{}", msg);
}

#[test]
fn input_size_ceiling() {
    let png = minimal_png();
    let options = StripOptions {
        max_input_size: Some(png.len() - 1),
        ..Default::default()
    };
    let err = strip_with_options(&png, None, None, &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputTooLarge);
    assert!(strip_with_options(&png, None, None, &StripOptions::unbounded()).is_ok());
}

#[test]
fn png_result_fields() {
    let cleaned = strip(&minimal_png(), Some("image/png"), Some("shot.png")).unwrap();
    assert_eq!(cleaned.format, ImageFormat::Png);
    assert_eq!(cleaned.media_type, "image/png");
    assert_eq!(cleaned.file_name, "cleaned_shot.png");
    assert_eq!(cleaned.report.bytes_out, cleaned.data.len());
}

#[test]
fn jpg_alias_gives_canonical_type() {
    let cleaned = strip(&minimal_jpeg(), Some("image/jpg"), Some("p.jpg")).unwrap();
    assert_eq!(cleaned.media_type, "image/jpeg");
    assert_eq!(cleaned.file_name, "cleaned_p.jpg");
}

#[test]
fn mismatched_declared_type_still_strips() {
    let cleaned = strip(&minimal_png(), Some("image/jpeg"), None).unwrap();
    assert_eq!(cleaned.media_type, "image/png");
    assert_eq!(cleaned.file_name, "cleaned_image");
}

#[test]
fn file_name_suggestions() {
    assert_eq!(suggested_file_name(Some("a.png"), "cleaned_"), "cleaned_a.png");
    assert_eq!(suggested_file_name(Some("dir/sub/a.png"), "cleaned_"), "cleaned_a.png");
    assert_eq!(suggested_file_name(Some("C:\\pics\\b.jpg"), "x_"), "x_b.jpg");
    assert_eq!(suggested_file_name(Some(""), "cleaned_"), "cleaned_image");
    assert_eq!(suggested_file_name(Some("dir/"), "cleaned_"), "cleaned_image");
    assert_eq!(suggested_file_name(None, "cleaned_"), "cleaned_image");
}

#[test]
fn custom_prefix() {
    let options = StripOptions {
        file_name_prefix: "clean-".to_string(),
        ..Default::default()
    };
    let cleaned = strip_with_options(&minimal_jpeg(), None, Some("x.jpeg"), &options).unwrap();
    assert_eq!(cleaned.file_name, "clean-x.jpeg");
}

#[test]
fn batch_keeps_order_and_errors() {
    let items = vec![
        ("a.png".to_string(), minimal_png()),
        ("b.txt".to_string(), b"hello world".to_vec()),
        ("c.jpg".to_string(), minimal_jpeg()),
    ];
    let out = strip_batch(items, &StripOptions::default());
    assert_eq!(out.len(), 3);
    assert_eq!(out[0].id, "a.png");
    assert_eq!(out[0].result.as_ref().unwrap().file_name, "cleaned_a.png");
    assert_eq!(
        out[1].result.as_ref().unwrap_err().kind(),
        ErrorKind::UnsupportedFormat
    );
    assert_eq!(out[2].result.as_ref().unwrap().media_type, "image/jpeg");
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_batch_matches_sequential() {
    let items = vec![
        ("a.png".to_string(), minimal_png()),
        ("c.jpg".to_string(), minimal_jpeg()),
    ];
    let seq = strip_batch(items.clone(), &StripOptions::default());
    let par = metastrip::strip_batch_parallel(items, &StripOptions::default());
    for (s, p) in seq.iter().zip(par.iter()) {
        assert_eq!(s.id, p.id);
        assert_eq!(s.result.as_ref().unwrap().data, p.result.as_ref().unwrap().data);
    }
}
