#![allow(dead_code)]

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use std::io::Cursor;
use std::path::Path;

pub fn rationals(values: &[(u32, u32)]) -> Value {
    Value::Rational(
        values
            .iter()
            .map(|&(num, denom)| Rational { num, denom })
            .collect(),
    )
}

pub fn ascii(text: &str) -> Value {
    Value::Ascii(vec![text.as_bytes().to_vec()])
}

pub fn field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

/// Tags of a picture taken at 47°42'36" N, 2°9'36" W.
pub fn geotagged(taken: &str, sub_second: Option<&str>) -> Vec<Field> {
    let mut fields = vec![
        field(Tag::GPSLatitudeRef, ascii("N")),
        field(Tag::GPSLatitude, rationals(&[(47, 1), (42, 1), (36, 1)])),
        field(Tag::GPSLongitudeRef, ascii("W")),
        field(Tag::GPSLongitude, rationals(&[(2, 1), (9, 1), (3600, 100)])),
        field(Tag::DateTimeOriginal, ascii(taken)),
    ];
    if let Some(sub_second) = sub_second {
        fields.push(field(Tag::SubSecTimeOriginal, ascii(sub_second)));
    }
    fields
}

/// Writes a minimal JPEG: SOI, an EXIF APP1 segment holding `fields`, EOI.
pub fn write_jpeg(path: &Path, fields: &[Field]) {
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).expect("encode exif");
    let tiff = tiff.into_inner();

    let mut app1 = b"Exif\0\0".to_vec();
    app1.extend_from_slice(&tiff);
    let segment_len = u16::try_from(app1.len() + 2).expect("exif fits in one segment");

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&segment_len.to_be_bytes());
    jpeg.extend_from_slice(&app1);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, jpeg).expect("write jpeg");
}

/// A JPEG with no EXIF segment at all.
pub fn write_plain_jpeg(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, [0xFF, 0xD8, 0xFF, 0xD9]).expect("write jpeg");
}
