//! Test documents written to temporary files.
#![allow(dead_code)]

use std::io::{Cursor, Write};

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// A PDF with one page per content stream; `/F1` is Helvetica.
pub fn pdf(contents: &[Vec<u8>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.clone()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => contents.len() as i64,
            "MediaBox" => [0, 0, 612, 792].map(Object::Integer).to_vec(),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// A ruled two-row table: header `Course | Credits | Grade` and one course.
pub fn course_table(name: &str, credits: &str, grade: &str) -> Vec<u8> {
    format!(
        "0.5 w
        50 700 m 410 700 l S
        50 680 m 410 680 l S
        50 660 m 410 660 l S
        50 700 m 50 660 l S
        250 700 m 250 660 l S
        330 700 m 330 660 l S
        410 700 m 410 660 l S
        BT /F1 10 Tf
        1 0 0 1 55 686 Tm (Course) Tj
        1 0 0 1 255 686 Tm (Credits) Tj
        1 0 0 1 335 686 Tm (Grade) Tj
        1 0 0 1 55 666 Tm ({name}) Tj
        1 0 0 1 255 666 Tm ({credits}) Tj
        1 0 0 1 335 666 Tm ({grade}) Tj
        ET"
    )
    .into_bytes()
}

/// A `.docx` package whose body holds one table.
pub fn docx(rows: &[&[&str]]) -> Vec<u8> {
    let rows: String = rows
        .iter()
        .map(|cells| {
            let cells: String = cells
                .iter()
                .map(|c| format!("<w:tc><w:p><w:r><w:t>{c}</w:t></w:r></w:p></w:tc>"))
                .collect();
            format!("<w:tr>{cells}</w:tr>")
        })
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:tbl>{rows}</w:tbl></w:body></w:document>"#
    );

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

/// Write bytes to a temporary file with the given suffix.
pub fn write_temp(bytes: &[u8], suffix: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    f.write_all(bytes).unwrap();
    f.flush().unwrap();
    f
}
