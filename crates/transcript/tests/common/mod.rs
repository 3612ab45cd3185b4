//! Programmatic test documents.
#![allow(dead_code)]

use std::io::{Cursor, Write};

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// Build a PDF with one page per content stream.
///
/// `/F1` is Helvetica (one byte per character); `/F2` is a Type0 font with
/// the `UniCNS-UCS2-H` encoding, so its strings are UTF-16BE hex.
pub fn pdf(contents: &[Vec<u8>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();
    let helvetica = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let descendant = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType0",
        "BaseFont" => "MSung-Light",
        "DW" => Object::Integer(1000),
    });
    let cjk = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "MSung-Light",
        "Encoding" => "UniCNS-UCS2-H",
        "DescendantFonts" => vec![Object::Reference(descendant)],
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
                "Font" => dictionary! { "F1" => helvetica, "F2" => cjk },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

/// A ruled three-column table drawn with stroked lines, text in Helvetica.
///
/// The first row is the header. Rows are 20pt high starting at y=700.
pub fn ruled_table(rows: &[[&str; 3]]) -> Vec<u8> {
    let xs = [50.0, 250.0, 330.0, 410.0];
    let top = 700.0;
    let height = 20.0;
    let bottom = top - height * rows.len() as f64;

    let mut s = String::from("0.5 w\n");
    for i in 0..=rows.len() {
        let y = top - height * i as f64;
        s.push_str(&format!("{} {y} m {} {y} l S\n", xs[0], xs[3]));
    }
    for x in xs {
        s.push_str(&format!("{x} {top} m {x} {bottom} l S\n"));
    }
    s.push_str("BT /F1 10 Tf\n");
    for (i, row) in rows.iter().enumerate() {
        let y = top - height * (i as f64 + 1.0) + 6.0;
        for (j, cell) in row.iter().enumerate() {
            s.push_str(&format!("1 0 0 1 {} {y} Tm ({}) Tj\n", xs[j] + 5.0, escape(cell)));
        }
    }
    s.push_str("ET\n");
    s.into_bytes()
}

/// An empty grid of `lines` stroked horizontal and `lines` stroked vertical
/// rules, `step` points apart, starting at (10, 10).
pub fn dense_grid(lines: usize, step: f64) -> Vec<u8> {
    let far = 10.0 + step * (lines - 1) as f64;
    let mut s = String::from("0.5 w\n");
    for i in 0..lines {
        let at = 10.0 + step * i as f64;
        s.push_str(&format!("10 {at} m {far} {at} l S\n"));
        s.push_str(&format!("{at} 10 m {at} {far} l S\n"));
    }
    s.into_bytes()
}

/// Unruled text lines in the UCS-2 font, one line every 20pt from y=700.
pub fn text_lines(lines: &[&str]) -> Vec<u8> {
    text_lines_from(700.0, lines)
}

/// [`text_lines`] starting at baseline `top` instead.
pub fn text_lines_from(top: f64, lines: &[&str]) -> Vec<u8> {
    let mut s = String::from("BT /F2 10 Tf\n");
    for (i, line) in lines.iter().enumerate() {
        let y = top - 20.0 * i as f64;
        s.push_str(&format!("1 0 0 1 50 {y} Tm <{}> Tj\n", utf16_hex(line)));
    }
    s.push_str("ET\n");
    s.into_bytes()
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

fn utf16_hex(text: &str) -> String {
    text.encode_utf16().map(|u| format!("{u:04X}")).collect()
}

/// Build a `.docx` package around a `<w:body>` fragment.
pub fn docx(body: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", options)
        .expect("start content types");
    zip.write_all(content_types.as_bytes())
        .expect("write content types");
    zip.start_file("word/document.xml", options)
        .expect("start document");
    zip.write_all(document.as_bytes()).expect("write document");
    zip.finish().expect("finish archive").into_inner()
}

/// A Word table with one `<w:tr>` per row.
pub fn word_table(rows: &[&[&str]]) -> String {
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
    format!("<w:tbl>{rows}</w:tbl>")
}
