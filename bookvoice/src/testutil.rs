//! Test fixtures: minimal EPUB containers built in memory.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Build a minimal EPUB from `(heading_html, body_text)` sections.
///
/// An empty `title` omits the dc:title element so metadata fallbacks can
/// be exercised. Pass `images` to embed extra image resources.
pub fn epub_fixture_with_images(
    title: &str,
    author: Option<&str>,
    sections: &[(&str, String)],
    images: &[(&str, Vec<u8>)],
) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default();

    // mimetype must come first, uncompressed
    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();

    zip.start_file("META-INF/container.xml", deflated).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
    )
    .unwrap();

    let title_meta = if title.is_empty() {
        String::new()
    } else {
        format!("<dc:title>{}</dc:title>", title)
    };
    let author_meta = author
        .map(|a| format!("<dc:creator>{}</dc:creator>", a))
        .unwrap_or_default();

    let mut manifest = String::new();
    let mut spine = String::new();
    for i in 0..sections.len() {
        manifest.push_str(&format!(
            "<item id=\"section{i}\" href=\"section{i}.xhtml\" media-type=\"application/xhtml+xml\"/>"
        ));
        spine.push_str(&format!("<itemref idref=\"section{i}\"/>"));
    }
    for (i, (name, _)) in images.iter().enumerate() {
        manifest.push_str(&format!(
            "<item id=\"img{i}\" href=\"{name}\" media-type=\"image/jpeg\"/>"
        ));
    }

    let opf = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/" unique-identifier="uid" version="2.0">
  <metadata>
    <dc:identifier id="uid">urn:uuid:00000000-0000-0000-0000-000000000000</dc:identifier>
    <dc:language>vi</dc:language>
    {title_meta}
    {author_meta}
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    {manifest}
  </manifest>
  <spine toc="ncx">
    {spine}
  </spine>
</package>"#
    );
    zip.start_file("OEBPS/content.opf", deflated).unwrap();
    zip.write_all(opf.as_bytes()).unwrap();

    zip.start_file("OEBPS/toc.ncx", deflated).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="urn:uuid:00000000-0000-0000-0000-000000000000"/></head>
  <docTitle><text>fixture</text></docTitle>
  <navMap>
    <navPoint id="n1" playOrder="1"><navLabel><text>1</text></navLabel><content src="section0.xhtml"/></navPoint>
  </navMap>
</ncx>"#,
    )
    .unwrap();

    for (i, (heading, body)) in sections.iter().enumerate() {
        let xhtml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>section</title></head>
<body>{heading}<p>{body}</p></body>
</html>"#
        );
        zip.start_file(format!("OEBPS/section{i}.xhtml"), deflated)
            .unwrap();
        zip.write_all(xhtml.as_bytes()).unwrap();
    }

    for (name, bytes) in images {
        zip.start_file(format!("OEBPS/{name}"), deflated).unwrap();
        zip.write_all(bytes).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Build a minimal EPUB without images.
pub fn epub_fixture(title: &str, author: Option<&str>, sections: &[(&str, String)]) -> Vec<u8> {
    epub_fixture_with_images(title, author, sections, &[])
}

/// Section body comfortably above the 100-char minimum.
pub fn long_section(n: usize) -> String {
    format!("Đây là nội dung của chương số {n}, kể về một chuyến phiêu lưu dài. ").repeat(4)
}
