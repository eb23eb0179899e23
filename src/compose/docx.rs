//! Minimal WordprocessingML (DOCX) emitter.
//!
//! Builds the output artifact as an ordered sequence of body elements plus
//! header/footer parts, then packages everything into the OOXML zip
//! container in one pass. Page numbers and the table of contents are
//! written as unresolved field codes; the consuming viewer resolves them
//! on refresh. That two-phase contract is deliberate: final pagination is
//! only known to the rendering engine that lays the document out.

use std::io::{Cursor, Write};

use super::ComposeError;

/// EMUs per pixel at the 96 dpi Word assumes for raster images.
const EMU_PER_PIXEL: u64 = 9525;

/// Embedded chart/image width on the page: 6 inches.
pub const BODY_IMAGE_WIDTH_EMU: u64 = 5_486_400;

/// Cover logo width: 1.8 inches.
pub const COVER_LOGO_WIDTH_EMU: u64 = 1_645_920;

/// Header logo width: 1 inch.
pub const HEADER_LOGO_WIDTH_EMU: u64 = 914_400;

const WORD_NS: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#
);

/// Letter page with one-inch margins, in twips.
const PAGE_SIZE: &str = r#"<w:pgSz w:w="12240" w:h="15840"/>"#;
const PAGE_MARGINS: &str = concat!(
    r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" "#,
    r#"w:header="720" w:footer="720" w:gutter="0"/>"#
);

/// An image part carried in `word/media/`.
struct Media {
    file_name: String,
    bytes: Vec<u8>,
}

struct HeaderSpec {
    organization: String,
    /// Index into `media` for the header logo, if any.
    logo: Option<usize>,
    logo_extent: Option<(u64, u64)>,
}

/// The output artifact under construction. Owned exclusively by the
/// composer; serialized once and then discarded.
pub struct ReportDocument {
    body: String,
    media: Vec<Media>,
    /// Document-part relationship ids for media, parallel to `media`.
    media_rel: Vec<String>,
    header: Option<HeaderSpec>,
    footer_text: Option<String>,
    next_drawing_id: u64,
}

impl ReportDocument {
    pub fn new() -> ReportDocument {
        ReportDocument {
            body: String::new(),
            media: Vec::new(),
            media_rel: Vec::new(),
            header: None,
            footer_text: None,
            next_drawing_id: 1,
        }
    }

    /// Level-1 heading; picked up by the TOC field via outline level.
    pub fn add_heading(&mut self, text: &str) {
        self.body.push_str(&format!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            escape_xml(text)
        ));
    }

    /// Plain body paragraph.
    pub fn add_paragraph(&mut self, text: &str) {
        self.body.push_str(&format!(
            r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            escape_xml(text)
        ));
    }

    /// Centered paragraph with explicit size (half-points) and weight;
    /// used for cover-page lines.
    pub fn add_cover_line(&mut self, text: &str, half_points: u32, bold: bool) {
        let bold_tag = if bold { "<w:b/>" } else { "" };
        self.body.push_str(&format!(
            concat!(
                r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr>"#,
                r#"<w:r><w:rPr>{}<w:sz w:val="{}"/><w:color w:val="1B1B70"/></w:rPr>"#,
                r#"<w:t xml:space="preserve">{}</w:t></w:r></w:p>"#
            ),
            bold_tag,
            half_points,
            escape_xml(text)
        ));
    }

    pub fn add_page_break(&mut self) {
        self.body
            .push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
    }

    /// Table-of-contents placeholder: an updatable TOC field, not
    /// precomputed page numbers.
    pub fn add_toc_field(&mut self) {
        self.body.push_str(concat!(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr>"#,
            r#"<w:r><w:rPr><w:b/><w:sz w:val="32"/></w:rPr>"#,
            r#"<w:t>Table of Contents</w:t></w:r></w:p>"#
        ));
        self.body.push_str(concat!(
            r#"<w:p><w:fldSimple w:instr=" TOC \o &quot;1-1&quot; \h \z \u " w:dirty="true">"#,
            r#"<w:r><w:t>Update this field to generate the table of contents.</w:t></w:r>"#,
            r#"</w:fldSimple></w:p>"#
        ));
    }

    /// Embed a PNG/JPEG image as a centered paragraph, scaled to
    /// `width_emu` preserving the pixel aspect ratio.
    pub fn add_image(&mut self, bytes: Vec<u8>, ext: &str, px: (u32, u32), width_emu: u64) {
        let rel = self.register_media(bytes, ext);
        let (cx, cy) = scaled_extent(px, width_emu);
        let drawing = self.inline_drawing(&rel, cx, cy);
        self.body.push_str(&format!(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r>{}</w:r></w:p>"#,
            drawing
        ));
    }

    /// Bordered data table with a bold header row.
    pub fn add_table(&mut self, headers: &[&str], rows: &[Vec<String>]) {
        let mut xml = String::from(concat!(
            r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/>"#,
            r#"<w:tblBorders>"#,
            r#"<w:top w:val="single" w:sz="4" w:color="999999"/>"#,
            r#"<w:left w:val="single" w:sz="4" w:color="999999"/>"#,
            r#"<w:bottom w:val="single" w:sz="4" w:color="999999"/>"#,
            r#"<w:right w:val="single" w:sz="4" w:color="999999"/>"#,
            r#"<w:insideH w:val="single" w:sz="4" w:color="999999"/>"#,
            r#"<w:insideV w:val="single" w:sz="4" w:color="999999"/>"#,
            r#"</w:tblBorders></w:tblPr>"#
        ));

        // The schema requires a grid declaring one column per cell.
        xml.push_str("<w:tblGrid>");
        for _ in headers {
            xml.push_str(r#"<w:gridCol w:w="2880"/>"#);
        }
        xml.push_str("</w:tblGrid>");

        xml.push_str("<w:tr>");
        for header in headers {
            xml.push_str(&format!(
                r#"<w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r></w:p></w:tc>"#,
                escape_xml(header)
            ));
        }
        xml.push_str("</w:tr>");

        for row in rows {
            xml.push_str("<w:tr>");
            for cell in row {
                xml.push_str(&format!(
                    r#"<w:tc><w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p></w:tc>"#,
                    escape_xml(cell)
                ));
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
        // A table must be followed by a paragraph to be well-formed at
        // the end of a body or cell.
        xml.push_str("<w:p/>");
        self.body.push_str(&xml);
    }

    /// Close the cover section: everything before this carries no
    /// header/footer; everything after gets them with numbering from 1.
    pub fn end_cover_section(&mut self) {
        self.body.push_str(&format!(
            r#"<w:p><w:pPr><w:sectPr>{}{}</w:sectPr></w:pPr></w:p>"#,
            PAGE_SIZE, PAGE_MARGINS
        ));
    }

    /// Per-page header: branding image (when available), organization
    /// name, and an unresolved PAGE field.
    pub fn set_header(&mut self, organization: &str, logo: Option<(Vec<u8>, String, (u32, u32))>) {
        let (logo_index, logo_extent) = match logo {
            Some((bytes, ext, px)) => {
                self.register_media(bytes, &ext);
                (
                    Some(self.media.len() - 1),
                    Some(scaled_extent(px, HEADER_LOGO_WIDTH_EMU)),
                )
            }
            None => (None, None),
        };
        self.header = Some(HeaderSpec {
            organization: organization.to_string(),
            logo: logo_index,
            logo_extent,
        });
    }

    pub fn set_footer(&mut self, text: &str) {
        self.footer_text = Some(text.to_string());
    }

    /// Package all parts into DOCX bytes. The caller owns writing them to
    /// disk so that nothing is left behind on failure.
    pub fn serialize(self) -> Result<Vec<u8>, ComposeError> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::FileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);

            let write_part = |zip: &mut zip::ZipWriter<&mut Cursor<Vec<u8>>>,
                                  name: &str,
                                  content: &[u8]|
             -> Result<(), ComposeError> {
                zip.start_file(name, options)?;
                zip.write_all(content)?;
                Ok(())
            };

            write_part(&mut zip, "[Content_Types].xml", self.content_types().as_bytes())?;
            write_part(&mut zip, "_rels/.rels", package_rels().as_bytes())?;
            write_part(&mut zip, "word/document.xml", self.document_xml().as_bytes())?;
            write_part(
                &mut zip,
                "word/_rels/document.xml.rels",
                self.document_rels().as_bytes(),
            )?;
            write_part(&mut zip, "word/styles.xml", styles_xml().as_bytes())?;

            if let Some(ref header) = self.header {
                write_part(&mut zip, "word/header1.xml", self.header_xml(header).as_bytes())?;
                write_part(
                    &mut zip,
                    "word/_rels/header1.xml.rels",
                    self.header_rels(header).as_bytes(),
                )?;
            }
            if self.footer_text.is_some() {
                write_part(&mut zip, "word/footer1.xml", self.footer_xml().as_bytes())?;
            }

            for media in &self.media {
                write_part(
                    &mut zip,
                    &format!("word/media/{}", media.file_name),
                    &media.bytes,
                )?;
            }

            zip.finish()?;
        }
        Ok(cursor.into_inner())
    }

    fn register_media(&mut self, bytes: Vec<u8>, ext: &str) -> String {
        let index = self.media.len();
        let file_name = format!("image{}.{}", index + 1, ext);
        // Document media relationships start after the fixed part ids.
        let rel = format!("rId{}", index + 4);
        self.media.push(Media { file_name, bytes });
        self.media_rel.push(rel.clone());
        rel
    }

    fn inline_drawing(&mut self, rel: &str, cx: u64, cy: u64) -> String {
        let id = self.next_drawing_id;
        self.next_drawing_id += 1;
        format!(
            concat!(
                r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
                r#"<wp:docPr id="{id}" name="image{id}"/>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic>"#,
                r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="image{id}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#
            ),
            cx = cx,
            cy = cy,
            id = id,
            rel = rel
        )
    }

    fn content_types(&self) -> String {
        let mut overrides = String::from(concat!(
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#
        ));
        if self.header.is_some() {
            overrides.push_str(r#"<Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#);
        }
        if self.footer_text.is_some() {
            overrides.push_str(r#"<Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>"#);
        }
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                r#"<Default Extension="png" ContentType="image/png"/>"#,
                r#"<Default Extension="jpg" ContentType="image/jpeg"/>"#,
                r#"<Default Extension="jpeg" ContentType="image/jpeg"/>"#,
                "{}",
                r#"</Types>"#
            ),
            overrides
        )
    }

    fn document_xml(&self) -> String {
        let mut sect = String::new();
        if self.header.is_some() {
            sect.push_str(r#"<w:headerReference w:type="default" r:id="rId2"/>"#);
        }
        if self.footer_text.is_some() {
            sect.push_str(r#"<w:footerReference w:type="default" r:id="rId3"/>"#);
        }
        sect.push_str(PAGE_SIZE);
        sect.push_str(PAGE_MARGINS);
        sect.push_str(r#"<w:pgNumType w:start="1"/>"#);

        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document {}><w:body>{}<w:sectPr>{}</w:sectPr></w:body></w:document>"#
            ),
            WORD_NS, self.body, sect
        )
    }

    fn document_rels(&self) -> String {
        let mut rels = String::from(concat!(
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#
        ));
        if self.header.is_some() {
            rels.push_str(r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>"#);
        }
        if self.footer_text.is_some() {
            rels.push_str(r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>"#);
        }
        for (media, rel) in self.media.iter().zip(self.media_rel.iter()) {
            rels.push_str(&format!(
                r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/{}"/>"#,
                rel, media.file_name
            ));
        }
        relationships_xml(&rels)
    }

    fn header_xml(&self, header: &HeaderSpec) -> String {
        let mut content = String::new();

        // Left: "Page <PAGE>" with an unresolved field; right: branding.
        content.push_str(concat!(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="right" w:pos="9360"/></w:tabs></w:pPr>"#,
            r#"<w:r><w:t xml:space="preserve">Page </w:t></w:r>"#,
            r#"<w:fldSimple w:instr=" PAGE "><w:r><w:t>1</w:t></w:r></w:fldSimple>"#,
            r#"<w:r><w:tab/></w:r>"#
        ));
        match header.logo_extent {
            Some((cx, cy)) => {
                // Header media uses the header part's own relationships.
                content.push_str(&format!(
                    concat!(
                        r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                        r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
                        r#"<wp:docPr id="9001" name="headerLogo"/>"#,
                        r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                        r#"<pic:pic>"#,
                        r#"<pic:nvPicPr><pic:cNvPr id="9001" name="headerLogo"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                        r#"<pic:blipFill><a:blip r:embed="rId1"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                        r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                        r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                        r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
                    ),
                    cx = cx,
                    cy = cy
                ));
            }
            None => {
                content.push_str(&format!(
                    r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
                    escape_xml(&header.organization)
                ));
            }
        }
        content.push_str("</w:p>");

        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:hdr {}>{}</w:hdr>"#
            ),
            WORD_NS, content
        )
    }

    fn header_rels(&self, header: &HeaderSpec) -> String {
        let mut rels = String::new();
        if let Some(index) = header.logo {
            rels.push_str(&format!(
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/{}"/>"#,
                self.media[index].file_name
            ));
        }
        relationships_xml(&rels)
    }

    fn footer_xml(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:ftr {}><w:p><w:r><w:rPr><w:sz w:val="20"/></w:rPr>"#,
                r#"<w:t xml:space="preserve">{}</w:t></w:r></w:p></w:ftr>"#
            ),
            WORD_NS,
            escape_xml(self.footer_text.as_deref().unwrap_or(""))
        )
    }
}

impl Default for ReportDocument {
    fn default() -> Self {
        ReportDocument::new()
    }
}

/// Scale pixel dimensions to a target EMU width, preserving aspect ratio.
fn scaled_extent(px: (u32, u32), width_emu: u64) -> (u64, u64) {
    let (w, h) = px;
    if w == 0 || h == 0 {
        return (width_emu, width_emu);
    }
    let natural = w as u64 * EMU_PER_PIXEL;
    let cx = width_emu.min(natural.max(1));
    let cy = cx * h as u64 / w as u64;
    (cx, cy.max(1))
}

fn package_rels() -> String {
    relationships_xml(
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    )
}

fn relationships_xml(inner: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#
        ),
        inner
    )
}

fn styles_xml() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
        r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal">"#,
        r#"<w:name w:val="Normal"/>"#,
        r#"<w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri"/><w:sz w:val="22"/></w:rPr>"#,
        r#"</w:style>"#,
        r#"<w:style w:type="paragraph" w:styleId="Heading1">"#,
        r#"<w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:qFormat/>"#,
        r#"<w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr>"#,
        r#"<w:rPr><w:b/><w:sz w:val="32"/><w:color w:val="1B1B70"/></w:rPr>"#,
        r#"</w:style>"#,
        r#"</w:styles>"#
    )
    .to_string()
}

/// Escape text for inclusion in XML content or attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
