//! Minimal WordprocessingML writer for the consent letter.

use std::io::{Cursor, Write as _};

use quick_xml::escape::escape;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{Error, Result};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Rendered size of the QR code, in pixels at 96 dpi.
const QR_PX: u64 = 140;
const EMU_PER_PX: u64 = 9_525;

const NOTICE: &str = "학부모님 안녕하십니까?
  본교는 학생들의 디지털 역량을 키우고 개별 맞춤형 교육을 실현하기 위해 여러 학습지원 소프트웨어를 교육과정에 활용하고 있습니다. 학교에서 사용하는 학습지원 소프트웨어는 개인정보 보호와 교육적 효과성을 사전에 검토하여 학교운영위원회의 심의를 거치도록 되어 있습니다.
  「개인정보 보호법」에 따라 학생의 개인정보가 어떤 목적으로, 어떤 기업에, 어떤 항목이 제공되는지 안내드리고 동의를 받고자 합니다. 개인정보는 교육활동에 필요한 최소한의 항목만 수집하며, 목적이 끝나면 즉시 파기합니다.
  동의를 거부할 권리가 있으며, 거부 시 해당 소프트웨어의 서비스가 제공되지 않을 수 있습니다. 내용을 확인하신 뒤 회신해 주시기 바랍니다. 감사합니다.";

/// Everything the letter template needs.
#[derive(Debug, Clone)]
pub struct LetterInput {
  pub school_name:  String,
  pub year:         u8,
  pub section:      u8,
  pub teacher_name: String,
  /// Academic year printed in the header and date line.
  pub school_year:  i32,
  /// Printed under the QR code for guardians who cannot scan it.
  pub guardian_url: Option<String>,
  /// Pre-rendered QR code pointing at the guardian form.
  pub qr_png:       Vec<u8>,
}

/// Download name for a class's letter.
pub fn letter_file_name(year: u8, section: u8) -> String {
  format!("{year}학년 {section}반 가정통신문.docx")
}

/// Render the letter as `.docx` bytes.
pub fn render_letter(input: &LetterInput) -> Result<Vec<u8>> {
  if !input.qr_png.starts_with(PNG_MAGIC) {
    return Err(Error::InvalidQr);
  }

  let options =
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
  let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

  let parts: [(&str, &[u8]); 4] = [
    ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
    ("_rels/.rels", PACKAGE_RELS.as_bytes()),
    ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
    ("word/media/qr.png", &input.qr_png),
  ];
  for (name, bytes) in parts {
    zip.start_file(name, options)?;
    zip.write_all(bytes)?;
  }
  zip.start_file("word/document.xml", options)?;
  zip.write_all(document_xml(input).as_bytes())?;

  Ok(zip.finish()?.into_inner())
}

// ─── Package parts ───────────────────────────────────────────────────────────

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="png" ContentType="image/png"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rIdQr" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/qr.png"/>
</Relationships>"#;

// ─── Document body ───────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Align {
  Left,
  Center,
  Right,
}

#[derive(Clone, Copy)]
struct Style {
  align:  Align,
  bold:   bool,
  /// Half-points.
  size:   u32,
  color:  Option<&'static str>,
  /// Twips.
  before: u32,
  after:  u32,
}

const BODY: Style = Style {
  align:  Align::Left,
  bold:   false,
  size:   20,
  color:  None,
  before: 0,
  after:  0,
};

fn paragraph(out: &mut String, text: &str, style: Style) {
  out.push_str("<w:p><w:pPr>");
  match style.align {
    Align::Left => {}
    Align::Center => out.push_str(r#"<w:jc w:val="center"/>"#),
    Align::Right => out.push_str(r#"<w:jc w:val="right"/>"#),
  }
  out.push_str(&format!(
    r#"<w:spacing w:before="{}" w:after="{}"/></w:pPr><w:r><w:rPr>"#,
    style.before, style.after
  ));
  if style.bold {
    out.push_str("<w:b/>");
  }
  if let Some(color) = style.color {
    out.push_str(&format!(r#"<w:color w:val="{color}"/>"#));
  }
  out.push_str(&format!(r#"<w:sz w:val="{}"/></w:rPr>"#, style.size));
  for (i, line) in text.split('\n').enumerate() {
    if i > 0 {
      out.push_str("<w:br/>");
    }
    out.push_str(&format!(
      r#"<w:t xml:space="preserve">{}</w:t>"#,
      escape(line)
    ));
  }
  out.push_str("</w:r></w:p>");
}

fn qr_paragraph(out: &mut String) {
  let emu = QR_PX * EMU_PER_PX;
  out.push_str(&format!(
    r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing><wp:inline><wp:extent cx="{emu}" cy="{emu}"/><wp:docPr id="1" name="QR"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:nvPicPr><pic:cNvPr id="1" name="qr.png"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="rIdQr"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{emu}" cy="{emu}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
  ));
}

fn document_xml(input: &LetterInput) -> String {
  let mut body = String::new();

  paragraph(&mut body, "가정통신문", Style {
    align: Align::Center,
    bold: true,
    size: 40,
    ..BODY
  });
  paragraph(
    &mut body,
    &format!(
      "{}학년도 {}학년 {}반 담임교사: {}",
      input.school_year, input.year, input.section, input.teacher_name
    ),
    Style { align: Align::Right, size: 24, before: 200, ..BODY },
  );
  paragraph(
    &mut body,
    "학습지원 소프트웨어 개인정보 수집·이용·제공 동의 안내",
    Style {
      align: Align::Center,
      bold: true,
      size: 32,
      before: 800,
      after: 400,
      ..BODY
    },
  );
  paragraph(&mut body, NOTICE, Style { after: 200, ..BODY });
  paragraph(
    &mut body,
    "▼ 아래 QR 코드를 스캔하시면 온라인으로 바로 동의하실 수 있습니다 ▼",
    Style {
      align: Align::Center,
      bold: true,
      size: 22,
      before: 400,
      after: 200,
      ..BODY
    },
  );
  qr_paragraph(&mut body);
  if let Some(url) = &input.guardian_url {
    paragraph(&mut body, url, Style {
      align: Align::Center,
      size: 18,
      color: Some("0000FF"),
      ..BODY
    });
  }

  // Reply slip.
  paragraph(&mut body, &"-".repeat(60), Style {
    align: Align::Center,
    before: 400,
    after: 400,
    ..BODY
  });
  paragraph(
    &mut body,
    "개인정보 수집 및 이용 동의서 (오프라인 회신용)",
    Style { align: Align::Center, bold: true, size: 28, after: 200, ..BODY },
  );
  paragraph(
    &mut body,
    "본인은 위 내용을 충분히 이해하였으며, 각 소프트웨어의 개인정보 수집·이용 및 제3자 제공에 관하여 위와 같이 동의합니다.",
    Style { after: 300, ..BODY },
  );
  paragraph(
    &mut body,
    &format!(
      "(   {}   )학년 (   {}   )반 (       )번 코드(         )",
      input.year, input.section
    ),
    Style { align: Align::Center, size: 22, after: 200, ..BODY },
  );
  for line in ["학생 성명 :                   (인)", "보호자 성명 :                   (인)"] {
    paragraph(&mut body, line, Style { align: Align::Right, size: 22, after: 100, ..BODY });
  }
  paragraph(
    &mut body,
    &format!("{}.      .      .", input.school_year),
    Style { align: Align::Center, size: 22, before: 200, ..BODY },
  );
  paragraph(
    &mut body,
    &format!("{} 학교장", input.school_name),
    Style { align: Align::Center, bold: true, size: 28, before: 200, ..BODY },
  );

  format!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr></w:body></w:document>"#
  )
}

#[cfg(test)]
mod tests {
  use std::io::Read as _;

  use zip::ZipArchive;

  use super::*;

  fn input() -> LetterInput {
    LetterInput {
      school_name:  "Gadong <Elementary> & Co".into(),
      year:         3,
      section:      2,
      teacher_name: "Park".into(),
      school_year:  2026,
      guardian_url: Some("https://consent.example/guardian?class=x".into()),
      qr_png:       [PNG_MAGIC, b"rest-of-image"].concat(),
    }
  }

  fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut out = Vec::new();
    entry.read_to_end(&mut out).unwrap();
    out
  }

  #[test]
  fn package_has_required_parts() {
    let bytes = render_letter(&input()).unwrap();
    let archive = ZipArchive::new(Cursor::new(&bytes)).unwrap();
    let mut names: Vec<_> = archive.file_names().collect();
    names.sort_unstable();
    assert_eq!(names, [
      "[Content_Types].xml",
      "_rels/.rels",
      "word/_rels/document.xml.rels",
      "word/document.xml",
      "word/media/qr.png",
    ]);
    assert_eq!(read_entry(&bytes, "word/media/qr.png"), input().qr_png);
  }

  #[test]
  fn document_text_is_filled_and_escaped() {
    let bytes = render_letter(&input()).unwrap();
    let xml = String::from_utf8(read_entry(&bytes, "word/document.xml")).unwrap();
    assert!(xml.contains("2026학년도 3학년 2반 담임교사: Park"));
    assert!(xml.contains("Gadong &lt;Elementary&gt; &amp; Co 학교장"));
    assert!(xml.contains("https://consent.example/guardian?class=x"));
    assert!(xml.contains(r#"r:embed="rIdQr""#));
    assert!(!xml.contains("<Elementary>"));
  }

  #[test]
  fn non_png_qr_is_rejected() {
    let mut bad = input();
    bad.qr_png = b"GIF89a".to_vec();
    assert!(matches!(render_letter(&bad), Err(Error::InvalidQr)));
  }

  #[test]
  fn file_name_names_the_class() {
    assert_eq!(letter_file_name(3, 2), "3학년 2반 가정통신문.docx");
  }
}
