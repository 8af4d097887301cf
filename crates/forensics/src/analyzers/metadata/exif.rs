//! Minimal container walker and TIFF IFD0 reader.
//!
//! Only the handful of ASCII tags that carry software or device signatures
//! are decoded. Pixel data is never touched.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const XMP_ITXT_KEYWORD: &[u8] = b"XML:com.adobe.xmp";

const TAG_IMAGE_DESCRIPTION: u16 = 0x010E;
const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_SOFTWARE: u16 = 0x0131;
const TAG_DATE_TIME: u16 = 0x0132;
const TIFF_ASCII: u16 = 2;

static XMP_CREATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(CreatorTool|softwareAgent)(?:\s*=\s*"([^"]*)"|>([^<]*)<)"#)
        .expect("static XMP pattern")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExifError {
    #[error("unrecognized image format")]
    UnrecognizedFormat,

    #[error("truncated data at offset {offset}")]
    Truncated { offset: usize },

    #[error("invalid TIFF byte order marker")]
    BadByteOrder,

    #[error("invalid TIFF magic number {0}")]
    BadMagic(u16),

    #[error("malformed {container} structure at offset {offset}")]
    Malformed {
        container: &'static str,
        offset: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageContainer {
    Jpeg,
    Png,
    WebP,
    Tiff,
}

impl ImageContainer {
    pub fn sniff(image: &[u8]) -> Option<Self> {
        let kind = infer::get(image)?;
        match kind.mime_type() {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::WebP),
            "image/tiff" => Some(Self::Tiff),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTags {
    pub software: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub image_description: Option<String>,
    pub date_time: Option<String>,
    pub creator_tool: Option<String>,
}

impl MetadataTags {
    pub fn is_empty(&self) -> bool {
        self.software.is_none()
            && self.make.is_none()
            && self.model.is_none()
            && self.image_description.is_none()
            && self.date_time.is_none()
            && self.creator_tool.is_none()
    }

    /// EXIF Software wins over the XMP creator tool.
    pub fn software_signature(&self) -> Option<&str> {
        self.software.as_deref().or(self.creator_tool.as_deref())
    }
}

#[derive(Default)]
struct RawSegments<'a> {
    exif: Option<&'a [u8]>,
    xmp: Option<&'a [u8]>,
    text: Vec<(String, String)>,
}

/// Reads whatever tags survive. A structural error only surfaces when
/// nothing at all could be recovered.
pub fn read_metadata(image: &[u8]) -> Result<MetadataTags, ExifError> {
    let container = ImageContainer::sniff(image).ok_or(ExifError::UnrecognizedFormat)?;

    let mut segments = RawSegments::default();
    let walked = match container {
        ImageContainer::Jpeg => jpeg_segments(image, &mut segments),
        ImageContainer::Png => png_segments(image, &mut segments),
        ImageContainer::WebP => webp_segments(image, &mut segments),
        ImageContainer::Tiff => {
            segments.exif = Some(image);
            Ok(())
        }
    };

    let mut first_error = walked.err();
    if let Some(e) = &first_error {
        debug!(error = %e, "Container walk stopped early");
    }

    let mut tags = MetadataTags::default();

    if let Some(tiff) = segments.exif {
        if let Err(e) = parse_tiff(tiff, &mut tags) {
            debug!(error = %e, "TIFF directory stopped early");
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
    }

    if let Some(xmp) = segments.xmp {
        tags.creator_tool = xmp_creator_tool(xmp);
    }

    for (keyword, value) in segments.text {
        match keyword.as_str() {
            "Software" if tags.software.is_none() => tags.software = Some(value),
            "Description" | "Comment" if tags.image_description.is_none() => {
                tags.image_description = Some(value)
            }
            _ => {}
        }
    }

    match first_error {
        Some(e) if tags.is_empty() => Err(e),
        _ => Ok(tags),
    }
}

fn jpeg_segments<'a>(data: &'a [u8], segments: &mut RawSegments<'a>) -> Result<(), ExifError> {
    let mut pos = 2;

    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return Err(ExifError::Malformed {
                container: "JPEG",
                offset: pos,
            });
        }

        let marker = data[pos + 1];
        // fill byte
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // start of scan / end of image: no more metadata
        if marker == 0xDA || marker == 0xD9 {
            break;
        }
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }

        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if length < 2 {
            return Err(ExifError::Malformed {
                container: "JPEG",
                offset: pos + 2,
            });
        }

        let start = pos + 4;
        let end = pos + 2 + length;
        let payload = data
            .get(start..end)
            .ok_or(ExifError::Truncated { offset: start })?;

        match marker {
            0xE1 => {
                if let Some(tiff) = payload.strip_prefix(EXIF_HEADER) {
                    if segments.exif.is_none() {
                        segments.exif = Some(tiff);
                    }
                } else if let Some(xmp) = payload.strip_prefix(XMP_HEADER) {
                    if segments.xmp.is_none() {
                        segments.xmp = Some(xmp);
                    }
                }
            }
            0xFE => {
                if let Some(comment) = ascii_value(payload) {
                    segments.text.push(("Comment".to_string(), comment));
                }
            }
            _ => {}
        }

        pos = end;
    }

    Ok(())
}

fn png_segments<'a>(data: &'a [u8], segments: &mut RawSegments<'a>) -> Result<(), ExifError> {
    let mut pos = 8;

    while pos + 8 <= data.len() {
        let length = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
            as usize;
        let kind = &data[pos + 4..pos + 8];
        let start = pos + 8;
        let end = start
            .checked_add(length)
            .ok_or(ExifError::Truncated { offset: start })?;
        let body = data
            .get(start..end)
            .ok_or(ExifError::Truncated { offset: start })?;

        match kind {
            b"eXIf" => {
                if segments.exif.is_none() {
                    segments.exif = Some(body);
                }
            }
            b"tEXt" => {
                if let Some((keyword, text)) = split_nul(body) {
                    if let Some(value) = ascii_value(text) {
                        segments
                            .text
                            .push((String::from_utf8_lossy(keyword).into_owned(), value));
                    }
                }
            }
            b"iTXt" => read_itxt(body, segments),
            b"IEND" => break,
            _ => {}
        }

        // skip CRC
        pos = end + 4;
    }

    Ok(())
}

fn read_itxt<'a>(body: &'a [u8], segments: &mut RawSegments<'a>) {
    let Some((keyword, rest)) = split_nul(body) else {
        return;
    };
    // compression flag + method, then language and translated keyword
    let Some((&compressed, rest)) = rest.split_first() else {
        return;
    };
    if compressed != 0 || rest.is_empty() {
        return;
    }
    let Some((_, rest)) = split_nul(&rest[1..]) else {
        return;
    };
    let Some((_, text)) = split_nul(rest) else {
        return;
    };

    if keyword == XMP_ITXT_KEYWORD {
        if segments.xmp.is_none() {
            segments.xmp = Some(text);
        }
    } else if let Some(value) = ascii_value(text) {
        segments
            .text
            .push((String::from_utf8_lossy(keyword).into_owned(), value));
    }
}

fn webp_segments<'a>(data: &'a [u8], segments: &mut RawSegments<'a>) -> Result<(), ExifError> {
    let mut pos = 12;

    while pos + 8 <= data.len() {
        let fourcc = &data[pos..pos + 4];
        let length = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
            as usize;
        let start = pos + 8;
        let end = start
            .checked_add(length)
            .ok_or(ExifError::Truncated { offset: start })?;
        let body = data
            .get(start..end)
            .ok_or(ExifError::Truncated { offset: start })?;

        match fourcc {
            b"EXIF" => {
                let tiff = body.strip_prefix(EXIF_HEADER).unwrap_or(body);
                if segments.exif.is_none() {
                    segments.exif = Some(tiff);
                }
            }
            b"XMP " => {
                if segments.xmp.is_none() {
                    segments.xmp = Some(body);
                }
            }
            _ => {}
        }

        // chunks are padded to an even length
        pos = end + (length & 1);
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn u16(self, data: &[u8], offset: usize) -> Result<u16, ExifError> {
        let bytes: [u8; 2] = offset
            .checked_add(2)
            .and_then(|end| data.get(offset..end))
            .and_then(|b| b.try_into().ok())
            .ok_or(ExifError::Truncated { offset })?;
        Ok(match self {
            Self::Little => u16::from_le_bytes(bytes),
            Self::Big => u16::from_be_bytes(bytes),
        })
    }

    fn u32(self, data: &[u8], offset: usize) -> Result<u32, ExifError> {
        let bytes: [u8; 4] = offset
            .checked_add(4)
            .and_then(|end| data.get(offset..end))
            .and_then(|b| b.try_into().ok())
            .ok_or(ExifError::Truncated { offset })?;
        Ok(match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        })
    }
}

fn parse_tiff(tiff: &[u8], tags: &mut MetadataTags) -> Result<(), ExifError> {
    let order = match tiff.get(0..2) {
        Some(b"II") => ByteOrder::Little,
        Some(b"MM") => ByteOrder::Big,
        Some(_) => return Err(ExifError::BadByteOrder),
        None => return Err(ExifError::Truncated { offset: 0 }),
    };

    let magic = order.u16(tiff, 2)?;
    if magic != 42 {
        return Err(ExifError::BadMagic(magic));
    }

    let ifd = order.u32(tiff, 4)? as usize;
    let count = order.u16(tiff, ifd)? as usize;

    for index in 0..count {
        let entry = ifd + 2 + index * 12;
        let tag = order.u16(tiff, entry)?;
        let kind = order.u16(tiff, entry + 2)?;
        let length = order.u32(tiff, entry + 4)? as usize;

        if kind != TIFF_ASCII || length == 0 {
            continue;
        }

        let value_start = if length <= 4 {
            entry + 8
        } else {
            order.u32(tiff, entry + 8)? as usize
        };
        let Some(raw) = value_start
            .checked_add(length)
            .and_then(|end| tiff.get(value_start..end))
        else {
            debug!(tag, offset = value_start, length, "Skipping out-of-bounds IFD value");
            continue;
        };

        let value = ascii_value(raw);
        match tag {
            TAG_IMAGE_DESCRIPTION => tags.image_description = value,
            TAG_MAKE => tags.make = value,
            TAG_MODEL => tags.model = value,
            TAG_SOFTWARE => tags.software = value,
            TAG_DATE_TIME => tags.date_time = value,
            _ => {}
        }
    }

    Ok(())
}

fn xmp_creator_tool(xmp: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(xmp);
    let mut agent = None;

    for captures in XMP_CREATOR.captures_iter(&text) {
        let value = captures
            .get(2)
            .or_else(|| captures.get(3))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty());

        match (&captures[1], value) {
            ("CreatorTool", Some(value)) => return Some(value),
            (_, Some(value)) if agent.is_none() => agent = Some(value),
            _ => {}
        }
    }

    agent
}

fn split_nul(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let index = data.iter().position(|&b| b == 0)?;
    Some((&data[..index], &data[index + 1..]))
}

fn ascii_value(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn tiff_le(entries: &[(u16, &str)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"II");
        out.extend_from_slice(&42u16.to_le_bytes());
        out.extend_from_slice(&8u32.to_le_bytes());

        let mut data_offset = 8 + 2 + entries.len() * 12 + 4;
        let mut data = Vec::new();

        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for (tag, value) in entries {
            let mut bytes = value.as_bytes().to_vec();
            bytes.push(0);

            out.extend_from_slice(&tag.to_le_bytes());
            out.extend_from_slice(&TIFF_ASCII.to_le_bytes());
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            if bytes.len() <= 4 {
                bytes.resize(4, 0);
                out.extend_from_slice(&bytes);
            } else {
                out.extend_from_slice(&(data_offset as u32).to_le_bytes());
                data_offset += bytes.len();
                data.extend_from_slice(&bytes);
            }
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&data);
        out
    }

    pub(crate) fn jpeg_with_app1(header: &[u8], body: &[u8]) -> Vec<u8> {
        let mut payload = header.to_vec();
        payload.extend_from_slice(body);

        let mut out = vec![0xFF, 0xD8];
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]);
        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    }

    pub(crate) fn png_with_chunks(chunks: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
        let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        for (kind, body) in chunks {
            out.extend_from_slice(&(body.len() as u32).to_be_bytes());
            out.extend_from_slice(*kind);
            out.extend_from_slice(body);
            out.extend_from_slice(&[0, 0, 0, 0]);
        }
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(b"IEND");
        out.extend_from_slice(&[0, 0, 0, 0]);
        out
    }

    #[test]
    fn test_reads_jpeg_exif_tags() {
        let tiff = tiff_le(&[
            (TAG_MAKE, "Apple"),
            (TAG_MODEL, "iPhone 15"),
            (TAG_SOFTWARE, "Adobe Photoshop 25.0"),
        ]);
        let image = jpeg_with_app1(EXIF_HEADER, &tiff);

        let tags = read_metadata(&image).unwrap();
        assert_eq!(tags.make.as_deref(), Some("Apple"));
        assert_eq!(tags.model.as_deref(), Some("iPhone 15"));
        assert_eq!(tags.software.as_deref(), Some("Adobe Photoshop 25.0"));
    }

    #[test]
    fn test_inline_short_values() {
        let tiff = tiff_le(&[(TAG_MAKE, "LG")]);
        let image = jpeg_with_app1(EXIF_HEADER, &tiff);
        assert_eq!(read_metadata(&image).unwrap().make.as_deref(), Some("LG"));
    }

    #[test]
    fn test_reads_xmp_creator_tool() {
        let xmp = br#"<x:xmpmeta><rdf:Description xmp:CreatorTool="Canva"/></x:xmpmeta>"#;
        let image = jpeg_with_app1(XMP_HEADER, xmp);

        let tags = read_metadata(&image).unwrap();
        assert!(tags.software.is_none());
        assert_eq!(tags.software_signature(), Some("Canva"));
    }

    #[test]
    fn test_png_text_chunks() {
        let image = png_with_chunks(&[(b"tEXt", b"Software\0GIMP 2.10".to_vec())]);
        let tags = read_metadata(&image).unwrap();
        assert_eq!(tags.software.as_deref(), Some("GIMP 2.10"));
    }

    #[test]
    fn test_png_without_metadata_is_empty() {
        let image = png_with_chunks(&[]);
        assert!(read_metadata(&image).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_format() {
        assert_eq!(
            read_metadata(b"definitely not an image"),
            Err(ExifError::UnrecognizedFormat)
        );
    }

    #[test]
    fn test_truncated_tiff_is_an_error() {
        let mut tiff = tiff_le(&[(TAG_SOFTWARE, "Snapseed 2.0")]);
        tiff.truncate(20);
        let image = jpeg_with_app1(EXIF_HEADER, &tiff);
        assert!(matches!(
            read_metadata(&image),
            Err(ExifError::Truncated { .. })
        ));
    }

    const TAG_COPYRIGHT: u16 = 0x8298;

    // Second entry's value offset points far past the end of the block.
    pub(crate) fn tiff_with_dangling_entry(software: &str) -> Vec<u8> {
        let mut tiff = tiff_le(&[(TAG_SOFTWARE, software), (TAG_COPYRIGHT, "Copyright Holder")]);
        tiff[30..34].copy_from_slice(&0xFFFFu32.to_le_bytes());
        tiff
    }

    #[test]
    fn test_dangling_entry_keeps_earlier_tags() {
        let image = jpeg_with_app1(EXIF_HEADER, &tiff_with_dangling_entry("Adobe Photoshop 25.0"));

        let tags = read_metadata(&image).unwrap();
        assert_eq!(tags.software.as_deref(), Some("Adobe Photoshop 25.0"));
    }

    #[test]
    fn test_dangling_entry_does_not_hide_later_tags() {
        let mut tiff = tiff_le(&[(TAG_COPYRIGHT, "Copyright Holder"), (TAG_SOFTWARE, "GIMP 2.10")]);
        tiff[18..22].copy_from_slice(&0xFFFFu32.to_le_bytes());
        let image = jpeg_with_app1(EXIF_HEADER, &tiff);

        assert_eq!(read_metadata(&image).unwrap().software.as_deref(), Some("GIMP 2.10"));
    }

    #[test]
    fn test_truncated_later_segment_keeps_exif() {
        let mut image = jpeg_with_app1(EXIF_HEADER, &tiff_le(&[(TAG_SOFTWARE, "Pixlr")]));
        image.truncate(image.len() - 6);
        image.extend_from_slice(&[0xFF, 0xE2, 0xFF, 0xFF, 0x00]);

        assert_eq!(read_metadata(&image).unwrap().software.as_deref(), Some("Pixlr"));
    }

    #[test]
    fn test_bad_byte_order() {
        let image = jpeg_with_app1(EXIF_HEADER, b"XX\0*\0\0\0\x08");
        assert_eq!(read_metadata(&image), Err(ExifError::BadByteOrder));
    }
}
