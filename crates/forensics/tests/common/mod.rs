#![allow(dead_code)]

use rust_decimal::Decimal;
use sentinel_forensics::{BankProvider, TransactionContext};

pub const TAG_IMAGE_DESCRIPTION: u16 = 0x010E;
pub const TAG_MAKE: u16 = 0x010F;
pub const TAG_MODEL: u16 = 0x0110;
pub const TAG_SOFTWARE: u16 = 0x0131;
pub const TAG_COPYRIGHT: u16 = 0x8298;

/// Little-endian TIFF block with one IFD of ASCII entries.
pub fn tiff_le(entries: &[(u16, &str)]) -> Vec<u8> {
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
        out.extend_from_slice(&2u16.to_le_bytes());
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

pub fn jpeg_with_exif(entries: &[(u16, &str)]) -> Vec<u8> {
    jpeg_from_tiff(&tiff_le(entries))
}

fn jpeg_from_tiff(tiff: &[u8]) -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(tiff);

    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02, 0xFF, 0xD9]);
    out
}

/// IFD0 Software followed by a Copyright entry whose value offset points
/// past the end of the block.
pub fn jpeg_with_dangling_entry(software: &str) -> Vec<u8> {
    let mut tiff = tiff_le(&[(TAG_SOFTWARE, software), (TAG_COPYRIGHT, "Copyright Holder")]);
    tiff[30..34].copy_from_slice(&0xFFFFu32.to_le_bytes());
    jpeg_from_tiff(&tiff)
}

/// Signature plus IEND, the shape of a bare wallet screenshot.
pub fn bare_png() -> Vec<u8> {
    let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(b"IEND");
    out.extend_from_slice(&[0xAE, 0x42, 0x60, 0x82]);
    out
}

pub fn context(amount: Decimal) -> TransactionContext {
    TransactionContext::new(amount, BankProvider::JazzCash).unwrap()
}
