//! Tag-data inspection for edit-software signatures.

pub mod exif;

use crate::core::flag::{ForensicFlag, Severity};
use crate::core::stage::{MetaResult, MetadataAnalyzer};
use exif::{read_metadata, MetadataTags};
use tracing::{debug, warn};

/// Case-insensitive substrings that indicate an editing tool touched the file.
pub const EDITING_SOFTWARE: &[&str] = &[
    "photoshop",
    "gimp",
    "canva",
    "pixlr",
    "snapseed",
    "lightroom",
    "affinity",
    "paint.net",
    "pixelmator",
    "adobe",
    "edit",
    "modified",
];

pub fn mentions_editor(value: &str) -> bool {
    let lowered = value.to_lowercase();
    EDITING_SOFTWARE.iter().any(|kw| lowered.contains(kw))
}

#[derive(Debug, Clone, Default)]
pub struct ExifMetadataAnalyzer;

impl ExifMetadataAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn evaluate(&self, tags: MetadataTags) -> MetaResult {
        let mut result = MetaResult::default();

        if tags.is_empty() {
            result.flags.push(ForensicFlag::metadata(
                Severity::Low,
                "No EXIF data (Common in screenshots/digital wallets)",
                0.5,
            ));
            return result;
        }

        if let Some(software) = tags.software_signature() {
            result.software_detected = Some(software.to_string());
            if mentions_editor(software) {
                result.is_edited = true;
                result.flags.push(ForensicFlag::metadata(
                    Severity::High,
                    format!("Editing software detected: {}", software),
                    0.95,
                ));
            }
        }

        if let Some(make) = tags.make.as_deref() {
            result.hardware_detected = Some(match tags.model.as_deref() {
                Some(model) => format!("{} {}", make, model),
                None => make.to_string(),
            });
        }

        if let Some(description) = tags.image_description.as_deref() {
            if mentions_editor(description) {
                result.is_edited = true;
                result.flags.push(ForensicFlag::metadata(
                    Severity::Medium,
                    "Editing trace in ImageDescription",
                    0.7,
                ));
            }
        }

        result
    }
}

impl MetadataAnalyzer for ExifMetadataAnalyzer {
    fn analyze(&self, image: &[u8]) -> MetaResult {
        match read_metadata(image) {
            Ok(tags) => {
                debug!(
                    software = ?tags.software_signature(),
                    make = ?tags.make,
                    "Metadata tags extracted"
                );
                self.evaluate(tags)
            }
            Err(e) => {
                warn!(error = %e, "Metadata parsing failed");
                MetaResult {
                    flags: vec![ForensicFlag::metadata(
                        Severity::Low,
                        format!("Could not parse image metadata: {}", e),
                        0.2,
                    )],
                    ..Default::default()
                }
            }
        }
    }

    fn status_log(&self, result: &MetaResult) -> Vec<String> {
        let icon = self.icon();
        let mut logs = vec![
            format!("{} {} initialized...", icon, self.name()),
            format!("{} Extracting EXIF metadata...", icon),
        ];

        if let Some(software) = &result.software_detected {
            logs.push(format!("{} Software tag found: {}", icon, software));
        }
        if let Some(hardware) = &result.hardware_detected {
            logs.push(format!("{} Device: {}", icon, hardware));
        }
        if result.is_edited {
            logs.push(format!("{} [!] EDITING SOFTWARE DETECTED", icon));
        } else {
            logs.push(format!("{} [OK] No obvious editing markers", icon));
        }

        logs
    }
}

#[cfg(test)]
mod tests {
    use super::exif::tests::{jpeg_with_app1, png_with_chunks, tiff_le};
    use super::*;
    use crate::core::flag::Layer;

    const EXIF_HEADER: &[u8] = b"Exif\0\0";

    fn analyze_tags(entries: &[(u16, &str)]) -> MetaResult {
        let image = jpeg_with_app1(EXIF_HEADER, &tiff_le(entries));
        ExifMetadataAnalyzer::new().analyze(&image)
    }

    #[test]
    fn test_editor_keywords() {
        assert!(mentions_editor("Adobe Photoshop 2024"));
        assert!(mentions_editor("GIMP 2.10"));
        assert!(mentions_editor("Edited with Snapseed"));
        assert!(!mentions_editor("iOS 17.2"));
        assert!(!mentions_editor("HDR+ 1.0.6"));
    }

    #[test]
    fn test_editing_software_is_high() {
        let result = analyze_tags(&[(0x0131, "Adobe Photoshop 25.0")]);

        assert!(result.is_edited);
        assert_eq!(result.software_detected.as_deref(), Some("Adobe Photoshop 25.0"));
        assert_eq!(result.flags.len(), 1);
        assert_eq!(result.flags[0].severity, Severity::High);
        assert_eq!(result.flags[0].layer, Layer::Metadata);
        assert_eq!(
            result.flags[0].description,
            "Editing software detected: Adobe Photoshop 25.0"
        );
    }

    #[test]
    fn test_camera_image_is_clean() {
        let result = analyze_tags(&[
            (0x010F, "samsung"),
            (0x0110, "SM-S918B"),
            (0x0131, "S918BXXU1AWBD"),
        ]);

        assert!(!result.is_edited);
        assert!(result.flags.is_empty());
        assert_eq!(result.hardware_detected.as_deref(), Some("samsung SM-S918B"));
    }

    #[test]
    fn test_model_without_make_is_ignored() {
        let result = analyze_tags(&[(0x0110, "Pixel 8")]);
        assert!(result.hardware_detected.is_none());
    }

    #[test]
    fn test_description_trace_is_medium() {
        let result = analyze_tags(&[(0x010E, "modified receipt")]);

        assert!(result.is_edited);
        assert_eq!(result.flags[0].severity, Severity::Medium);
        assert_eq!(result.flags[0].description, "Editing trace in ImageDescription");
    }

    #[test]
    fn test_screenshot_without_metadata() {
        let image = png_with_chunks(&[]);
        let result = ExifMetadataAnalyzer::new().analyze(&image);

        assert!(!result.is_edited);
        assert_eq!(result.flags.len(), 1);
        assert_eq!(result.flags[0].severity, Severity::Low);
        assert!(result.flags[0].description.starts_with("No EXIF data"));
    }

    #[test]
    fn test_unparseable_bytes_become_low_flag() {
        let result = ExifMetadataAnalyzer::new().analyze(b"\x00\x01garbage");

        assert!(!result.is_edited);
        assert_eq!(result.flags[0].severity, Severity::Low);
        assert!(result.flags[0]
            .description
            .starts_with("Could not parse image metadata:"));
        assert_eq!(result.flags[0].confidence, 0.2);
    }

    #[test]
    fn test_corrupt_later_entry_still_flags_editor() {
        let tiff = super::exif::tests::tiff_with_dangling_entry("Adobe Photoshop 25.0");
        let image = jpeg_with_app1(EXIF_HEADER, &tiff);
        let result = ExifMetadataAnalyzer::new().analyze(&image);

        assert!(result.is_edited);
        assert_eq!(result.software_detected.as_deref(), Some("Adobe Photoshop 25.0"));
        assert_eq!(result.flags.len(), 1);
        assert_eq!(result.flags[0].severity, Severity::High);
    }

    #[test]
    fn test_status_log_reports_edit() {
        let analyzer = ExifMetadataAnalyzer::new();
        let result = analyze_tags(&[(0x0131, "Canva")]);
        let logs = analyzer.status_log(&result);

        assert_eq!(logs[0], "[META] Agent Meta initialized...");
        assert!(logs.contains(&"[META] Software tag found: Canva".to_string()));
        assert_eq!(logs.last().unwrap(), "[META] [!] EDITING SOFTWARE DETECTED");
    }
}
