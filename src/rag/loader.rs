// PDF page extraction

use crate::types::{AppError, AppResult, Page};
use lopdf::Document;
use std::path::Path;
use tracing::debug;

/// Extracts ordered text pages from a PDF. Page order follows the physical
/// document; `Page::index` is 0-based.
pub fn load(path: &Path) -> AppResult<Vec<Page>> {
    if !path.exists() {
        return Err(AppError::DocumentNotFound(path.display().to_string()));
    }

    let doc = Document::load(path).map_err(|e| AppError::Parse(e.to_string()))?;

    let mut pages = Vec::new();
    for (index, (&page_number, _)) in doc.get_pages().iter().enumerate() {
        let text = doc
            .extract_text(&[page_number])
            .map_err(|e| AppError::Parse(format!("page {page_number}: {e}")))?;
        debug!(page = index, chars = text.len(), "Extracted page text");
        pages.push(Page { index, text });
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}_{}.pdf", name, uuid::Uuid::new_v4()))
    }

    fn write_two_page_pdf(path: &Path) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in ["First page words", "Second page words"] {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let kids_len = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => kids_len,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn loads_pages_in_physical_order() {
        let path = temp_path("loader_two_pages");
        write_two_page_pdf(&path);

        let pages = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].index, 0);
        assert_eq!(pages[1].index, 1);
        assert!(pages[0].text.contains("First page"));
        assert!(pages[1].text.contains("Second page"));
    }

    #[test]
    fn missing_file_is_document_not_found() {
        let err = load(Path::new("/nonexistent/filing.pdf")).unwrap_err();
        assert!(matches!(err, AppError::DocumentNotFound(_)));
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let path = temp_path("loader_garbage");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let err = load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, AppError::Parse(_)));
    }
}
