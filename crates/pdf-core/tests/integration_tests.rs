//! Integration tests for pdf-core
//!
//! These tests verify end-to-end functionality with real PDF operations.

use lopdf::dictionary;
use pdf_core::{Color, PdfDocument, PdfError};
use pretty_assertions::assert_eq;

/// Create a PDF whose pages have the given sizes
///
/// Each page carries its own MediaBox and an existing content stream, so
/// tests can tell pages apart by width after reordering.
fn create_test_pdf_with_sizes(sizes: &[(f64, f64)]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for (i, (width, height)) in sizes.iter().enumerate() {
        let contents_id = doc.add_object(lopdf::Stream::new(
            dictionary! {},
            format!("% original page {}\n", i + 1).into_bytes(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (*width as f32).into(), (*height as f32).into()],
            "Resources" => dictionary! {},
            "Contents" => contents_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        lopdf::Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => page_ids.len() as i64,
            "Kids" => page_ids.into_iter().map(lopdf::Object::Reference).collect::<Vec<_>>(),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Create an A4 PDF with the given number of pages
fn create_test_pdf_with_pages(page_count: usize) -> Vec<u8> {
    create_test_pdf_with_sizes(&vec![(595.28, 841.89); page_count])
}

/// Create a PDF whose single page inherits its MediaBox from the Pages node
fn create_inherited_media_box_pdf() -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
    });
    doc.objects.insert(
        pages_id,
        lopdf::Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![page_id.into()],
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {},
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Create a minimal JPEG header (enough for DCT passthrough)
fn create_test_jpeg() -> Vec<u8> {
    vec![
        0xFF, 0xD8, // SOI marker
        0xFF, 0xC0, // SOF0 marker (baseline DCT)
        0x00, 0x11, // Length (17 bytes)
        0x08, // Precision (8 bits)
        0x00, 0x10, // Height (16 pixels)
        0x00, 0x10, // Width (16 pixels)
        0x03, // Number of components (RGB)
        0x01, 0x22, 0x00, // Component 1
        0x02, 0x11, 0x01, // Component 2
        0x03, 0x11, 0x01, // Component 3
        0xFF, 0xD9, // EOI marker
    ]
}

/// Create a small PNG with a transparent background
fn create_test_png() -> Vec<u8> {
    use image::{ImageBuffer, Rgba};

    let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(16, 8);
    img.put_pixel(3, 3, Rgba([0, 0, 255, 255]));
    let mut buffer = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )
        .expect("Failed to create PNG");
    buffer
}

/// Decoded content of a page's content stream(s)
fn page_content(doc: &PdfDocument, page: u32) -> String {
    let page_id = doc.inner().get_pages()[&page];
    let content = doc.inner().get_page_content(page_id).unwrap();
    String::from_utf8_lossy(&content).into_owned()
}

#[test]
fn test_open_save_roundtrip() {
    let pdf_data = create_test_pdf_with_pages(3);

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");
    assert_eq!(doc.page_count(), 3);

    let saved = doc.to_bytes().expect("Failed to save PDF");
    let doc2 = PdfDocument::open_from_bytes(&saved).expect("Failed to re-open PDF");
    assert_eq!(doc2.page_count(), 3);
}

#[test]
fn test_open_garbage_fails() {
    let result = PdfDocument::open_from_bytes(b"definitely not a pdf");
    assert!(matches!(result, Err(PdfError::OpenError(_))));
}

#[test]
fn test_open_encrypted_fails() {
    let mut doc = lopdf::Document::load_mem(&create_test_pdf_with_pages(1)).unwrap();
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();

    assert!(PdfDocument::open_from_bytes(&bytes).is_err());
}

#[test]
fn test_page_size() {
    let pdf_data = create_test_pdf_with_sizes(&[(300.0, 400.0), (612.0, 792.0)]);
    let doc = PdfDocument::open_from_bytes(&pdf_data).unwrap();

    assert_eq!(doc.page_size(1).unwrap(), (300.0, 400.0));
    assert_eq!(doc.page_size(2).unwrap(), (612.0, 792.0));
    assert!(matches!(doc.page_size(3), Err(PdfError::InvalidPage(3, 2))));
}

#[test]
fn test_page_size_inherited() {
    let doc = PdfDocument::open_from_bytes(&create_inherited_media_box_pdf()).unwrap();
    assert_eq!(doc.page_size(1).unwrap(), (612.0, 792.0));
}

#[test]
fn test_draw_rectangle() {
    let pdf_data = create_test_pdf_with_pages(2);
    let mut doc = PdfDocument::open_from_bytes(&pdf_data).unwrap();

    doc.draw_rectangle(2, 10.0, 20.0, 30.0, 40.0, Color::black())
        .unwrap();
    let saved = doc.to_bytes().unwrap();

    let doc = PdfDocument::open_from_bytes(&saved).unwrap();
    let content = page_content(&doc, 2);
    assert!(content.contains("0 0 0 rg"));
    assert!(content.contains("10 20 30 40 re"));
    // existing content is isolated from the appended marks
    assert!(content.starts_with("q\n% original page 2"));
    assert!(!page_content(&doc, 1).contains(" re"));
}

#[test]
fn test_draw_rectangles_keep_call_order() {
    let pdf_data = create_test_pdf_with_pages(1);
    let mut doc = PdfDocument::open_from_bytes(&pdf_data).unwrap();

    doc.draw_rectangle(1, 1.0, 1.0, 5.0, 5.0, Color::black())
        .unwrap();
    doc.draw_rectangle(1, 2.0, 2.0, 6.0, 6.0, Color::black())
        .unwrap();
    let saved = doc.to_bytes().unwrap();

    let content = page_content(&PdfDocument::open_from_bytes(&saved).unwrap(), 1);
    let first = content.find("1 1 5 5 re").unwrap();
    let second = content.find("2 2 6 6 re").unwrap();
    assert!(first < second);
}

#[test]
fn test_draw_image_png_with_transparency() {
    let pdf_data = create_test_pdf_with_pages(1);
    let mut doc = PdfDocument::open_from_bytes(&pdf_data).unwrap();

    doc.draw_image(&create_test_png(), 1, 100.0, 700.0, 50.0, 25.0)
        .expect("Failed to draw PNG image");
    let saved = doc.to_bytes().unwrap();

    let doc = PdfDocument::open_from_bytes(&saved).unwrap();
    let content = page_content(&doc, 1);
    assert!(content.contains("50 0 0 25 100 700 cm"));
    assert!(content.contains("/EdIm1 Do"));

    let has_soft_mask = doc.inner().objects.values().any(|obj| {
        obj.as_stream()
            .map(|s| s.dict.get(b"SMask").is_ok())
            .unwrap_or(false)
    });
    assert!(has_soft_mask);
}

#[test]
fn test_draw_image_jpeg() {
    let pdf_data = create_test_pdf_with_pages(1);
    let mut doc = PdfDocument::open_from_bytes(&pdf_data).unwrap();

    doc.draw_image(&create_test_jpeg(), 1, 0.0, 0.0, 16.0, 16.0)
        .expect("Failed to draw JPEG image");
    assert!(!doc.to_bytes().unwrap().is_empty());
}

#[test]
fn test_same_image_embedded_once() {
    let pdf_data = create_test_pdf_with_pages(2);
    let mut doc = PdfDocument::open_from_bytes(&pdf_data).unwrap();
    let png = create_test_png();

    doc.draw_image(&png, 1, 0.0, 0.0, 10.0, 10.0).unwrap();
    doc.draw_image(&png, 1, 20.0, 0.0, 10.0, 10.0).unwrap();
    doc.draw_image(&png, 2, 0.0, 0.0, 10.0, 10.0).unwrap();
    let saved = doc.to_bytes().unwrap();

    let doc = PdfDocument::open_from_bytes(&saved).unwrap();
    let images = doc
        .inner()
        .objects
        .values()
        .filter(|obj| {
            obj.as_stream()
                .ok()
                .and_then(|s| s.dict.get(b"Subtype").ok())
                .and_then(|t| t.as_name().ok())
                == Some(b"Image".as_slice())
        })
        .count();
    // one image plus its soft mask
    assert_eq!(images, 2);
}

#[test]
fn test_draw_image_invalid_data() {
    let pdf_data = create_test_pdf_with_pages(1);
    let mut doc = PdfDocument::open_from_bytes(&pdf_data).unwrap();

    let result = doc.draw_image(b"not an image", 1, 0.0, 0.0, 1.0, 1.0);
    assert!(matches!(result, Err(PdfError::ImageError(_))));
}

#[test]
fn test_draw_text() {
    let pdf_data = create_test_pdf_with_pages(1);
    let mut doc = PdfDocument::open_from_bytes(&pdf_data).unwrap();

    doc.draw_text("Approved (final)", 1, 72.0, 500.0, 14.0, Color::black())
        .unwrap();
    let saved = doc.to_bytes().unwrap();

    let doc = PdfDocument::open_from_bytes(&saved).unwrap();
    let content = page_content(&doc, 1);
    assert!(content.contains("/FHelv 14 Tf"));
    assert!(content.contains("(Approved \\(final\\)) Tj"));

    let page_id = doc.inner().get_pages()[&1];
    let resources = doc
        .inner()
        .get_dictionary(page_id)
        .unwrap()
        .get(b"Resources")
        .unwrap()
        .as_dict()
        .unwrap();
    let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
    assert!(fonts.has(b"FHelv"));
}

#[test]
fn test_draw_on_invalid_page() {
    let pdf_data = create_test_pdf_with_pages(2);
    let mut doc = PdfDocument::open_from_bytes(&pdf_data).unwrap();

    assert!(matches!(
        doc.draw_rectangle(3, 0.0, 0.0, 1.0, 1.0, Color::black()),
        Err(PdfError::InvalidPage(3, 2))
    ));
    assert!(matches!(
        doc.draw_text("x", 0, 0.0, 0.0, 12.0, Color::black()),
        Err(PdfError::InvalidPage(0, 2))
    ));
}

#[test]
fn test_import_pages_in_order() {
    let widths = [101.0, 102.0, 103.0, 104.0];
    let sizes: Vec<(f64, f64)> = widths.iter().map(|w| (*w, 500.0)).collect();
    let source = PdfDocument::open_from_bytes(&create_test_pdf_with_sizes(&sizes)).unwrap();

    let mut target = PdfDocument::new();
    target.import_pages(&source, &[4, 1, 3]).unwrap();
    let saved = target.to_bytes().unwrap();

    let out = PdfDocument::open_from_bytes(&saved).unwrap();
    assert_eq!(out.page_count(), 3);
    let out_widths: Vec<f64> = (1..=3).map(|p| out.page_size(p).unwrap().0).collect();
    assert_eq!(out_widths, vec![104.0, 101.0, 103.0]);
    assert!(page_content(&out, 1).contains("% original page 4"));
}

#[test]
fn test_import_pages_appends_across_documents() {
    let first = PdfDocument::open_from_bytes(&create_test_pdf_with_sizes(&[(200.0, 200.0)])).unwrap();
    let second = PdfDocument::open_from_bytes(&create_test_pdf_with_sizes(&[
        (300.0, 300.0),
        (400.0, 400.0),
    ]))
    .unwrap();

    let mut target = PdfDocument::new();
    target.import_pages(&first, &[1]).unwrap();
    target.import_pages(&second, &[1, 2]).unwrap();
    let saved = target.to_bytes().unwrap();

    let out = PdfDocument::open_from_bytes(&saved).unwrap();
    let widths: Vec<f64> = (1..=3).map(|p| out.page_size(p).unwrap().0).collect();
    assert_eq!(widths, vec![200.0, 300.0, 400.0]);
}

#[test]
fn test_import_resolves_inherited_media_box() {
    let source = PdfDocument::open_from_bytes(&create_inherited_media_box_pdf()).unwrap();

    let mut target = PdfDocument::new();
    target.import_pages(&source, &[1]).unwrap();
    let saved = target.to_bytes().unwrap();

    let out = PdfDocument::open_from_bytes(&saved).unwrap();
    assert_eq!(out.page_size(1).unwrap(), (612.0, 792.0));
}

#[test]
fn test_import_invalid_page() {
    let source = PdfDocument::open_from_bytes(&create_test_pdf_with_pages(2)).unwrap();
    let mut target = PdfDocument::new();

    assert!(matches!(
        target.import_pages(&source, &[1, 5]),
        Err(PdfError::InvalidPage(5, 2))
    ));
    assert_eq!(target.page_count(), 0);
}

#[test]
fn test_output_is_deterministic() {
    let pdf_data = create_test_pdf_with_pages(3);
    let png = create_test_png();

    let render = || {
        let mut doc = PdfDocument::open_from_bytes(&pdf_data).unwrap();
        doc.draw_rectangle(3, 5.0, 5.0, 50.0, 50.0, Color::black())
            .unwrap();
        doc.draw_image(&png, 1, 10.0, 10.0, 32.0, 16.0).unwrap();
        doc.draw_text("Hi", 2, 10.0, 10.0, 12.0, Color::black())
            .unwrap();
        doc.to_bytes().unwrap()
    };

    assert_eq!(render(), render());
}
