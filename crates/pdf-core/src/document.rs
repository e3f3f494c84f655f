//! PDF Document wrapper

use crate::image::{generate_image_operators, ImageXObject};
use crate::text::{generate_text_operators, STANDARD_FONT_RESOURCE};
use crate::{PdfError, Result, A4_SIZE};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Depth limit when walking `Parent` links
const MAX_TREE_DEPTH: usize = 32;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// An image already written into the document
#[derive(Debug, Clone, Copy)]
struct EmbeddedImage {
    object_id: ObjectId,
}

/// PDF Document wrapper providing page-level operations
///
/// Drawing calls are buffered per page and written once on save, so a page
/// touched by many overlays still ends up with a single new content stream.
#[derive(Debug)]
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Embedded images (data hash -> XObject)
    embedded_images: HashMap<u64, EmbeddedImage>,
    /// Page image resources (page number -> object ID -> resource name)
    page_image_resources: HashMap<usize, HashMap<ObjectId, String>>,
    /// Next image resource number
    next_image_resource: u32,
    /// Helvetica font dictionary, created on first text draw
    standard_font: Option<ObjectId>,
    /// Pages whose resources already reference the Helvetica font
    pages_with_standard_font: Vec<usize>,
    /// Buffered content operators per page, flushed in page order
    page_content_buffer: BTreeMap<usize, Vec<u8>>,
}

impl PdfDocument {
    fn from_inner(inner: Document) -> Self {
        Self {
            inner,
            embedded_images: HashMap::new(),
            page_image_resources: HashMap::new(),
            next_image_resource: 1,
            standard_font: None,
            pages_with_standard_font: Vec::new(),
            page_content_buffer: BTreeMap::new(),
        }
    }

    /// Create an empty document with no pages
    pub fn new() -> Self {
        let mut inner = Document::with_version("1.5");

        let pages_id = inner.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        inner.trailer.set("Root", catalog_id);

        Self::from_inner(inner)
    }

    /// Open a PDF document from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = Document::load(path).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Self::checked(inner)
    }

    /// Open a PDF document from bytes
    ///
    /// Encrypted documents are rejected: their content streams cannot be
    /// edited without the password.
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Self::checked(inner)
    }

    fn checked(inner: Document) -> Result<Self> {
        if inner.trailer.get(b"Encrypt").is_ok() {
            return Err(PdfError::OpenError(
                "Document is encrypted".to_string(),
            ));
        }
        Ok(Self::from_inner(inner))
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Get a mutable reference to the underlying lopdf document
    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.inner
    }

    /// Get all page object IDs in order
    pub fn get_page_ids(&self) -> Vec<ObjectId> {
        self.inner.get_pages().values().copied().collect()
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        if page == 0 {
            return Err(PdfError::InvalidPage(page, pages.len()));
        }
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    /// Get page width and height in points
    ///
    /// Reads the MediaBox (or CropBox), following the parent chain. Pages
    /// without any box are treated as A4.
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    pub fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let page_id = self.page_id(page)?;

        let media_box = match inherited_attribute(&self.inner, page_id, b"MediaBox")
            .or_else(|| inherited_attribute(&self.inner, page_id, b"CropBox"))
        {
            Some(obj) => obj,
            None => return Ok(A4_SIZE),
        };

        let values = resolve(&self.inner, &media_box)
            .as_array()
            .map_err(|_| PdfError::ParseError("MediaBox is not an array".to_string()))?
            .iter()
            .map(|v| number(resolve(&self.inner, v)))
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| PdfError::ParseError("MediaBox has a non-numeric entry".to_string()))?;

        if values.len() < 4 {
            return Err(PdfError::ParseError("Invalid MediaBox format".to_string()));
        }

        Ok(((values[2] - values[0]).abs(), (values[3] - values[1]).abs()))
    }

    /// Append copies of pages from another document
    ///
    /// Pages are appended in the order given; the same source page may be
    /// listed more than once. Inheritable attributes are copied onto each
    /// page so the copy renders the same under its new parent.
    ///
    /// # Arguments
    /// * `source` - Document to copy from
    /// * `pages` - Source page numbers (1-indexed)
    pub fn import_pages(&mut self, source: &PdfDocument, pages: &[usize]) -> Result<()> {
        let source_count = source.page_count();
        if let Some(&bad) = pages.iter().find(|&&p| p == 0 || p > source_count) {
            return Err(PdfError::InvalidPage(bad, source_count));
        }
        if pages.is_empty() {
            return Ok(());
        }

        let mut src = source.inner.clone();
        src.renumber_objects_with(self.inner.max_id + 1);
        let src_pages = src.get_pages();

        let mut copied = Vec::with_capacity(pages.len());
        for &page in pages {
            let page_id = src_pages
                .get(&(page as u32))
                .copied()
                .ok_or(PdfError::InvalidPage(page, source_count))?;
            let mut dict = src
                .get_dictionary(page_id)
                .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?
                .clone();
            for key in INHERITABLE_ATTRIBUTES {
                if !dict.has(key) {
                    if let Some(value) = inherited_attribute(&src, page_id, key) {
                        dict.set(key, value);
                    }
                }
            }
            dict.remove(b"Parent");
            copied.push(dict);
        }

        let src_max_id = src.max_id;
        for (object_id, object) in src.objects {
            match object.type_name().unwrap_or("") {
                "Catalog" | "Pages" | "Page" | "Outlines" | "Outline" => {}
                _ => {
                    self.inner.objects.insert(object_id, object);
                }
            }
        }
        self.inner.max_id = self.inner.max_id.max(src_max_id);

        let pages_id = self.pages_root_id()?;
        let mut new_kids = Vec::with_capacity(copied.len());
        for mut dict in copied {
            dict.set("Parent", Object::Reference(pages_id));
            new_kids.push(Object::Reference(self.inner.add_object(dict)));
        }

        let mut pages_dict = self
            .inner
            .get_dictionary(pages_id)
            .map_err(|_| PdfError::ParseError("Pages object is not a dictionary".to_string()))?
            .clone();
        let mut kids = pages_dict
            .get(b"Kids")
            .and_then(Object::as_array)
            .cloned()
            .unwrap_or_default();
        let count = pages_dict
            .get(b"Count")
            .and_then(Object::as_i64)
            .unwrap_or(kids.len() as i64);
        let added = new_kids.len() as i64;
        kids.extend(new_kids);
        pages_dict.set("Kids", Object::Array(kids));
        pages_dict.set("Count", Object::Integer(count + added));
        self.inner.objects.insert(pages_id, pages_dict.into());

        self.inner.prune_objects();

        Ok(())
    }

    /// Resolve the root Pages node through the catalog
    fn pages_root_id(&self) -> Result<ObjectId> {
        let catalog_id = self
            .inner
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Document trailer missing Root entry".to_string()))?;
        self.inner
            .get_dictionary(catalog_id)
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Catalog missing Pages entry".to_string()))
    }

    /// Draw an image
    ///
    /// # Arguments
    /// * `data` - Image file bytes (JPEG or PNG)
    /// * `page` - Page number (1-indexed)
    /// * `x`, `y` - Lower-left corner in PDF coordinates
    /// * `width`, `height` - Display size in points
    pub fn draw_image(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        self.page_id(page)?;

        let resource_name = self.get_or_create_image_ref(data, page)?;
        let operators = generate_image_operators(&resource_name, x, y, width, height);
        self.buffer_content(page, &operators);

        Ok(())
    }

    /// Draw a filled rectangle
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    /// * `x`, `y` - Lower-left corner in PDF coordinates
    /// * `width`, `height` - Size in points
    /// * `color` - Fill color
    pub fn draw_rectangle(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Color,
    ) -> Result<()> {
        self.page_id(page)?;

        let operators = format!(
            "q\n{} {} {} rg\n{x} {y} {width} {height} re\nf\nQ\n",
            color.r, color.g, color.b
        );
        self.buffer_content(page, operators.as_bytes());

        Ok(())
    }

    /// Draw a single line of text in Helvetica
    ///
    /// # Arguments
    /// * `text` - Text to draw
    /// * `page` - Page number (1-indexed)
    /// * `x`, `y` - Baseline start in PDF coordinates
    /// * `font_size` - Font size in points
    /// * `color` - Fill color
    pub fn draw_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        font_size: f64,
        color: Color,
    ) -> Result<()> {
        self.page_id(page)?;

        if text.is_empty() {
            return Ok(());
        }

        self.ensure_standard_font(page)?;
        let operators = generate_text_operators(text, x, y, font_size, color);
        self.buffer_content(page, &operators);

        Ok(())
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.flush_content_buffers()?;

        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush_content_buffers()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Buffer content operators for a page (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams, lowest page first
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers = std::mem::take(&mut self.page_content_buffer);

        for (page, content) in buffers {
            if !content.is_empty() {
                self.append_to_content_stream(page, &content)?;
            }
        }

        Ok(())
    }

    /// Append content to a page's content stream
    ///
    /// The existing content is wrapped in `q`/`Q` so any transformation it
    /// leaves behind does not apply to the appended operators.
    fn append_to_content_stream(&mut self, page: usize, content: &[u8]) -> Result<()> {
        let page_id = self.page_id(page)?;

        let page_dict = self
            .inner
            .get_dictionary(page_id)
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?
            .clone();

        let existing = match page_dict.get(b"Contents") {
            Ok(Object::Array(parts)) => {
                let mut combined = Vec::new();
                for part in parts {
                    combined.extend_from_slice(&self.stream_bytes(part));
                    combined.push(b'\n');
                }
                combined
            }
            Ok(obj) => self.stream_bytes(obj),
            Err(_) => Vec::new(),
        };

        let mut new_content = Vec::with_capacity(existing.len() + content.len() + 8);
        if !existing.is_empty() {
            new_content.extend_from_slice(b"q\n");
            new_content.extend_from_slice(&existing);
            new_content.extend_from_slice(b"\nQ\n");
        }
        new_content.extend_from_slice(content);

        let stream_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), new_content));

        let mut new_page_dict = page_dict;
        new_page_dict.set(b"Contents", Object::Reference(stream_id));
        self.inner.objects.insert(page_id, new_page_dict.into());

        Ok(())
    }

    /// Decoded bytes of a content stream given directly or by reference
    fn stream_bytes(&self, obj: &Object) -> Vec<u8> {
        match resolve(&self.inner, obj) {
            Object::Stream(stream) => stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone()),
            _ => Vec::new(),
        }
    }

    /// Get or create an image reference for a specific page
    ///
    /// Returns the resource name. Images are deduplicated by hash of their
    /// data, so a signature stamped on ten pages is embedded once.
    fn get_or_create_image_ref(&mut self, data: &[u8], page: usize) -> Result<String> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        let object_id = match self.embedded_images.get(&data_hash) {
            Some(embedded) => embedded.object_id,
            None => {
                let xobject = ImageXObject::from_bytes(data)?;
                let mask_id = xobject
                    .soft_mask_stream()
                    .map(|mask| self.inner.add_object(mask));
                let object_id = self.inner.add_object(xobject.to_pdf_stream(mask_id));
                self.embedded_images
                    .insert(data_hash, EmbeddedImage { object_id });
                object_id
            }
        };

        if let Some(name) = self
            .page_image_resources
            .get(&page)
            .and_then(|resources| resources.get(&object_id))
        {
            return Ok(name.clone());
        }

        let resource_name = format!("EdIm{}", self.next_image_resource);
        self.next_image_resource += 1;

        self.add_page_resource(page, b"XObject", &resource_name, object_id)?;
        self.page_image_resources
            .entry(page)
            .or_default()
            .insert(object_id, resource_name.clone());

        Ok(resource_name)
    }

    /// Make the Helvetica font available to a page
    fn ensure_standard_font(&mut self, page: usize) -> Result<()> {
        if self.pages_with_standard_font.contains(&page) {
            return Ok(());
        }

        let font_id = match self.standard_font {
            Some(id) => id,
            None => {
                let id = self.inner.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                    "Encoding" => "WinAnsiEncoding",
                });
                self.standard_font = Some(id);
                id
            }
        };

        self.add_page_resource(page, b"Font", STANDARD_FONT_RESOURCE, font_id)?;
        self.pages_with_standard_font.push(page);

        Ok(())
    }

    /// Register a named resource in a page's Resources dictionary
    ///
    /// Resources inherited from the page tree or stored by reference are
    /// copied onto the page first, so existing entries stay visible.
    fn add_page_resource(
        &mut self,
        page: usize,
        category: &[u8],
        name: &str,
        object_id: ObjectId,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;

        let mut resources = inherited_attribute(&self.inner, page_id, b"Resources")
            .and_then(|obj| resolve(&self.inner, &obj).as_dict().ok().cloned())
            .unwrap_or_default();

        let mut entries = resources
            .get(category)
            .ok()
            .and_then(|obj| resolve(&self.inner, obj).as_dict().ok().cloned())
            .unwrap_or_default();
        entries.set(name.as_bytes(), Object::Reference(object_id));
        resources.set(category, Object::Dictionary(entries));

        let mut page_dict = self
            .inner
            .get_dictionary(page_id)
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?
            .clone();
        page_dict.set(b"Resources", Object::Dictionary(resources));
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(())
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Follow a reference to the object it points at, if any
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Look up a page attribute on the page or its nearest ancestor
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}
