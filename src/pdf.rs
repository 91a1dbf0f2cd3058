//! Read-only PDF view used for page thumbnails.
//!
//! Objects are located by scanning the byte buffer for `N G obj` headers, so
//! damaged cross-reference tables do not matter. Compressed object streams
//! are unpacked, then the page tree is walked from the catalog to find every
//! page and its (possibly inherited) media box.

use crate::compression;
use crate::ports::{DocumentReader, SourceBytes};
use anyhow::{anyhow, bail, Context, Result};
use image::{Rgba, RgbaImage};
use regex::bytes::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// US Letter, used when no media box is present anywhere up the tree.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];
const MAX_TREE_DEPTH: usize = 64;
const MAX_REF_CHAIN: usize = 32;
const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(Vec<u8>),
    Name(String),
    Array(Vec<PdfObject>),
    Dictionary(HashMap<String, PdfObject>),
    Stream {
        dictionary: HashMap<String, PdfObject>,
        data: Vec<u8>,
    },
    Reference(u32, u16),
}

impl PdfObject {
    pub fn as_dict(&self) -> Option<&HashMap<String, PdfObject>> {
        match self {
            PdfObject::Dictionary(dict) => Some(dict),
            PdfObject::Stream { dictionary, .. } => Some(dictionary),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            PdfObject::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PdfObject::Integer(i) => Some(*i as f64),
            PdfObject::Real(r) => Some(*r),
            _ => None,
        }
    }

    fn type_name(&self) -> Option<&str> {
        self.as_dict()?.get("Type")?.as_name()
    }
}

/// One leaf of the page tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    /// Object number of the page dictionary
    pub object: u32,
    pub media_box: [f64; 4],
    pub rotate: i64,
}

impl PageGeometry {
    /// Displayed size in points, with quarter turns applied.
    pub fn size(&self) -> (f64, f64) {
        let width = (self.media_box[2] - self.media_box[0]).abs();
        let height = (self.media_box[3] - self.media_box[1]).abs();
        if self.rotate.rem_euclid(180) == 90 {
            (height, width)
        } else {
            (width, height)
        }
    }
}

#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub version: String,
    pub objects: HashMap<u32, PdfObject>,
    pub catalog: u32,
    pub pages: Vec<PageGeometry>,
}

impl PdfDocument {
    pub fn load_from_bytes(data: &[u8]) -> Result<Self> {
        let version = parse_header(data)?;
        let mut objects = scan_objects(data);
        if objects.is_empty() {
            bail!("No PDF objects found");
        }
        unpack_object_streams(&mut objects);
        log::debug!("Scanned {} objects (PDF {})", objects.len(), version);

        let catalog = find_catalog(data, &objects).ok_or_else(|| anyhow!("Missing document catalog"))?;
        let mut doc = PdfDocument {
            version,
            objects,
            catalog,
            pages: Vec::new(),
        };
        doc.pages = doc.collect_pages()?;
        if doc.pages.is_empty() {
            bail!("Document has no pages");
        }
        Ok(doc)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Follows references until a direct object is reached.
    pub fn resolve<'a>(&'a self, obj: &'a PdfObject) -> Option<&'a PdfObject> {
        let mut current = obj;
        for _ in 0..MAX_REF_CHAIN {
            match current {
                PdfObject::Reference(num, _) => current = self.objects.get(num)?,
                other => return Some(other),
            }
        }
        None
    }

    fn collect_pages(&self) -> Result<Vec<PageGeometry>> {
        let catalog = self
            .objects
            .get(&self.catalog)
            .and_then(PdfObject::as_dict)
            .ok_or_else(|| anyhow!("Catalog {} is not a dictionary", self.catalog))?;
        let root = match catalog.get("Pages") {
            Some(PdfObject::Reference(num, _)) => *num,
            _ => bail!("Catalog has no /Pages reference"),
        };

        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        let inherited = Inherited {
            media_box: None,
            rotate: 0,
        };
        self.walk_page_tree(root, inherited, 0, &mut visited, &mut pages)?;
        Ok(pages)
    }

    fn walk_page_tree(
        &self,
        node: u32,
        inherited: Inherited,
        depth: usize,
        visited: &mut HashSet<u32>,
        pages: &mut Vec<PageGeometry>,
    ) -> Result<()> {
        if depth > MAX_TREE_DEPTH {
            bail!("Page tree deeper than {} levels", MAX_TREE_DEPTH);
        }
        if !visited.insert(node) {
            log::warn!("Page tree revisits object {}, skipping", node);
            return Ok(());
        }
        let dict = self
            .objects
            .get(&node)
            .and_then(PdfObject::as_dict)
            .ok_or_else(|| anyhow!("Page tree node {} is missing", node))?;

        let inherited = Inherited {
            media_box: dict
                .get("MediaBox")
                .and_then(|b| self.read_box(b))
                .or(inherited.media_box),
            rotate: dict
                .get("Rotate")
                .and_then(|r| self.resolve(r))
                .and_then(PdfObject::as_number)
                .map(|r| r as i64)
                .unwrap_or(inherited.rotate),
        };

        let kids = dict.get("Kids").and_then(|k| self.resolve(k));
        let is_leaf = match dict.get("Type").and_then(PdfObject::as_name) {
            Some("Page") => true,
            Some("Pages") => false,
            _ => kids.is_none(),
        };

        if is_leaf {
            pages.push(PageGeometry {
                object: node,
                media_box: inherited.media_box.unwrap_or(DEFAULT_MEDIA_BOX),
                rotate: inherited.rotate,
            });
            return Ok(());
        }

        if let Some(PdfObject::Array(kids)) = kids {
            for kid in kids {
                match kid {
                    PdfObject::Reference(num, _) => {
                        self.walk_page_tree(*num, inherited.clone(), depth + 1, visited, pages)?
                    }
                    other => log::warn!("Ignoring non-reference page tree kid {:?}", other),
                }
            }
        }
        Ok(())
    }

    fn read_box(&self, obj: &PdfObject) -> Option<[f64; 4]> {
        match self.resolve(obj)? {
            PdfObject::Array(items) if items.len() == 4 => {
                let mut out = [0.0; 4];
                for (slot, item) in out.iter_mut().zip(items) {
                    *slot = self.resolve(item)?.as_number()?;
                }
                Some(out)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Inherited {
    media_box: Option<[f64; 4]>,
    rotate: i64,
}

/// Returns the version from the `%PDF-x.y` header, which may be preceded by
/// up to 1 KiB of junk.
fn parse_header(data: &[u8]) -> Result<String> {
    let window = &data[..data.len().min(1024)];
    let start = window
        .windows(5)
        .position(|w| w == b"%PDF-")
        .ok_or_else(|| anyhow!("Missing PDF header (%PDF-x.x)"))?;
    let version: String = data[start + 5..]
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b'.')
        .map(|b| *b as char)
        .collect();
    Ok(version)
}

static OBJECT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    // Literal pattern; cannot fail to compile.
    Regex::new(r"(\d+)\s+(\d+)\s+obj").expect("valid object header pattern")
});

/// Scans for `N G obj` headers and parses each object. Later definitions of
/// the same object number (incremental updates) replace earlier ones.
fn scan_objects(data: &[u8]) -> HashMap<u32, PdfObject> {
    let re = &*OBJECT_HEADER;
    let mut objects = HashMap::new();
    let mut pos = 0;

    while let Some(caps) = re.captures_at(data, pos) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => break,
        };
        pos = whole.end();

        if whole.start() > 0 && !is_delimiter_or_ws(data[whole.start() - 1]) {
            continue;
        }
        let number = std::str::from_utf8(&caps[1]).ok().and_then(|s| s.parse::<u32>().ok());
        let Some(number) = number else {
            log::warn!("Unreadable object number at offset {}", whole.start());
            continue;
        };

        let mut lexer = Lexer::new(data, whole.end());
        match lexer.parse_indirect_body() {
            Ok(obj) => {
                pos = lexer.pos;
                objects.insert(number, obj);
            }
            Err(e) => log::debug!("Skipping object {} at offset {}: {}", number, whole.start(), e),
        }
    }
    objects
}

/// Expands `/Type /ObjStm` streams. Objects already found directly win.
fn unpack_object_streams(objects: &mut HashMap<u32, PdfObject>) {
    let mut unpacked = Vec::new();
    for (num, obj) in objects.iter() {
        let PdfObject::Stream { dictionary, data } = obj else {
            continue;
        };
        if obj.type_name() != Some("ObjStm") {
            continue;
        }
        let n = dictionary.get("N").and_then(PdfObject::as_number).unwrap_or(0.0) as usize;
        let first = dictionary.get("First").and_then(PdfObject::as_number).unwrap_or(0.0) as usize;
        let decoded = match decode_stream(dictionary, data) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Cannot decode object stream {}: {}", num, e);
                continue;
            }
        };
        unpacked.extend(parse_object_stream(&decoded, n, first));
    }
    for (num, obj) in unpacked {
        objects.entry(num).or_insert(obj);
    }
}

/// Parses the `N` objects of a decoded object stream whose data starts at
/// byte `first`. Header pairs that are negative or point past the data are
/// skipped.
pub fn parse_object_stream(data: &[u8], n: usize, first: usize) -> Vec<(u32, PdfObject)> {
    let mut results = Vec::new();
    if first > data.len() {
        return results;
    }

    // Each pair takes at least four header bytes ("1 0 ").
    let n = n.min(first / 4 + 1);
    let mut header = Lexer::new(&data[..first], 0);
    let mut entries = Vec::new();
    for _ in 0..n {
        let (Ok(PdfObject::Integer(num)), Ok(PdfObject::Integer(offset))) =
            (header.parse_object(), header.parse_object())
        else {
            break;
        };
        let (Ok(num), Ok(offset)) = (u32::try_from(num), usize::try_from(offset)) else {
            log::warn!("Ignoring object stream entry {} at offset {}", num, offset);
            continue;
        };
        entries.push((num, offset));
    }

    for (num, offset) in entries {
        let Some(start) = first.checked_add(offset).filter(|s| *s < data.len()) else {
            log::warn!("Object {} offset {} lies outside its object stream", num, offset);
            continue;
        };
        let mut lexer = Lexer::new(data, start);
        if let Ok(obj) = lexer.parse_object() {
            results.push((num, obj));
        }
    }
    results
}

fn decode_stream(dictionary: &HashMap<String, PdfObject>, data: &[u8]) -> Result<Vec<u8>> {
    let filters: Vec<&str> = match dictionary.get("Filter") {
        None => Vec::new(),
        Some(PdfObject::Name(name)) => vec![name.as_str()],
        Some(PdfObject::Array(items)) => items.iter().filter_map(PdfObject::as_name).collect(),
        Some(other) => bail!("Unsupported /Filter value {:?}", other),
    };
    let mut out = data.to_vec();
    for filter in filters {
        out = match filter {
            "FlateDecode" | "Fl" => compression::decompress_deflate(&out)?,
            other => bail!("Unsupported filter {}", other),
        };
    }
    Ok(out)
}

/// Catalog from the last trailer `/Root`, then xref stream `/Root`, then
/// the highest numbered `/Type /Catalog` object.
fn find_catalog(data: &[u8], objects: &HashMap<u32, PdfObject>) -> Option<u32> {
    let is_catalog = |num: u32| objects.get(&num).and_then(PdfObject::type_name) == Some("Catalog");

    let trailer_root = find_all(data, b"trailer")
        .into_iter()
        .rev()
        .filter_map(|at| {
            let mut lexer = Lexer::new(data, at + b"trailer".len());
            match lexer.parse_object() {
                Ok(PdfObject::Dictionary(dict)) => root_of(&dict),
                _ => None,
            }
        })
        .find(|num| is_catalog(*num));
    if trailer_root.is_some() {
        return trailer_root;
    }

    let mut xref_streams: Vec<(&u32, &PdfObject)> = objects
        .iter()
        .filter(|(_, obj)| obj.type_name() == Some("XRef"))
        .collect();
    xref_streams.sort_by_key(|(num, _)| std::cmp::Reverse(**num));
    let xref_root = xref_streams
        .into_iter()
        .filter_map(|(_, obj)| obj.as_dict().and_then(root_of))
        .find(|num| is_catalog(*num));
    if xref_root.is_some() {
        return xref_root;
    }

    objects.keys().copied().filter(|num| is_catalog(*num)).max()
}

fn root_of(dict: &HashMap<String, PdfObject>) -> Option<u32> {
    match dict.get("Root") {
        Some(PdfObject::Reference(num, _)) => Some(*num),
        _ => None,
    }
}

fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, w)| *w == needle)
        .map(|(i, _)| i)
        .collect()
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\0')
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn is_delimiter_or_ws(b: u8) -> bool {
    is_whitespace(b) || is_delimiter(b)
}

// --- Lexer ---

struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Lexer<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Lexer { data, pos, depth: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while let Some(c) = self.peek() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn starts_with(&self, s: &[u8]) -> bool {
        self.data[self.pos.min(self.data.len())..].starts_with(s)
    }

    fn keyword(&mut self) -> &'a [u8] {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_delimiter_or_ws(b) {
                break;
            }
            self.pos += 1;
        }
        &self.data[start..self.pos]
    }

    /// Object body after `N G obj`, including stream data when present.
    fn parse_indirect_body(&mut self) -> Result<PdfObject> {
        let obj = self.parse_object()?;
        self.skip_ws();
        if !self.starts_with(b"stream") {
            return Ok(obj);
        }
        let PdfObject::Dictionary(dictionary) = obj else {
            bail!("stream keyword after a non-dictionary object");
        };
        self.pos += b"stream".len();
        if self.starts_with(b"\r\n") {
            self.pos += 2;
        } else if self.starts_with(b"\n") || self.starts_with(b"\r") {
            self.pos += 1;
        }
        let start = self.pos;

        let declared = match dictionary.get("Length") {
            Some(PdfObject::Integer(len)) if *len >= 0 => Some(*len as usize),
            _ => None,
        };
        let end = match declared.filter(|len| self.length_is_plausible(start, *len)) {
            Some(len) => start + len,
            None => {
                let rel = self.data[start..]
                    .windows(b"endstream".len())
                    .position(|w| w == b"endstream")
                    .ok_or_else(|| anyhow!("Unterminated stream"))?;
                let mut end = start + rel;
                if end > start && self.data[end - 1] == b'\n' {
                    end -= 1;
                }
                if end > start && self.data[end - 1] == b'\r' {
                    end -= 1;
                }
                end
            }
        };
        let data = self.data[start..end].to_vec();
        self.pos = end;
        self.skip_ws();
        if self.starts_with(b"endstream") {
            self.pos += b"endstream".len();
        }
        Ok(PdfObject::Stream { dictionary, data })
    }

    fn length_is_plausible(&self, start: usize, len: usize) -> bool {
        let Some(end) = start.checked_add(len) else {
            return false;
        };
        if end > self.data.len() {
            return false;
        }
        let mut after = Lexer::new(self.data, end);
        after.skip_ws();
        after.starts_with(b"endstream")
    }

    fn parse_object(&mut self) -> Result<PdfObject> {
        self.skip_ws();
        let b = self.peek().ok_or_else(|| anyhow!("Unexpected end of data"))?;
        match b {
            b'<' if self.starts_with(b"<<") => self.nested(Self::parse_dict).map(PdfObject::Dictionary),
            b'<' => self.parse_hex_string(),
            b'[' => self.nested(Self::parse_array),
            b'(' => self.parse_literal_string(),
            b'/' => {
                self.pos += 1;
                Ok(PdfObject::Name(decode_name(self.keyword())))
            }
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.parse_number_or_ref(),
            _ => {
                let at = self.pos;
                match self.keyword() {
                    b"true" => Ok(PdfObject::Boolean(true)),
                    b"false" => Ok(PdfObject::Boolean(false)),
                    b"null" => Ok(PdfObject::Null),
                    other => bail!(
                        "Unexpected token '{}' at offset {}",
                        String::from_utf8_lossy(other),
                        at
                    ),
                }
            }
        }
    }

    /// Runs a container parser one nesting level deeper.
    fn nested<T>(&mut self, parse: fn(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            bail!("Objects nested deeper than {} levels at offset {}", MAX_NESTING, self.pos);
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_dict(&mut self) -> Result<HashMap<String, PdfObject>> {
        self.pos += 2;
        let mut dict = HashMap::new();
        loop {
            self.skip_ws();
            if self.starts_with(b">>") {
                self.pos += 2;
                return Ok(dict);
            }
            match self.parse_object().context("Malformed dictionary")? {
                PdfObject::Name(key) => {
                    let value = self.parse_object()?;
                    dict.insert(key, value);
                }
                other => bail!("Dictionary key must be a name, found {:?}", other),
            }
        }
    }

    fn parse_array(&mut self) -> Result<PdfObject> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return Ok(PdfObject::Array(items));
                }
                Some(_) => items.push(self.parse_object()?),
                None => bail!("Unterminated array"),
            }
        }
    }

    fn parse_number(&mut self) -> Result<PdfObject> {
        let token = self.keyword();
        let text = std::str::from_utf8(token)?;
        if text.contains('.') {
            // PDF allows forms like "-.5" and "4." which Rust parses fine.
            Ok(PdfObject::Real(text.parse::<f64>().with_context(|| format!("Bad number '{}'", text))?))
        } else {
            Ok(PdfObject::Integer(text.parse::<i64>().with_context(|| format!("Bad number '{}'", text))?))
        }
    }

    /// `N G R` is a reference; anything else is a plain number.
    fn parse_number_or_ref(&mut self) -> Result<PdfObject> {
        let first = self.parse_number()?;
        let PdfObject::Integer(num) = first else {
            return Ok(first);
        };
        let save = self.pos;
        self.skip_ws();
        if matches!(self.peek(), Some(b'0'..=b'9')) {
            if let Ok(PdfObject::Integer(generation)) = self.parse_number() {
                self.skip_ws();
                if self.peek() == Some(b'R')
                    && self.data.get(self.pos + 1).is_none_or(|b| is_delimiter_or_ws(*b))
                {
                    self.pos += 1;
                    return Ok(PdfObject::Reference(num as u32, generation as u16));
                }
            }
        }
        self.pos = save;
        Ok(PdfObject::Integer(num))
    }

    fn parse_literal_string(&mut self) -> Result<PdfObject> {
        self.pos += 1;
        let mut out = Vec::new();
        let mut depth = 1usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => {
                    let Some(next) = self.peek() else { break };
                    self.pos += 1;
                    match next {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0c),
                        b'\r' => {
                            if self.peek() == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut value = u32::from(next - b'0');
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        value = value * 8 + u32::from(d - b'0');
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((value & 0xff) as u8);
                        }
                        other => out.push(other),
                    }
                }
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(PdfObject::String(out));
                    }
                    out.push(b);
                }
                _ => out.push(b),
            }
        }
        bail!("Unterminated literal string")
    }

    fn parse_hex_string(&mut self) -> Result<PdfObject> {
        self.pos += 1;
        let mut digits = Vec::new();
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'>' {
                if digits.len() % 2 == 1 {
                    digits.push(b'0');
                }
                let bytes = digits
                    .chunks(2)
                    .map(|pair| {
                        let s = std::str::from_utf8(pair).unwrap_or("00");
                        u8::from_str_radix(s, 16).unwrap_or(0)
                    })
                    .collect();
                return Ok(PdfObject::String(bytes));
            }
            if b.is_ascii_hexdigit() {
                digits.push(b);
            } else if !is_whitespace(b) {
                bail!("Invalid hex string digit '{}'", b as char);
            }
        }
        bail!("Unterminated hex string")
    }
}

/// Names may escape bytes as `#xx`.
fn decode_name(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            let hex = std::str::from_utf8(&raw[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

// --- Reader port ---

/// Built-in [`DocumentReader`]: parses with [`PdfDocument`] and rasterizes
/// page geometry only (white sheet with an outline at the page's aspect).
#[derive(Debug, Clone, Default)]
pub struct PdfReader;

impl PdfReader {
    pub fn new() -> Self {
        PdfReader
    }
}

const PAGE_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const PAGE_OUTLINE: Rgba<u8> = Rgba([160, 160, 160, 255]);

impl DocumentReader for PdfReader {
    type Handle = PdfDocument;
    type PageRef = PageGeometry;

    fn parse(&self, bytes: &SourceBytes) -> Result<PdfDocument> {
        PdfDocument::load_from_bytes(bytes)
    }

    fn page_count(&self, handle: &PdfDocument) -> usize {
        handle.page_count()
    }

    fn get_page(&self, handle: &PdfDocument, index: usize) -> Result<PageGeometry> {
        handle
            .pages
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("Page index {} out of range ({} pages)", index, handle.page_count()))
    }

    fn render(&self, page: &PageGeometry, scale: f32) -> Result<RgbaImage> {
        if !scale.is_finite() || scale <= 0.0 {
            bail!("Invalid render scale {}", scale);
        }
        let (width, height) = page.size();
        let w = (width * f64::from(scale)).ceil().max(1.0);
        let h = (height * f64::from(scale)).ceil().max(1.0);
        if w > 16384.0 || h > 16384.0 {
            bail!("Rendered page would be {}x{} pixels", w, h);
        }
        let (w, h) = (w as u32, h as u32);

        let mut surface = RgbaImage::from_pixel(w, h, PAGE_FILL);
        for x in 0..w {
            surface.put_pixel(x, 0, PAGE_OUTLINE);
            surface.put_pixel(x, h - 1, PAGE_OUTLINE);
        }
        for y in 0..h {
            surface.put_pixel(0, y, PAGE_OUTLINE);
            surface.put_pixel(w - 1, y, PAGE_OUTLINE);
        }
        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PAGES: &[u8] = b"%PDF-1.4\n\
1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
2 0 obj\n<</Type/Pages/Kids[3 0 R 4 0 R]/Count 2/MediaBox[0 0 595 842]>>\nendobj\n\
3 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n\
4 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Rotate 90 >>\nendobj\n\
trailer\n<< /Size 5 /Root 1 0 R >>\nstartxref\n0\n%%EOF\n";

    #[test]
    fn test_load_pages_in_tree_order() {
        let doc = PdfDocument::load_from_bytes(TWO_PAGES).unwrap();
        assert_eq!(doc.version, "1.4");
        assert_eq!(doc.catalog, 1);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[0].object, 3);
        assert_eq!(doc.pages[0].media_box, [0.0, 0.0, 595.0, 842.0]);
        assert_eq!(doc.pages[1].size(), (792.0, 612.0));
    }

    #[test]
    fn test_scan_objects_reuses_pattern() {
        let first = scan_objects(TWO_PAGES);
        let second = scan_objects(TWO_PAGES);
        assert!(!first.is_empty());
        assert_eq!(first, second);
        assert!(OBJECT_HEADER.is_match(b"12 0 obj"));
        assert!(!OBJECT_HEADER.is_match(b"12 obj"));
    }

    #[test]
    fn test_missing_header() {
        let err = PdfDocument::load_from_bytes(b"hello world").unwrap_err();
        assert!(err.to_string().contains("Missing PDF header"));
    }

    #[test]
    fn test_no_pages() {
        let data = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n%%EOF";
        assert!(PdfDocument::load_from_bytes(data).is_err());
    }

    #[test]
    fn test_page_tree_cycle_is_tolerated() {
        let data = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
2 0 obj\n<< /Type /Pages /Kids [3 0 R 2 0 R] >>\nendobj\n\
3 0 obj\n<< /Type /Page >>\nendobj\n%%EOF";
        let doc = PdfDocument::load_from_bytes(data).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages[0].media_box, DEFAULT_MEDIA_BOX);
    }

    #[test]
    fn test_stream_with_length() {
        let data = b"7 0 obj\n<< /Length 5 >>\nstream\nab)cd\nendstream\nendobj\n";
        let objects = scan_objects(data);
        match &objects[&7] {
            PdfObject::Stream { data, .. } => assert_eq!(data, b"ab)cd"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_with_indirect_length() {
        let data = b"7 0 obj\n<< /Length 8 0 R >>\nstream\r\nxyz\r\nendstream\nendobj\n8 0 obj 3 endobj";
        let objects = scan_objects(data);
        match &objects[&7] {
            PdfObject::Stream { data, .. } => assert_eq!(data, b"xyz"),
            other => panic!("expected stream, got {:?}", other),
        }
        assert_eq!(objects[&8], PdfObject::Integer(3));
    }

    #[test]
    fn test_lexer_values() {
        let mut lexer = Lexer::new(b"[1 -2.5 /N#20ame (a\\(b\\)c\\101) <48 69> true null 4 0 R]", 0);
        let obj = lexer.parse_object().unwrap();
        assert_eq!(
            obj,
            PdfObject::Array(vec![
                PdfObject::Integer(1),
                PdfObject::Real(-2.5),
                PdfObject::Name("N ame".into()),
                PdfObject::String(b"a(b)cA".to_vec()),
                PdfObject::String(b"Hi".to_vec()),
                PdfObject::Boolean(true),
                PdfObject::Null,
                PdfObject::Reference(4, 0),
            ])
        );
    }

    #[test]
    fn test_parse_object_stream() {
        let stream = b"10 0 20 17 << /Type /Page >> null";
        let results = parse_object_stream(stream, 2, 11);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 10);
        assert_eq!(results[0].1.type_name(), Some("Page"));
        assert_eq!(results[1], (20, PdfObject::Null));
    }

    #[test]
    fn test_parse_object_stream_out_of_bounds() {
        assert!(parse_object_stream(b"", 0, 0).is_empty());
        assert!(parse_object_stream(b"10 0 ", 1, 100).is_empty());
    }

    #[test]
    fn test_object_stream_negative_offset_skipped() {
        assert!(parse_object_stream(b"9 -1 null", 1, 5).is_empty());
        assert!(parse_object_stream(b"-9 0 null", 1, 5).is_empty());
        // An offset that lands past the data is ignored too.
        let header = format!("9 {} null", i64::MAX);
        assert!(parse_object_stream(header.as_bytes(), 1, header.len() - 4).is_empty());
    }

    #[test]
    fn test_object_stream_count_is_capped() {
        let results = parse_object_stream(b"10 0 null", usize::MAX, 5);
        assert_eq!(results, vec![(10, PdfObject::Null)]);
    }

    #[test]
    fn test_hostile_object_streams_do_not_break_loading() {
        for header in ["/N 1 /First 5", "/N 1000000000000000000 /First 5"] {
            let mut data = TWO_PAGES.to_vec();
            data.extend_from_slice(
                format!(
                    "99 0 obj << /Type /ObjStm {} /Length 9 >> stream\n9 -1 null\nendstream endobj\n",
                    header
                )
                .as_bytes(),
            );
            let doc = PdfDocument::load_from_bytes(&data).unwrap();
            assert_eq!(doc.page_count(), 2);
        }
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let deep = vec![b'['; 200_000];
        let err = Lexer::new(&deep, 0).parse_object().unwrap_err();
        assert!(err.to_string().contains("nested deeper"));

        let mut nested = "[".repeat(MAX_NESTING - 1);
        nested.push_str(&"]".repeat(MAX_NESTING - 1));
        assert!(Lexer::new(nested.as_bytes(), 0).parse_object().is_ok());

        let mut data = TWO_PAGES.to_vec();
        data.extend_from_slice(b"9 0 obj\n");
        data.extend_from_slice(&deep);
        let doc = PdfDocument::load_from_bytes(&data).unwrap();
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_compressed_object_stream() {
        let body = b"3 0 << /Type /Page /MediaBox [0 0 100 200] >>";
        let packed = compression::compress_deflate(body).unwrap();
        let mut data = b"%PDF-1.5\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n"
            .to_vec();
        data.extend_from_slice(
            format!(
                "5 0 obj\n<< /Type /ObjStm /N 1 /First 4 /Filter /FlateDecode /Length {} >>\nstream\n",
                packed.len()
            )
            .as_bytes(),
        );
        data.extend_from_slice(&packed);
        data.extend_from_slice(b"\nendstream\nendobj\n%%EOF\n");

        let doc = PdfDocument::load_from_bytes(&data).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages[0].size(), (100.0, 200.0));
    }

    #[test]
    fn test_render_outline() {
        let reader = PdfReader::new();
        let doc = reader.parse(&SourceBytes::new(TWO_PAGES.to_vec())).unwrap();
        let page = reader.get_page(&doc, 0).unwrap();
        let image = reader.render(&page, 0.1).unwrap();
        assert_eq!(image.dimensions(), (60, 85));
        assert_eq!(*image.get_pixel(0, 0), PAGE_OUTLINE);
        assert_eq!(*image.get_pixel(30, 40), PAGE_FILL);

        assert!(reader.render(&page, 0.0).is_err());
        assert!(reader.get_page(&doc, 2).is_err());
    }
}
