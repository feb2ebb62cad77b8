//! Fixture writers for tests: a minimal class-file assembler and a JAR
//! writer.
//!
//! Everything here panics on failure; it only ever runs inside tests.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Entry {
    Utf8(String),
    Integer(i32),
    Long(i64),
    Class(u16),
    String(u16),
}

/// Interning constant-pool writer.
#[derive(Debug, Default)]
struct Pool {
    bytes: Vec<u8>,
    index: HashMap<Entry, u16>,
    next: u16,
}

impl Pool {
    fn new() -> Self {
        Self {
            next: 1,
            ..Default::default()
        }
    }

    fn intern(&mut self, entry: Entry) -> u16 {
        if let Some(&i) = self.index.get(&entry) {
            return i;
        }
        let i = self.next;
        match &entry {
            Entry::Utf8(s) => {
                self.bytes.push(1);
                put_u16(&mut self.bytes, s.len() as u16);
                self.bytes.extend_from_slice(s.as_bytes());
            }
            Entry::Integer(v) => {
                self.bytes.push(3);
                self.bytes.extend_from_slice(&v.to_be_bytes());
            }
            Entry::Long(v) => {
                self.bytes.push(5);
                self.bytes.extend_from_slice(&v.to_be_bytes());
            }
            Entry::Class(name) => {
                self.bytes.push(7);
                put_u16(&mut self.bytes, *name);
            }
            Entry::String(value) => {
                self.bytes.push(8);
                put_u16(&mut self.bytes, *value);
            }
        }
        // Long takes two slots.
        self.next += if matches!(entry, Entry::Long(_)) { 2 } else { 1 };
        self.index.insert(entry, i);
        i
    }

    fn utf8(&mut self, s: &str) -> u16 {
        self.intern(Entry::Utf8(s.to_owned()))
    }

    fn class(&mut self, name: &str) -> u16 {
        let n = self.utf8(name);
        self.intern(Entry::Class(n))
    }

    fn int(&mut self, v: i32) -> u16 {
        self.intern(Entry::Integer(v))
    }
}

/// Annotation element value.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementSpec {
    String(String),
    Int(i32),
    Boolean(bool),
    Array(Vec<ElementSpec>),
    /// Enum type descriptor and constant name.
    Enum(String, String),
    /// Class descriptor, e.g. `Ljava/lang/String;`.
    Class(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSpec {
    descriptor: String,
    elements: Vec<(String, ElementSpec)>,
}

impl AnnotationSpec {
    pub fn new(descriptor: &str) -> Self {
        Self {
            descriptor: descriptor.to_owned(),
            elements: vec![],
        }
    }

    pub fn element(mut self, name: &str, value: ElementSpec) -> Self {
        self.elements.push((name.to_owned(), value));
        self
    }
}

#[derive(Debug, Clone)]
enum Constant {
    Int(i32),
    Long(i64),
    String(String),
}

#[derive(Debug, Clone)]
struct Member {
    access: u16,
    name: String,
    descriptor: String,
    constant: Option<Constant>,
    exceptions: Vec<String>,
    code: Option<Vec<u8>>,
}

impl Member {
    fn new(access: u16, name: &str, descriptor: &str) -> Self {
        Self {
            access,
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
            constant: None,
            exceptions: vec![],
            code: None,
        }
    }
}

#[derive(Debug, Clone)]
struct InnerClass {
    name: String,
    outer: Option<String>,
    simple_name: Option<String>,
    access: u16,
}

/// Assembles a class file.
///
/// Defaults to version 52.0, `public super`, extending `java/lang/Object`.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: String,
    major: u16,
    minor: u16,
    access: u16,
    super_name: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<Member>,
    methods: Vec<Member>,
    source_file: Option<String>,
    visible_annotations: Option<Vec<AnnotationSpec>>,
    nest_members: Option<Vec<String>>,
    inner_classes: Vec<InnerClass>,
    raw_attributes: Vec<(String, Vec<u8>)>,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            major: 52,
            minor: 0,
            access: 0x0021,
            super_name: Some("java/lang/Object".to_owned()),
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
            source_file: None,
            visible_annotations: None,
            nest_members: None,
            inner_classes: vec![],
            raw_attributes: vec![],
        }
    }

    pub fn version(mut self, major: u16, minor: u16) -> Self {
        self.major = major;
        self.minor = minor;
        self
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn super_name(mut self, name: Option<&str>) -> Self {
        self.super_name = name.map(str::to_owned);
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_owned());
        self
    }

    pub fn field(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        self.fields.push(Member::new(access, name, descriptor));
        self
    }

    /// `static final int` field with a `ConstantValue`.
    pub fn int_constant_field(mut self, name: &str, value: i32) -> Self {
        let mut field = Member::new(0x0019, name, "I");
        field.constant = Some(Constant::Int(value));
        self.fields.push(field);
        self
    }

    pub fn long_constant_field(mut self, name: &str, value: i64) -> Self {
        let mut field = Member::new(0x0019, name, "J");
        field.constant = Some(Constant::Long(value));
        self.fields.push(field);
        self
    }

    pub fn string_constant_field(mut self, name: &str, value: &str) -> Self {
        let mut field = Member::new(0x0019, name, "Ljava/lang/String;");
        field.constant = Some(Constant::String(value.to_owned()));
        self.fields.push(field);
        self
    }

    pub fn method(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        self.methods.push(Member::new(access, name, descriptor));
        self
    }

    pub fn method_with_exceptions(
        mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        exceptions: &[&str],
    ) -> Self {
        let mut method = Member::new(access, name, descriptor);
        method.exceptions = exceptions.iter().map(|e| e.to_string()).collect();
        self.methods.push(method);
        self
    }

    /// Method with a `Code` attribute holding `code` verbatim.
    pub fn method_with_code(mut self, access: u16, name: &str, descriptor: &str, code: &[u8]) -> Self {
        let mut method = Member::new(access, name, descriptor);
        method.code = Some(code.to_vec());
        self.methods.push(method);
        self
    }

    pub fn source_file(mut self, name: &str) -> Self {
        self.source_file = Some(name.to_owned());
        self
    }

    /// `RuntimeVisibleAnnotations` on the class; an empty list still
    /// writes the attribute.
    pub fn visible_annotations(mut self, annotations: Vec<AnnotationSpec>) -> Self {
        self.visible_annotations = Some(annotations);
        self
    }

    pub fn nest_members(mut self, members: &[&str]) -> Self {
        self.nest_members = Some(members.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn inner_class(
        mut self,
        name: &str,
        outer: Option<&str>,
        simple_name: Option<&str>,
        access: u16,
    ) -> Self {
        self.inner_classes.push(InnerClass {
            name: name.to_owned(),
            outer: outer.map(str::to_owned),
            simple_name: simple_name.map(str::to_owned),
            access,
        });
        self
    }

    /// Class attribute written as-is under `name`.
    pub fn raw_attribute(mut self, name: &str, body: &[u8]) -> Self {
        self.raw_attributes.push((name.to_owned(), body.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut cp = Pool::new();
        let mut body = Vec::new();

        put_u16(&mut body, self.access);
        put_u16(&mut body, cp.class(&self.name));
        put_u16(&mut body, self.super_name.as_deref().map_or(0, |s| cp.class(s)));

        put_u16(&mut body, self.interfaces.len() as u16);
        for i in &self.interfaces {
            put_u16(&mut body, cp.class(i));
        }

        put_u16(&mut body, self.fields.len() as u16);
        for f in &self.fields {
            write_member(&mut body, &mut cp, f);
        }
        put_u16(&mut body, self.methods.len() as u16);
        for m in &self.methods {
            write_member(&mut body, &mut cp, m);
        }

        let mut attrs = Vec::new();
        if let Some(source) = &self.source_file {
            let v = cp.utf8(source);
            attrs.push(attribute(&mut cp, "SourceFile", &v.to_be_bytes()));
        }
        if let Some(annotations) = &self.visible_annotations {
            let mut a = Vec::new();
            put_u16(&mut a, annotations.len() as u16);
            for ann in annotations {
                write_annotation(&mut a, &mut cp, ann);
            }
            attrs.push(attribute(&mut cp, "RuntimeVisibleAnnotations", &a));
        }
        if let Some(members) = &self.nest_members {
            let mut a = Vec::new();
            put_u16(&mut a, members.len() as u16);
            for m in members {
                put_u16(&mut a, cp.class(m));
            }
            attrs.push(attribute(&mut cp, "NestMembers", &a));
        }
        if !self.inner_classes.is_empty() {
            let mut a = Vec::new();
            put_u16(&mut a, self.inner_classes.len() as u16);
            for ic in &self.inner_classes {
                put_u16(&mut a, cp.class(&ic.name));
                put_u16(&mut a, ic.outer.as_deref().map_or(0, |o| cp.class(o)));
                put_u16(&mut a, ic.simple_name.as_deref().map_or(0, |n| cp.utf8(n)));
                put_u16(&mut a, ic.access);
            }
            attrs.push(attribute(&mut cp, "InnerClasses", &a));
        }
        for (name, raw) in &self.raw_attributes {
            attrs.push(attribute(&mut cp, name, raw));
        }
        write_attributes(&mut body, &attrs);

        let mut out = Vec::with_capacity(10 + cp.bytes.len() + body.len());
        out.extend_from_slice(&MAGIC.to_be_bytes());
        put_u16(&mut out, self.minor);
        put_u16(&mut out, self.major);
        put_u16(&mut out, cp.next);
        out.extend_from_slice(&cp.bytes);
        out.extend_from_slice(&body);
        out
    }
}

fn write_member(out: &mut Vec<u8>, cp: &mut Pool, member: &Member) {
    put_u16(out, member.access);
    put_u16(out, cp.utf8(&member.name));
    put_u16(out, cp.utf8(&member.descriptor));

    let mut attrs = Vec::new();
    if let Some(constant) = &member.constant {
        let index = match constant {
            Constant::Int(v) => cp.int(*v),
            Constant::Long(v) => cp.intern(Entry::Long(*v)),
            Constant::String(s) => {
                let u = cp.utf8(s);
                cp.intern(Entry::String(u))
            }
        };
        attrs.push(attribute(cp, "ConstantValue", &index.to_be_bytes()));
    }
    if !member.exceptions.is_empty() {
        let mut a = Vec::new();
        put_u16(&mut a, member.exceptions.len() as u16);
        for e in &member.exceptions {
            put_u16(&mut a, cp.class(e));
        }
        attrs.push(attribute(cp, "Exceptions", &a));
    }
    if let Some(code) = &member.code {
        let mut a = Vec::new();
        put_u16(&mut a, 8); // max_stack
        put_u16(&mut a, 8); // max_locals
        a.extend_from_slice(&(code.len() as u32).to_be_bytes());
        a.extend_from_slice(code);
        put_u16(&mut a, 0); // exception table
        put_u16(&mut a, 0); // attributes
        attrs.push(attribute(cp, "Code", &a));
    }
    write_attributes(out, &attrs);
}

fn write_annotation(out: &mut Vec<u8>, cp: &mut Pool, ann: &AnnotationSpec) {
    put_u16(out, cp.utf8(&ann.descriptor));
    put_u16(out, ann.elements.len() as u16);
    for (name, value) in &ann.elements {
        put_u16(out, cp.utf8(name));
        write_element(out, cp, value);
    }
}

fn write_element(out: &mut Vec<u8>, cp: &mut Pool, value: &ElementSpec) {
    match value {
        ElementSpec::String(s) => {
            out.push(b's');
            put_u16(out, cp.utf8(s));
        }
        ElementSpec::Int(v) => {
            out.push(b'I');
            put_u16(out, cp.int(*v));
        }
        ElementSpec::Boolean(b) => {
            out.push(b'Z');
            put_u16(out, cp.int(i32::from(*b)));
        }
        ElementSpec::Array(values) => {
            out.push(b'[');
            put_u16(out, values.len() as u16);
            for v in values {
                write_element(out, cp, v);
            }
        }
        ElementSpec::Enum(descriptor, constant) => {
            out.push(b'e');
            put_u16(out, cp.utf8(descriptor));
            put_u16(out, cp.utf8(constant));
        }
        ElementSpec::Class(descriptor) => {
            out.push(b'c');
            put_u16(out, cp.utf8(descriptor));
        }
    }
}

/// One encoded attribute: name index, length and body.
fn attribute(cp: &mut Pool, name: &str, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(6 + body.len());
    put_u16(&mut out, cp.utf8(name));
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
    out
}

fn write_attributes(out: &mut Vec<u8>, attrs: &[Vec<u8>]) {
    put_u16(out, attrs.len() as u16);
    for a in attrs {
        out.extend_from_slice(a);
    }
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

/// Zip `entries` (name, bytes) into an in-memory JAR, in the given order.
///
/// Names ending in `/` become directory entries.
pub fn jar_bytes(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, bytes) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).expect("add directory");
        } else {
            zip.start_file(*name, options).expect("start entry");
            zip.write_all(bytes).expect("write entry");
        }
    }
    zip.finish().expect("finish jar").into_inner()
}

/// Write a JAR to `path`, creating parent directories.
pub fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create jar directory");
    }
    std::fs::write(path, jar_bytes(entries)).expect("write jar");
}

/// A JAR holding one compiled class per name, each built by `build`.
pub fn class_jar(classes: &[ClassBuilder]) -> Vec<u8> {
    let entries: Vec<(String, Vec<u8>)> = classes
        .iter()
        .map(|c| (format!("{}.class", c.name), c.build()))
        .collect();
    let borrowed: Vec<(&str, Vec<u8>)> = entries.iter().map(|(n, b)| (n.as_str(), b.clone())).collect();
    jar_bytes(&borrowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_constants_take_two_pool_slots() {
        let mut cp = Pool::new();
        let long = cp.intern(Entry::Long(1));
        let next = cp.utf8("x");
        assert_eq!(long, 1);
        assert_eq!(next, 3);
    }

    #[test]
    fn pool_interns_duplicates() {
        let mut cp = Pool::new();
        assert_eq!(cp.class("a/B"), cp.class("a/B"));
        assert_eq!(cp.next, 3);
    }

    #[test]
    fn jar_round_trips_entry_names() {
        let bytes = jar_bytes(&[("META-INF/", vec![]), ("a/B.class", vec![1, 2])]);
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        assert_eq!(names.len(), 2);
    }
}
