//! Decoded class tree.
//!
//! These types are the output of [`parse_class`](crate::classfile::parse::parse_class):
//! constant-pool references are resolved to strings and attributes are
//! decoded into structure, but nothing is reorganised for comparison.
//! Optional attributes that were not present in the binary are `None`;
//! a present-but-empty attribute is `Some` of an empty collection.

use crate::classfile::scan::InstructionShape;

/// `ACC_SYNTHETIC`, also set when a legacy `Synthetic` attribute is present.
pub const ACC_SYNTHETIC: u32 = 0x1000;
/// Pseudo flag set when a `Record` attribute is present.
pub const ACC_RECORD: u32 = 0x10000;
/// Pseudo flag set when a `Deprecated` attribute is present.
pub const ACC_DEPRECATED: u32 = 0x20000;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassNode {
    /// Combined version word, minor in the high 16 bits.
    pub version: u32,
    pub access: u32,
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub signature: Option<String>,
    pub source_file: Option<String>,
    pub source_debug: Option<String>,
    pub module: Option<ModuleNode>,
    pub outer_class: Option<String>,
    pub outer_method: Option<String>,
    pub outer_method_desc: Option<String>,
    pub nest_host: Option<String>,
    pub nest_members: Option<Vec<String>>,
    pub permitted_subclasses: Option<Vec<String>>,
    pub inner_classes: Vec<InnerClassNode>,
    pub record_components: Option<Vec<RecordComponentNode>>,
    pub annotations: Annotations,
    pub fields: Vec<FieldNode>,
    pub methods: Vec<MethodNode>,
    /// Names of attributes the reader does not decode, in file order.
    pub attrs: Option<Vec<String>>,
}

/// The four runtime annotation attributes any annotatable element carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    pub visible: Option<Vec<AnnotationNode>>,
    pub invisible: Option<Vec<AnnotationNode>>,
    pub visible_type: Option<Vec<TypeAnnotationNode>>,
    pub invisible_type: Option<Vec<TypeAnnotationNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    pub access: u32,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub value: Option<ConstantValue>,
    pub annotations: Annotations,
    pub attrs: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodNode {
    pub access: u32,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
    pub annotation_default: Option<ElementValue>,
    pub annotations: Annotations,
    pub visible_annotable_parameter_count: u8,
    pub visible_parameter_annotations: Option<Vec<Vec<AnnotationNode>>>,
    pub invisible_annotable_parameter_count: u8,
    pub invisible_parameter_annotations: Option<Vec<Vec<AnnotationNode>>>,
    /// Empty unless code bodies are decoded.
    pub instructions: Vec<InstructionShape>,
    pub local_variables: Option<Vec<LocalVariableNode>>,
    pub visible_local_variable_annotations: Option<Vec<LocalVariableAnnotationNode>>,
    pub invisible_local_variable_annotations: Option<Vec<LocalVariableAnnotationNode>>,
    pub attrs: Option<Vec<String>>,
}

/// A `ConstantValue` attribute payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationNode {
    pub descriptor: String,
    pub values: Vec<(String, ElementValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotationNode {
    /// Target encoded as `target_type << 24 | target-specific bits`.
    pub type_ref: u32,
    pub type_path: Option<String>,
    pub annotation: AnnotationNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Byte(i8),
    Char(u16),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
    String(String),
    Enum { descriptor: String, constant: String },
    Class(String),
    Annotation(Box<AnnotationNode>),
    Array(Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InnerClassNode {
    pub name: String,
    pub outer_name: Option<String>,
    pub inner_name: Option<String>,
    pub access: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordComponentNode {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub annotations: Annotations,
    pub attrs: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleNode {
    pub name: String,
    pub access: u16,
    pub version: Option<String>,
    pub main_class: Option<String>,
    pub packages: Option<Vec<String>>,
    pub requires: Vec<ModuleRequireNode>,
    pub exports: Vec<ModuleExportNode>,
    pub opens: Vec<ModuleExportNode>,
    pub uses: Vec<String>,
    pub provides: Vec<ModuleProvideNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRequireNode {
    pub module: String,
    pub access: u16,
    pub version: Option<String>,
}

/// Shared layout of `exports` and `opens` directives.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleExportNode {
    pub package: String,
    pub access: u16,
    /// Target modules; empty for an unqualified directive.
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleProvideNode {
    pub service: String,
    pub providers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariableNode {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub index: u16,
    /// Start of scope, as a bytecode offset.
    pub start: u32,
    /// End of scope (exclusive), as a bytecode offset.
    pub end: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariableAnnotationNode {
    pub type_annotation: TypeAnnotationNode,
    pub start: Vec<u32>,
    pub end: Vec<u32>,
    pub index: Vec<u16>,
}
