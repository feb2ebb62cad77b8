use indexmap::IndexMap;
use serde::Serialize;

use crate::classfile::scan::InstructionShape;
use crate::classfile::version::ClassVersion;

/// Annotations keyed by type descriptor, in attribute order.
pub type AnnotationMap = IndexMap<String, AnnotationSnapshot>;

/// Type annotations keyed by annotation type descriptor.
pub type TypeAnnotationMap = IndexMap<String, TypeAnnotationSnapshot>;

/// Every class of one archive, keyed by internal class name in entry order.
///
/// Equality ignores `source` and `warnings`: two archives are equal when
/// their classes are.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSnapshot {
    /// Where the archive was read from (informational only).
    pub source: String,

    pub classes: IndexMap<String, ClassSnapshot>,

    /// Operator-visible notes raised while reading entries (lambda-form
    /// classes, duplicate entries).
    pub warnings: Vec<String>,
}

impl PartialEq for ArchiveSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.classes == other.classes
    }
}

/// Structural surface of one compiled class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSnapshot {
    pub access: u32,
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub signature: Option<String>,
    pub source_file: Option<String>,
    pub source_debug: Option<String>,
    pub version: ClassVersion,

    /// Keyed by field name; fields cannot be overloaded.
    pub fields: IndexMap<String, FieldSnapshot>,

    /// Keyed by `name + descriptor`; overloads share a name.
    pub methods: IndexMap<String, MethodSnapshot>,

    pub inner_classes: IndexMap<String, InnerClassSnapshot>,
    pub module: Option<ModuleSnapshot>,
    pub nest_host: Option<String>,
    pub nest_members: Option<Vec<String>>,
    pub outer_class: Option<String>,
    pub outer_method: Option<String>,
    pub outer_method_desc: Option<String>,
    pub permitted_subclasses: Option<Vec<String>>,

    /// Keyed by `name + descriptor`.
    pub record_components: Option<IndexMap<String, RecordComponentSnapshot>>,

    pub visible_annotations: Option<AnnotationMap>,
    pub invisible_annotations: Option<AnnotationMap>,
    pub visible_type_annotations: Option<TypeAnnotationMap>,
    pub invisible_type_annotations: Option<TypeAnnotationMap>,
    pub attrs: Option<Vec<AttributeSnapshot>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSnapshot {
    pub access: u32,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub value: Option<FieldValue>,
    pub visible_annotations: Option<AnnotationMap>,
    pub invisible_annotations: Option<AnnotationMap>,
    pub visible_type_annotations: Option<TypeAnnotationMap>,
    pub invisible_type_annotations: Option<TypeAnnotationMap>,
    pub attrs: Option<Vec<AttributeSnapshot>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodSnapshot {
    pub access: u32,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
    pub annotation_default: Option<AnnotationValue>,
    pub attrs: Option<Vec<AttributeSnapshot>>,

    /// Instruction shapes in code order; empty when code was skipped.
    pub instructions: Vec<InstructionShape>,

    pub visible_annotable_parameter_count: u8,
    pub invisible_annotable_parameter_count: u8,
    pub visible_annotations: Option<AnnotationMap>,
    pub invisible_annotations: Option<AnnotationMap>,

    /// One list per parameter position.
    pub visible_parameter_annotations: Option<Vec<Vec<AnnotationSnapshot>>>,
    pub invisible_parameter_annotations: Option<Vec<Vec<AnnotationSnapshot>>>,

    pub visible_type_annotations: Option<TypeAnnotationMap>,
    pub invisible_type_annotations: Option<TypeAnnotationMap>,

    /// Keyed by variable name.
    pub local_variables: Option<IndexMap<String, LocalVariableSnapshot>>,
    pub visible_local_variable_annotations: Option<IndexMap<String, LocalVariableAnnotationSnapshot>>,
    pub invisible_local_variable_annotations: Option<IndexMap<String, LocalVariableAnnotationSnapshot>>,
}

/// A field's `ConstantValue`.
///
/// Floating-point values compare by bit pattern, so a `NaN` constant is
/// equal to itself.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        use FieldValue::*;
        match (self, other) {
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationSnapshot {
    pub descriptor: String,
    pub values: Vec<AnnotationElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationElement {
    pub name: String,
    pub value: AnnotationValue,
}

/// An annotation element value. Recursive through `Annotation` and `Array`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnnotationValue {
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    Enum { descriptor: String, constant: String },
    Class(String),
    Annotation(Box<AnnotationSnapshot>),
    Array(Vec<AnnotationValue>),
}

impl PartialEq for AnnotationValue {
    fn eq(&self, other: &Self) -> bool {
        use AnnotationValue::*;
        match (self, other) {
            (Byte(a), Byte(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (Boolean(a), Boolean(b)) => a == b,
            (String(a), String(b)) => a == b,
            (
                Enum {
                    descriptor: d1,
                    constant: c1,
                },
                Enum {
                    descriptor: d2,
                    constant: c2,
                },
            ) => d1 == d2 && c1 == c2,
            (Class(a), Class(b)) => a == b,
            (Annotation(a), Annotation(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeAnnotationSnapshot {
    /// `target_type << 24` plus target-specific bits.
    pub type_ref: u32,
    /// Rendered type path (`[`, `.`, `*`, `N;` steps), absent for an empty path.
    pub type_path: Option<String>,
    #[serde(flatten)]
    pub annotation: AnnotationSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InnerClassSnapshot {
    pub name: String,
    pub outer_name: Option<String>,
    pub inner_name: Option<String>,
    pub access: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleSnapshot {
    pub name: String,
    pub access: u16,
    pub version: Option<String>,
    pub main_class: Option<String>,
    pub packages: Option<Vec<String>>,
    pub requires: Vec<ModuleRequireSnapshot>,
    pub exports: Vec<ModuleExportSnapshot>,
    pub opens: Vec<ModuleOpenSnapshot>,
    pub uses: Vec<String>,
    pub provides: Vec<ModuleProvideSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleRequireSnapshot {
    pub module: String,
    pub access: u16,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleExportSnapshot {
    pub package: String,
    pub access: u16,
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleOpenSnapshot {
    pub package: String,
    pub access: u16,
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleProvideSnapshot {
    pub service: String,
    pub providers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordComponentSnapshot {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub visible_annotations: Option<AnnotationMap>,
    pub invisible_annotations: Option<AnnotationMap>,
    pub visible_type_annotations: Option<TypeAnnotationMap>,
    pub invisible_type_annotations: Option<TypeAnnotationMap>,
    pub attrs: Option<Vec<AttributeSnapshot>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalVariableSnapshot {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub index: u16,
    pub start: LabelReference,
    pub end: LabelReference,
}

/// A code position, rendered as `L<bytecode offset>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LabelReference(pub String);

impl LabelReference {
    pub fn at(offset: u32) -> Self {
        Self(format!("L{offset}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalVariableAnnotationSnapshot {
    #[serde(flatten)]
    pub type_annotation: TypeAnnotationSnapshot,
    pub start: Vec<LabelReference>,
    pub end: Vec<LabelReference>,
    pub index: Vec<u16>,
}

/// An attribute the reader does not decode; only its name is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttributeSnapshot {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_constants_equal_themselves() {
        assert_eq!(FieldValue::Float(f32::NAN), FieldValue::Float(f32::NAN));
        assert_eq!(FieldValue::Double(f64::NAN), FieldValue::Double(f64::NAN));
        assert_ne!(FieldValue::Double(0.0), FieldValue::Double(-0.0));
        assert_ne!(FieldValue::Int(1), FieldValue::Long(1));
    }

    #[test]
    fn annotation_values_compare_deeply() {
        let nested = |v: i32| {
            AnnotationValue::Array(vec![AnnotationValue::Annotation(Box::new(
                AnnotationSnapshot {
                    descriptor: "Lx/A;".into(),
                    values: vec![AnnotationElement {
                        name: "v".into(),
                        value: AnnotationValue::Int(v),
                    }],
                },
            ))])
        };

        assert_eq!(nested(1), nested(1));
        assert_ne!(nested(1), nested(2));
    }

    #[test]
    fn archive_equality_ignores_source() {
        let a = ArchiveSnapshot {
            source: "left.jar".into(),
            classes: IndexMap::new(),
            warnings: vec![],
        };
        let b = ArchiveSnapshot {
            source: "right.jar".into(),
            classes: IndexMap::new(),
            warnings: vec!["duplicate".into()],
        };

        assert_eq!(a, b);
    }

    #[test]
    fn serializes_values_with_type_tags() {
        let v = serde_json::to_value(AnnotationValue::Enum {
            descriptor: "Lx/K;".into(),
            constant: "A".into(),
        })
        .unwrap();
        assert_eq!(
            v,
            serde_json::json!({"type": "enum", "value": {"descriptor": "Lx/K;", "constant": "A"}})
        );
        assert_eq!(serde_json::to_value(LabelReference::at(7)).unwrap(), "L7");
    }
}
