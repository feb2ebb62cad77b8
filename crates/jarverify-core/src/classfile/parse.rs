use crate::classfile::ClassFormatError;
use crate::classfile::constpool::{Constant, ConstantPool, decode_modified_utf8};
use crate::classfile::node::*;
use crate::classfile::reader::ByteReader;
use crate::classfile::scan;

const MAGIC: u32 = 0xCAFE_BABE;

/// Decode-time configuration.
///
/// Stack-map frames are always skipped; they carry no structural facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Skip `Code` attributes entirely: no instruction shapes, no local
    /// variables.
    pub skip_code: bool,
    /// Skip `SourceFile`, `SourceDebugExtension` and the local-variable
    /// tables.
    pub skip_debug: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            skip_code: true,
            skip_debug: true,
        }
    }
}

/// Decode one class file into a [`ClassNode`].
///
/// A single pass over `bytes`: header, constant pool, members, then
/// attributes. Attributes the reader does not model are recorded by name
/// only. Any structural inconsistency is a [`ClassFormatError`]; this
/// function never panics on malformed input.
pub fn parse_class(bytes: &[u8], options: &DecodeOptions) -> Result<ClassNode, ClassFormatError> {
    let mut r = ByteReader::new(bytes);

    let magic = r.u32()?;
    if magic != MAGIC {
        return Err(ClassFormatError::BadMagic(magic));
    }
    let minor = r.u16()? as u32;
    let major = r.u16()? as u32;

    let cp = ConstantPool::read(&mut r)?;
    let ctx = Ctx { cp: &cp, options };

    let mut access = r.u16()? as u32;
    let name = cp.class_name(r.u16()?)?.to_owned();
    let super_name = cp.optional_class_name(r.u16()?)?.map(str::to_owned);

    let interface_count = r.u16()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(cp.class_name(r.u16()?)?.to_owned());
    }

    let field_count = r.u16()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(ctx.read_field(&mut r)?);
    }

    let method_count = r.u16()?;
    let mut methods = Vec::with_capacity(method_count as usize);
    for _ in 0..method_count {
        methods.push(ctx.read_method(&mut r)?);
    }

    let mut class = ClassNode {
        version: (minor << 16) | major,
        access: 0,
        name,
        super_name,
        interfaces,
        signature: None,
        source_file: None,
        source_debug: None,
        module: None,
        outer_class: None,
        outer_method: None,
        outer_method_desc: None,
        nest_host: None,
        nest_members: None,
        permitted_subclasses: None,
        inner_classes: Vec::new(),
        record_components: None,
        annotations: Annotations::default(),
        fields,
        methods,
        attrs: None,
    };

    // ModulePackages/ModuleMainClass may precede the Module attribute.
    let mut module_packages = None;
    let mut module_main_class = None;

    let attribute_count = r.u16()?;
    for _ in 0..attribute_count {
        let (attr_name, mut a) = ctx.read_attribute_header(&mut r)?;
        match attr_name {
            "SourceFile" => {
                if !options.skip_debug {
                    class.source_file = Some(cp.utf8(a.u16()?)?.to_owned());
                }
            }
            "SourceDebugExtension" => {
                if !options.skip_debug {
                    let raw = a.bytes(a.remaining())?;
                    class.source_debug = Some(
                        decode_modified_utf8(raw)
                            .unwrap_or_else(|| String::from_utf8_lossy(raw).into_owned()),
                    );
                }
            }
            "Signature" => class.signature = Some(cp.utf8(a.u16()?)?.to_owned()),
            "InnerClasses" => {
                let count = a.u16()?;
                for _ in 0..count {
                    class.inner_classes.push(InnerClassNode {
                        name: cp.class_name(a.u16()?)?.to_owned(),
                        outer_name: cp.optional_class_name(a.u16()?)?.map(str::to_owned),
                        inner_name: cp.optional_utf8(a.u16()?)?.map(str::to_owned),
                        access: a.u16()?,
                    });
                }
            }
            "EnclosingMethod" => {
                class.outer_class = Some(cp.class_name(a.u16()?)?.to_owned());
                let method = a.u16()?;
                if method != 0 {
                    let (m_name, m_desc) = cp.name_and_type(method)?;
                    class.outer_method = Some(m_name.to_owned());
                    class.outer_method_desc = Some(m_desc.to_owned());
                }
            }
            "NestHost" => class.nest_host = Some(cp.class_name(a.u16()?)?.to_owned()),
            "NestMembers" => class.nest_members = Some(ctx.read_class_list(&mut a)?),
            "PermittedSubclasses" => {
                class.permitted_subclasses = Some(ctx.read_class_list(&mut a)?)
            }
            "Record" => {
                access |= ACC_RECORD;
                let count = a.u16()?;
                let mut components = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    components.push(ctx.read_record_component(&mut a)?);
                }
                class.record_components = Some(components);
            }
            "Module" => class.module = Some(ctx.read_module(&mut a)?),
            "ModulePackages" => {
                let count = a.u16()?;
                let mut packages = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    packages.push(cp.package_name(a.u16()?)?.to_owned());
                }
                module_packages = Some(packages);
            }
            "ModuleMainClass" => module_main_class = Some(cp.class_name(a.u16()?)?.to_owned()),
            "Deprecated" => access |= ACC_DEPRECATED,
            "Synthetic" => access |= ACC_SYNTHETIC,
            "BootstrapMethods" => {}
            other => {
                if !ctx.read_annotation_attribute(other, &mut a, &mut class.annotations)? {
                    push_attr(&mut class.attrs, other);
                }
            }
        }
    }

    if let Some(module) = class.module.as_mut() {
        module.packages = module_packages;
        module.main_class = module_main_class;
    }
    class.access = access;

    Ok(class)
}

fn push_attr(attrs: &mut Option<Vec<String>>, name: &str) {
    attrs.get_or_insert_with(Vec::new).push(name.to_owned());
}

/// Per-class decoding context.
struct Ctx<'a> {
    cp: &'a ConstantPool,
    options: &'a DecodeOptions,
}

impl<'a> Ctx<'a> {
    /// Reads `attribute_name_index` and `attribute_length`, returning the
    /// resolved name and a reader bounded to the attribute body.
    fn read_attribute_header<'b>(
        &self,
        r: &mut ByteReader<'b>,
    ) -> Result<(&'a str, ByteReader<'b>), ClassFormatError> {
        let name = self.cp.utf8(r.u16()?)?;
        let len = r.u32()? as usize;
        Ok((name, r.sub(len)?))
    }

    fn read_class_list(&self, r: &mut ByteReader<'_>) -> Result<Vec<String>, ClassFormatError> {
        let count = r.u16()?;
        let mut names = Vec::with_capacity(count as usize);
        for _ in 0..count {
            names.push(self.cp.class_name(r.u16()?)?.to_owned());
        }
        Ok(names)
    }

    fn read_field(&self, r: &mut ByteReader<'_>) -> Result<FieldNode, ClassFormatError> {
        let mut field = FieldNode {
            access: r.u16()? as u32,
            name: self.cp.utf8(r.u16()?)?.to_owned(),
            descriptor: self.cp.utf8(r.u16()?)?.to_owned(),
            signature: None,
            value: None,
            annotations: Annotations::default(),
            attrs: None,
        };

        let count = r.u16()?;
        for _ in 0..count {
            let (attr_name, mut a) = self.read_attribute_header(r)?;
            match attr_name {
                "ConstantValue" => field.value = Some(self.constant_value(a.u16()?)?),
                "Signature" => field.signature = Some(self.cp.utf8(a.u16()?)?.to_owned()),
                "Deprecated" => field.access |= ACC_DEPRECATED,
                "Synthetic" => field.access |= ACC_SYNTHETIC,
                other => {
                    if !self.read_annotation_attribute(other, &mut a, &mut field.annotations)? {
                        push_attr(&mut field.attrs, other);
                    }
                }
            }
        }

        Ok(field)
    }

    fn read_method(&self, r: &mut ByteReader<'_>) -> Result<MethodNode, ClassFormatError> {
        let mut method = MethodNode {
            access: r.u16()? as u32,
            name: self.cp.utf8(r.u16()?)?.to_owned(),
            descriptor: self.cp.utf8(r.u16()?)?.to_owned(),
            signature: None,
            exceptions: Vec::new(),
            annotation_default: None,
            annotations: Annotations::default(),
            visible_annotable_parameter_count: 0,
            visible_parameter_annotations: None,
            invisible_annotable_parameter_count: 0,
            invisible_parameter_annotations: None,
            instructions: Vec::new(),
            local_variables: None,
            visible_local_variable_annotations: None,
            invisible_local_variable_annotations: None,
            attrs: None,
        };

        let count = r.u16()?;
        for _ in 0..count {
            let (attr_name, mut a) = self.read_attribute_header(r)?;
            match attr_name {
                "Code" => {
                    if !self.options.skip_code {
                        self.read_code(&mut a, &mut method)?;
                    }
                }
                "Exceptions" => method.exceptions = self.read_class_list(&mut a)?,
                "Signature" => method.signature = Some(self.cp.utf8(a.u16()?)?.to_owned()),
                "AnnotationDefault" => method.annotation_default = Some(self.read_element_value(&mut a)?),
                "RuntimeVisibleParameterAnnotations" => {
                    let (count, params) = self.read_parameter_annotations(&mut a)?;
                    method.visible_annotable_parameter_count = count;
                    method.visible_parameter_annotations = Some(params);
                }
                "RuntimeInvisibleParameterAnnotations" => {
                    let (count, params) = self.read_parameter_annotations(&mut a)?;
                    method.invisible_annotable_parameter_count = count;
                    method.invisible_parameter_annotations = Some(params);
                }
                "MethodParameters" => {}
                "Deprecated" => method.access |= ACC_DEPRECATED,
                "Synthetic" => method.access |= ACC_SYNTHETIC,
                other => {
                    if !self.read_annotation_attribute(other, &mut a, &mut method.annotations)? {
                        push_attr(&mut method.attrs, other);
                    }
                }
            }
        }

        Ok(method)
    }

    fn read_code(&self, r: &mut ByteReader<'_>, method: &mut MethodNode) -> Result<(), ClassFormatError> {
        r.skip(4)?; // max_stack, max_locals
        let code_len = r.u32()? as usize;
        method.instructions = scan::scan_instructions(r.bytes(code_len)?)?;
        let handlers = r.u16()? as usize;
        r.skip(handlers * 8)?;

        // (start, index) -> signature, from LocalVariableTypeTable
        let mut type_table: Vec<(u16, u16, String)> = Vec::new();

        let count = r.u16()?;
        for _ in 0..count {
            let (attr_name, mut a) = self.read_attribute_header(r)?;
            match attr_name {
                "LocalVariableTable" if !self.options.skip_debug => {
                    let n = a.u16()?;
                    let mut locals = Vec::with_capacity(n as usize);
                    for _ in 0..n {
                        let start = a.u16()?;
                        let length = a.u16()?;
                        locals.push(LocalVariableNode {
                            name: self.cp.utf8(a.u16()?)?.to_owned(),
                            descriptor: self.cp.utf8(a.u16()?)?.to_owned(),
                            signature: None,
                            index: a.u16()?,
                            start: start as u32,
                            end: start as u32 + length as u32,
                        });
                    }
                    method.local_variables = Some(locals);
                }
                "LocalVariableTypeTable" if !self.options.skip_debug => {
                    let n = a.u16()?;
                    for _ in 0..n {
                        let start = a.u16()?;
                        a.skip(2)?; // length
                        a.skip(2)?; // name
                        let signature = self.cp.utf8(a.u16()?)?.to_owned();
                        let index = a.u16()?;
                        type_table.push((start, index, signature));
                    }
                }
                "RuntimeVisibleTypeAnnotations" => {
                    method.visible_local_variable_annotations = self.read_code_type_annotations(&mut a)?;
                }
                "RuntimeInvisibleTypeAnnotations" => {
                    method.invisible_local_variable_annotations =
                        self.read_code_type_annotations(&mut a)?;
                }
                "LocalVariableTable" | "LocalVariableTypeTable" | "LineNumberTable"
                | "StackMapTable" => {}
                other => push_attr(&mut method.attrs, other),
            }
        }

        if let Some(locals) = method.local_variables.as_mut() {
            for local in locals.iter_mut() {
                if let Some((_, _, sig)) = type_table
                    .iter()
                    .find(|(start, index, _)| *start as u32 == local.start && *index == local.index)
                {
                    local.signature = Some(sig.clone());
                }
            }
        }

        Ok(())
    }

    /// Keeps only local-variable targets; instruction-level targets carry
    /// nothing structural once operands are dropped. Returns `None` when no
    /// local-variable annotation is present.
    fn read_code_type_annotations(
        &self,
        r: &mut ByteReader<'_>,
    ) -> Result<Option<Vec<LocalVariableAnnotationNode>>, ClassFormatError> {
        let count = r.u16()?;
        let mut out = Vec::new();
        for _ in 0..count {
            let (annotation, ranges) = self.read_type_annotation(r)?;
            if let Some(ranges) = ranges {
                out.push(LocalVariableAnnotationNode {
                    type_annotation: annotation,
                    start: ranges.iter().map(|(start, _, _)| *start as u32).collect(),
                    end: ranges
                        .iter()
                        .map(|(start, length, _)| *start as u32 + *length as u32)
                        .collect(),
                    index: ranges.iter().map(|(_, _, index)| *index).collect(),
                });
            }
        }
        Ok((!out.is_empty()).then_some(out))
    }

    fn read_record_component(&self, r: &mut ByteReader<'_>) -> Result<RecordComponentNode, ClassFormatError> {
        let mut component = RecordComponentNode {
            name: self.cp.utf8(r.u16()?)?.to_owned(),
            descriptor: self.cp.utf8(r.u16()?)?.to_owned(),
            signature: None,
            annotations: Annotations::default(),
            attrs: None,
        };

        let count = r.u16()?;
        for _ in 0..count {
            let (attr_name, mut a) = self.read_attribute_header(r)?;
            match attr_name {
                "Signature" => component.signature = Some(self.cp.utf8(a.u16()?)?.to_owned()),
                other => {
                    if !self.read_annotation_attribute(other, &mut a, &mut component.annotations)? {
                        push_attr(&mut component.attrs, other);
                    }
                }
            }
        }

        Ok(component)
    }

    fn read_module(&self, r: &mut ByteReader<'_>) -> Result<ModuleNode, ClassFormatError> {
        let cp = self.cp;
        let name = cp.module_name(r.u16()?)?.to_owned();
        let access = r.u16()?;
        let version = cp.optional_utf8(r.u16()?)?.map(str::to_owned);

        let n = r.u16()?;
        let mut requires = Vec::with_capacity(n as usize);
        for _ in 0..n {
            requires.push(ModuleRequireNode {
                module: cp.module_name(r.u16()?)?.to_owned(),
                access: r.u16()?,
                version: cp.optional_utf8(r.u16()?)?.map(str::to_owned),
            });
        }

        let exports = self.read_module_exports(r)?;
        let opens = self.read_module_exports(r)?;
        let uses = self.read_class_list(r)?;

        let n = r.u16()?;
        let mut provides = Vec::with_capacity(n as usize);
        for _ in 0..n {
            provides.push(ModuleProvideNode {
                service: cp.class_name(r.u16()?)?.to_owned(),
                providers: self.read_class_list(r)?,
            });
        }

        Ok(ModuleNode {
            name,
            access,
            version,
            main_class: None,
            packages: None,
            requires,
            exports,
            opens,
            uses,
            provides,
        })
    }

    fn read_module_exports(&self, r: &mut ByteReader<'_>) -> Result<Vec<ModuleExportNode>, ClassFormatError> {
        let n = r.u16()?;
        let mut out = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let package = self.cp.package_name(r.u16()?)?.to_owned();
            let access = r.u16()?;
            let to = r.u16()?;
            let mut modules = Vec::with_capacity(to as usize);
            for _ in 0..to {
                modules.push(self.cp.module_name(r.u16()?)?.to_owned());
            }
            out.push(ModuleExportNode {
                package,
                access,
                modules,
            });
        }
        Ok(out)
    }

    /// Decodes the four runtime annotation attributes into `into`.
    /// Returns `false` when `name` is not one of them.
    fn read_annotation_attribute(
        &self,
        name: &str,
        r: &mut ByteReader<'_>,
        into: &mut Annotations,
    ) -> Result<bool, ClassFormatError> {
        match name {
            "RuntimeVisibleAnnotations" => into.visible = Some(self.read_annotations(r)?),
            "RuntimeInvisibleAnnotations" => into.invisible = Some(self.read_annotations(r)?),
            "RuntimeVisibleTypeAnnotations" => into.visible_type = Some(self.read_type_annotations(r)?),
            "RuntimeInvisibleTypeAnnotations" => {
                into.invisible_type = Some(self.read_type_annotations(r)?)
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn read_annotations(&self, r: &mut ByteReader<'_>) -> Result<Vec<AnnotationNode>, ClassFormatError> {
        let count = r.u16()?;
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            out.push(self.read_annotation(r)?);
        }
        Ok(out)
    }

    fn read_parameter_annotations(
        &self,
        r: &mut ByteReader<'_>,
    ) -> Result<(u8, Vec<Vec<AnnotationNode>>), ClassFormatError> {
        let params = r.u8()?;
        let mut out = Vec::with_capacity(params as usize);
        for _ in 0..params {
            out.push(self.read_annotations(r)?);
        }
        Ok((params, out))
    }

    fn read_annotation(&self, r: &mut ByteReader<'_>) -> Result<AnnotationNode, ClassFormatError> {
        let descriptor = self.cp.utf8(r.u16()?)?.to_owned();
        let pairs = r.u16()?;
        let mut values = Vec::with_capacity(pairs as usize);
        for _ in 0..pairs {
            let name = self.cp.utf8(r.u16()?)?.to_owned();
            values.push((name, self.read_element_value(r)?));
        }
        Ok(AnnotationNode { descriptor, values })
    }

    fn read_type_annotations(&self, r: &mut ByteReader<'_>) -> Result<Vec<TypeAnnotationNode>, ClassFormatError> {
        let count = r.u16()?;
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            out.push(self.read_type_annotation(r)?.0);
        }
        Ok(out)
    }

    /// Reads one `type_annotation`. Local-variable targets additionally
    /// return their `(start_pc, length, index)` table.
    #[allow(clippy::type_complexity)]
    fn read_type_annotation(
        &self,
        r: &mut ByteReader<'_>,
    ) -> Result<(TypeAnnotationNode, Option<Vec<(u16, u16, u16)>>), ClassFormatError> {
        let target = r.u8()?;
        let sort = (target as u32) << 24;
        let mut ranges = None;

        let type_ref = match target {
            0x00 | 0x01 | 0x16 => sort | (r.u8()? as u32) << 16,
            0x10 => sort | (r.u16()? as u32) << 8,
            0x11 | 0x12 => {
                let param = r.u8()? as u32;
                let bound = r.u8()? as u32;
                sort | param << 16 | bound << 8
            }
            0x13..=0x15 => sort,
            0x17 | 0x42 => sort | (r.u16()? as u32) << 8,
            0x40 | 0x41 => {
                let n = r.u16()?;
                let mut table = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    table.push((r.u16()?, r.u16()?, r.u16()?));
                }
                ranges = Some(table);
                sort
            }
            0x43..=0x46 => {
                r.skip(2)?; // bytecode offset
                sort
            }
            0x47..=0x4B => {
                r.skip(2)?; // bytecode offset
                sort | r.u8()? as u32
            }
            other => return Err(ClassFormatError::BadTargetType(other)),
        };

        let path_len = r.u8()?;
        let type_path = if path_len == 0 {
            None
        } else {
            let mut path = String::new();
            for _ in 0..path_len {
                let kind = r.u8()?;
                let arg = r.u8()?;
                match kind {
                    0 => path.push('['),
                    1 => path.push('.'),
                    2 => path.push('*'),
                    3 => {
                        path.push_str(&arg.to_string());
                        path.push(';');
                    }
                    other => {
                        return Err(ClassFormatError::BadAttribute {
                            attribute: "type_path".to_owned(),
                            reason: format!("unknown type path kind {other}"),
                        });
                    }
                }
            }
            Some(path)
        };

        let annotation = self.read_annotation(r)?;
        Ok((
            TypeAnnotationNode {
                type_ref,
                type_path,
                annotation,
            },
            ranges,
        ))
    }

    fn read_element_value(&self, r: &mut ByteReader<'_>) -> Result<ElementValue, ClassFormatError> {
        let tag = r.u8()?;
        let value = match tag {
            b'B' => ElementValue::Byte(self.int_constant(r.u16()?)? as i8),
            b'C' => ElementValue::Char(self.int_constant(r.u16()?)? as u16),
            b'S' => ElementValue::Short(self.int_constant(r.u16()?)? as i16),
            b'Z' => ElementValue::Boolean(self.int_constant(r.u16()?)? != 0),
            b'I' => ElementValue::Int(self.int_constant(r.u16()?)?),
            b'J' => match self.constant_value(r.u16()?)? {
                ConstantValue::Long(v) => ElementValue::Long(v),
                other => return Err(element_mismatch('J', &other)),
            },
            b'F' => match self.constant_value(r.u16()?)? {
                ConstantValue::Float(v) => ElementValue::Float(v),
                other => return Err(element_mismatch('F', &other)),
            },
            b'D' => match self.constant_value(r.u16()?)? {
                ConstantValue::Double(v) => ElementValue::Double(v),
                other => return Err(element_mismatch('D', &other)),
            },
            b's' => ElementValue::String(self.cp.utf8(r.u16()?)?.to_owned()),
            b'e' => ElementValue::Enum {
                descriptor: self.cp.utf8(r.u16()?)?.to_owned(),
                constant: self.cp.utf8(r.u16()?)?.to_owned(),
            },
            b'c' => ElementValue::Class(self.cp.utf8(r.u16()?)?.to_owned()),
            b'@' => ElementValue::Annotation(Box::new(self.read_annotation(r)?)),
            b'[' => {
                let n = r.u16()?;
                let mut values = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    values.push(self.read_element_value(r)?);
                }
                ElementValue::Array(values)
            }
            other => return Err(ClassFormatError::BadElementTag(other as char)),
        };
        Ok(value)
    }

    fn int_constant(&self, index: u16) -> Result<i32, ClassFormatError> {
        match self.constant_value(index)? {
            ConstantValue::Int(v) => Ok(v),
            other => Err(element_mismatch('I', &other)),
        }
    }

    /// Resolves a loadable constant used by `ConstantValue` and annotation
    /// element values.
    fn constant_value(&self, index: u16) -> Result<ConstantValue, ClassFormatError> {
        Ok(match self.cp.get(index)? {
            Constant::Integer(v) => ConstantValue::Int(*v),
            Constant::Long(v) => ConstantValue::Long(*v),
            Constant::Float(v) => ConstantValue::Float(*v),
            Constant::Double(v) => ConstantValue::Double(*v),
            Constant::String(s) => ConstantValue::String(self.cp.utf8(*s)?.to_owned()),
            _ => {
                return Err(ClassFormatError::BadConstantIndex { index });
            }
        })
    }
}

fn element_mismatch(tag: char, found: &ConstantValue) -> ClassFormatError {
    ClassFormatError::BadAttribute {
        attribute: "element_value".to_owned(),
        reason: format!("tag '{tag}' does not match constant {found:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarverify_testkit::{AnnotationSpec, ClassBuilder, ElementSpec};

    #[test]
    fn parses_minimal_class() {
        let bytes = ClassBuilder::new("com/example/Empty").build();
        let class = parse_class(&bytes, &DecodeOptions::default()).expect("valid class");

        assert_eq!(class.name, "com/example/Empty");
        assert_eq!(class.super_name.as_deref(), Some("java/lang/Object"));
        assert_eq!(class.version, 52);
        assert!(class.fields.is_empty());
        assert!(class.annotations.visible.is_none());
        assert!(class.attrs.is_none());
    }

    #[test]
    fn rejects_bad_magic() {
        let err = parse_class(b"not a class file", &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, ClassFormatError::BadMagic(_)));
    }

    #[test]
    fn truncated_class_is_an_error_not_a_panic() {
        let bytes = ClassBuilder::new("a/B").field(0x0001, "x", "I").build();
        for cut in [4, 9, 20, bytes.len() - 1] {
            assert!(parse_class(&bytes[..cut], &DecodeOptions::default()).is_err());
        }
    }

    #[test]
    fn decodes_members_in_file_order() {
        let bytes = ClassBuilder::new("a/B")
            .interface("java/io/Serializable")
            .interface("java/lang/Runnable")
            .field(0x0002, "second", "J")
            .field(0x0001, "first", "I")
            .method(0x0001, "run", "()V")
            .method(0x0001, "<init>", "()V")
            .build();
        let class = parse_class(&bytes, &DecodeOptions::default()).unwrap();

        assert_eq!(class.interfaces, vec!["java/io/Serializable", "java/lang/Runnable"]);
        let field_names: Vec<_> = class.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(field_names, vec!["second", "first"]);
        let method_names: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(method_names, vec!["run", "<init>"]);
    }

    #[test]
    fn decodes_constant_values_and_exceptions() {
        let bytes = ClassBuilder::new("a/B")
            .int_constant_field("MAX", 42)
            .string_constant_field("NAME", "jar")
            .method_with_exceptions(0x0001, "load", "()V", &["java/io/IOException"])
            .build();
        let class = parse_class(&bytes, &DecodeOptions::default()).unwrap();

        assert_eq!(class.fields[0].value, Some(ConstantValue::Int(42)));
        assert_eq!(class.fields[1].value, Some(ConstantValue::String("jar".into())));
        assert_eq!(class.methods[0].exceptions, vec!["java/io/IOException"]);
    }

    #[test]
    fn distinguishes_empty_from_absent_annotation_attribute() {
        let with_empty = ClassBuilder::new("a/B").visible_annotations(vec![]).build();
        let without = ClassBuilder::new("a/B").build();

        let a = parse_class(&with_empty, &DecodeOptions::default()).unwrap();
        let b = parse_class(&without, &DecodeOptions::default()).unwrap();

        assert_eq!(a.annotations.visible, Some(vec![]));
        assert_eq!(b.annotations.visible, None);
    }

    #[test]
    fn decodes_nested_annotation_values() {
        let bytes = ClassBuilder::new("a/B")
            .visible_annotations(vec![AnnotationSpec::new("Lx/Ann;")
                .element("name", ElementSpec::String("v".into()))
                .element("count", ElementSpec::Int(3))
                .element(
                    "tags",
                    ElementSpec::Array(vec![ElementSpec::String("t1".into()), ElementSpec::Boolean(true)]),
                )
                .element("kind", ElementSpec::Enum("Lx/Kind;".into(), "FAST".into()))
                .element("type", ElementSpec::Class("Ljava/lang/String;".into()))])
            .build();
        let class = parse_class(&bytes, &DecodeOptions::default()).unwrap();

        let ann = &class.annotations.visible.as_ref().unwrap()[0];
        assert_eq!(ann.descriptor, "Lx/Ann;");
        assert_eq!(ann.values[0], ("name".into(), ElementValue::String("v".into())));
        assert_eq!(ann.values[1], ("count".into(), ElementValue::Int(3)));
        assert_eq!(
            ann.values[2].1,
            ElementValue::Array(vec![ElementValue::String("t1".into()), ElementValue::Boolean(true)])
        );
        assert_eq!(
            ann.values[3].1,
            ElementValue::Enum {
                descriptor: "Lx/Kind;".into(),
                constant: "FAST".into()
            }
        );
        assert_eq!(ann.values[4].1, ElementValue::Class("Ljava/lang/String;".into()));
    }

    #[test]
    fn unknown_attributes_are_recorded_by_name() {
        let bytes = ClassBuilder::new("a/B")
            .raw_attribute("ScalaSig", &[1, 2, 3])
            .raw_attribute("Deprecated", &[])
            .build();
        let class = parse_class(&bytes, &DecodeOptions::default()).unwrap();

        assert_eq!(class.attrs, Some(vec!["ScalaSig".to_owned()]));
        assert_eq!(class.access & ACC_DEPRECATED, ACC_DEPRECATED);
    }

    #[test]
    fn source_file_respects_skip_debug() {
        let bytes = ClassBuilder::new("a/B").source_file("B.java").build();

        let skipped = parse_class(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(skipped.source_file, None);

        let kept = parse_class(
            &bytes,
            &DecodeOptions {
                skip_code: true,
                skip_debug: false,
            },
        )
        .unwrap();
        assert_eq!(kept.source_file.as_deref(), Some("B.java"));
    }

    #[test]
    fn code_is_scanned_only_when_requested() {
        // aload_0; invokespecial #0 operand bytes; return
        let bytes = ClassBuilder::new("a/B")
            .method_with_code(0x0001, "<init>", "()V", &[0x2A, 0xB7, 0x00, 0x01, 0xB1])
            .build();

        let skipped = parse_class(&bytes, &DecodeOptions::default()).unwrap();
        assert!(skipped.methods[0].instructions.is_empty());

        let scanned = parse_class(
            &bytes,
            &DecodeOptions {
                skip_code: false,
                skip_debug: true,
            },
        )
        .unwrap();
        let opcodes: Vec<u8> = scanned.methods[0].instructions.iter().map(|i| i.opcode).collect();
        assert_eq!(opcodes, vec![0x19, 0xB7, 0xB1]);
    }

    #[test]
    fn decodes_nest_and_inner_class_attributes() {
        let bytes = ClassBuilder::new("a/Outer")
            .nest_members(&["a/Outer$Inner"])
            .inner_class("a/Outer$Inner", Some("a/Outer"), Some("Inner"), 0x0008)
            .build();
        let class = parse_class(&bytes, &DecodeOptions::default()).unwrap();

        assert_eq!(class.nest_members, Some(vec!["a/Outer$Inner".to_owned()]));
        assert_eq!(class.nest_host, None);
        assert_eq!(
            class.inner_classes,
            vec![InnerClassNode {
                name: "a/Outer$Inner".into(),
                outer_name: Some("a/Outer".into()),
                inner_name: Some("Inner".into()),
                access: 0x0008,
            }]
        );
    }
}
