use crate::classfile::ClassFormatError;
use crate::classfile::reader::ByteReader;

/// One decoded constant-pool slot.
///
/// References between entries are kept as raw indices and resolved lazily
/// through [`ConstantPool`] accessors; only the kinds the structural reader
/// needs are resolved to strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Slot 0 and the upper half of a long/double.
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef { class: u16, name_and_type: u16 },
    MethodRef { class: u16, name_and_type: u16 },
    InterfaceMethodRef { class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
    MethodHandle { kind: u8, reference: u16 },
    MethodType(u16),
    Dynamic { bootstrap: u16, name_and_type: u16 },
    InvokeDynamic { bootstrap: u16, name_and_type: u16 },
    Module(u16),
    Package(u16),
}

impl Constant {
    fn kind(&self) -> &'static str {
        match self {
            Constant::Unusable => "unusable slot",
            Constant::Utf8(_) => "Utf8",
            Constant::Integer(_) => "Integer",
            Constant::Float(_) => "Float",
            Constant::Long(_) => "Long",
            Constant::Double(_) => "Double",
            Constant::Class(_) => "Class",
            Constant::String(_) => "String",
            Constant::FieldRef { .. } => "Fieldref",
            Constant::MethodRef { .. } => "Methodref",
            Constant::InterfaceMethodRef { .. } => "InterfaceMethodref",
            Constant::NameAndType { .. } => "NameAndType",
            Constant::MethodHandle { .. } => "MethodHandle",
            Constant::MethodType(_) => "MethodType",
            Constant::Dynamic { .. } => "Dynamic",
            Constant::InvokeDynamic { .. } => "InvokeDynamic",
            Constant::Module(_) => "Module",
            Constant::Package(_) => "Package",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Reads `constant_pool_count` followed by the pool itself.
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self, ClassFormatError> {
        let count = r.u16()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Constant::Unusable);

        let mut index: u16 = 1;
        while index < count {
            let tag = r.u8()?;
            let constant = match tag {
                1 => {
                    let len = r.u16()? as usize;
                    let raw = r.bytes(len)?;
                    Constant::Utf8(
                        decode_modified_utf8(raw).ok_or(ClassFormatError::InvalidUtf8 { index })?,
                    )
                }
                3 => Constant::Integer(r.i32()?),
                4 => Constant::Float(f32::from_bits(r.u32()?)),
                5 => Constant::Long(r.u64()? as i64),
                6 => Constant::Double(f64::from_bits(r.u64()?)),
                7 => Constant::Class(r.u16()?),
                8 => Constant::String(r.u16()?),
                9 => Constant::FieldRef {
                    class: r.u16()?,
                    name_and_type: r.u16()?,
                },
                10 => Constant::MethodRef {
                    class: r.u16()?,
                    name_and_type: r.u16()?,
                },
                11 => Constant::InterfaceMethodRef {
                    class: r.u16()?,
                    name_and_type: r.u16()?,
                },
                12 => Constant::NameAndType {
                    name: r.u16()?,
                    descriptor: r.u16()?,
                },
                15 => Constant::MethodHandle {
                    kind: r.u8()?,
                    reference: r.u16()?,
                },
                16 => Constant::MethodType(r.u16()?),
                17 => Constant::Dynamic {
                    bootstrap: r.u16()?,
                    name_and_type: r.u16()?,
                },
                18 => Constant::InvokeDynamic {
                    bootstrap: r.u16()?,
                    name_and_type: r.u16()?,
                },
                19 => Constant::Module(r.u16()?),
                20 => Constant::Package(r.u16()?),
                other => return Err(ClassFormatError::UnknownConstantTag { tag: other, index }),
            };

            let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
            entries.push(constant);
            index += 1;
            if wide {
                entries.push(Constant::Unusable);
                index = index.saturating_add(1);
            }
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn get(&self, index: u16) -> Result<&Constant, ClassFormatError> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => Err(ClassFormatError::BadConstantIndex { index }),
            Some(c) => Ok(c),
        }
    }

    pub fn utf8(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.get(index)? {
            Constant::Utf8(s) => Ok(s),
            other => Err(mismatch(index, "Utf8", other)),
        }
    }

    /// Resolves a `CONSTANT_Class` to its internal name.
    pub fn class_name(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.get(index)? {
            Constant::Class(name) => self.utf8(*name),
            other => Err(mismatch(index, "Class", other)),
        }
    }

    /// Like [`class_name`](Self::class_name), but index 0 means "absent".
    pub fn optional_class_name(&self, index: u16) -> Result<Option<&str>, ClassFormatError> {
        if index == 0 {
            return Ok(None);
        }
        self.class_name(index).map(Some)
    }

    pub fn optional_utf8(&self, index: u16) -> Result<Option<&str>, ClassFormatError> {
        if index == 0 {
            return Ok(None);
        }
        self.utf8(index).map(Some)
    }

    pub fn module_name(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.get(index)? {
            Constant::Module(name) => self.utf8(*name),
            other => Err(mismatch(index, "Module", other)),
        }
    }

    pub fn package_name(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.get(index)? {
            Constant::Package(name) => self.utf8(*name),
            other => Err(mismatch(index, "Package", other)),
        }
    }

    /// Resolves a `CONSTANT_NameAndType` to `(name, descriptor)`.
    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str), ClassFormatError> {
        match self.get(index)? {
            Constant::NameAndType { name, descriptor } => {
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            other => Err(mismatch(index, "NameAndType", other)),
        }
    }
}

fn mismatch(index: u16, expected: &'static str, found: &Constant) -> ClassFormatError {
    ClassFormatError::ConstantTypeMismatch {
        index,
        expected,
        found: found.kind(),
    }
}

/// Decodes the JVM "modified UTF-8" encoding.
///
/// Returns `None` on a malformed byte sequence. Unpaired surrogates are
/// legal in class files and are replaced rather than rejected.
pub fn decode_modified_utf8(raw: &[u8]) -> Option<String> {
    if raw.iter().all(|b| *b != 0 && *b < 0x80) {
        return std::str::from_utf8(raw).ok().map(str::to_owned);
    }

    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i] as u16;
        if b & 0x80 == 0 {
            units.push(b);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = *raw.get(i + 1)? as u16;
            if b2 & 0xC0 != 0x80 {
                return None;
            }
            units.push(((b & 0x1F) << 6) | (b2 & 0x3F));
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = *raw.get(i + 1)? as u16;
            let b3 = *raw.get(i + 2)? as u16;
            if b2 & 0xC0 != 0x80 || b3 & 0xC0 != 0x80 {
                return None;
            }
            units.push(((b & 0x0F) << 12) | ((b2 & 0x3F) << 6) | (b3 & 0x3F));
            i += 3;
        } else {
            return None;
        }
    }

    Some(String::from_utf16_lossy(&units))
}
