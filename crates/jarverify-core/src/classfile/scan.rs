use serde::{Deserialize, Serialize};

use crate::classfile::ClassFormatError;
use crate::classfile::reader::ByteReader;

/// Instruction category, keyed by operand layout.
///
/// Discriminants follow the conventional structural-reader numbering so
/// serialized shapes stay comparable with historical reports. Pseudo
/// instructions (labels, line numbers, frames) are never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsnKind {
    Insn = 0,
    IntInsn = 1,
    VarInsn = 2,
    TypeInsn = 3,
    FieldInsn = 4,
    MethodInsn = 5,
    InvokeDynamicInsn = 6,
    JumpInsn = 7,
    LdcInsn = 9,
    IincInsn = 10,
    TableswitchInsn = 11,
    LookupswitchInsn = 12,
    MultianewarrayInsn = 13,
}

/// Opcode and category of one instruction; operands are not retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstructionShape {
    pub opcode: u8,
    pub kind: InsnKind,
}

const ILOAD: u8 = 0x15;
const ISTORE: u8 = 0x36;
const LDC: u8 = 0x12;
const IINC: u8 = 0x84;
const GOTO: u8 = 0xA7;
const JSR: u8 = 0xA8;
const WIDE: u8 = 0xC4;

/// Scans a `Code` attribute's bytecode array and returns one shape per
/// instruction.
///
/// Performs a single linear pass. Equivalent encodings collapse to one
/// canonical opcode: `iload_0`-style forms become their explicit-index
/// opcode, `wide` is folded into the opcode it widens, `goto_w`/`jsr_w`
/// become `goto`/`jsr`, and `ldc_w`/`ldc2_w` become `ldc`.
pub fn scan_instructions(code: &[u8]) -> Result<Vec<InstructionShape>, ClassFormatError> {
    let mut reader = ByteReader::new(code);
    let mut shapes = Vec::new();

    while !reader.eof() {
        let offset = reader.position();
        let opcode = reader.u8()?;
        shapes.push(read_shape(&mut reader, opcode, offset)?);
    }

    Ok(shapes)
}

fn read_shape(
    r: &mut ByteReader<'_>,
    opcode: u8,
    offset: usize,
) -> Result<InstructionShape, ClassFormatError> {
    let shape = |opcode, kind| InstructionShape { opcode, kind };

    let s = match opcode {
        // nop, constants, array loads/stores, stack, arithmetic, conversions,
        // comparisons, returns, arraylength, athrow, monitors
        0x00..=0x0F
        | 0x2E..=0x35
        | 0x4F..=0x83
        | 0x85..=0x98
        | 0xAC..=0xB1
        | 0xBE
        | 0xBF
        | 0xC2
        | 0xC3 => shape(opcode, InsnKind::Insn),

        // bipush, newarray
        0x10 | 0xBC => {
            r.skip(1)?;
            shape(opcode, InsnKind::IntInsn)
        }
        // sipush
        0x11 => {
            r.skip(2)?;
            shape(opcode, InsnKind::IntInsn)
        }

        // ldc
        0x12 => {
            r.skip(1)?;
            shape(LDC, InsnKind::LdcInsn)
        }
        // ldc_w, ldc2_w
        0x13 | 0x14 => {
            r.skip(2)?;
            shape(LDC, InsnKind::LdcInsn)
        }

        // xload / xstore / ret with explicit index
        0x15..=0x19 | 0x36..=0x3A | 0xA9 => {
            r.skip(1)?;
            shape(opcode, InsnKind::VarInsn)
        }
        // xload_n
        0x1A..=0x2D => shape(ILOAD + (opcode - 0x1A) / 4, InsnKind::VarInsn),
        // xstore_n
        0x3B..=0x4E => shape(ISTORE + (opcode - 0x3B) / 4, InsnKind::VarInsn),

        // iinc
        0x84 => {
            r.skip(2)?;
            shape(IINC, InsnKind::IincInsn)
        }

        // conditional branches, goto, jsr, ifnull, ifnonnull
        0x99..=0xA8 | 0xC6 | 0xC7 => {
            r.skip(2)?;
            shape(opcode, InsnKind::JumpInsn)
        }
        0xC8 => {
            r.skip(4)?;
            shape(GOTO, InsnKind::JumpInsn)
        }
        0xC9 => {
            r.skip(4)?;
            shape(JSR, InsnKind::JumpInsn)
        }

        0xAA => {
            skip_switch_padding(r, offset)?;
            r.skip(4)?; // default
            let low = r.i32()?;
            let high = r.i32()?;
            let count = (high as i64 - low as i64 + 1).max(0) as usize;
            r.skip(count.saturating_mul(4))?;
            shape(opcode, InsnKind::TableswitchInsn)
        }
        0xAB => {
            skip_switch_padding(r, offset)?;
            r.skip(4)?; // default
            let pairs = r.i32()?.max(0) as usize;
            r.skip(pairs.saturating_mul(8))?;
            shape(opcode, InsnKind::LookupswitchInsn)
        }

        // getstatic, putstatic, getfield, putfield
        0xB2..=0xB5 => {
            r.skip(2)?;
            shape(opcode, InsnKind::FieldInsn)
        }
        // invokevirtual, invokespecial, invokestatic
        0xB6..=0xB8 => {
            r.skip(2)?;
            shape(opcode, InsnKind::MethodInsn)
        }
        // invokeinterface: index, count, 0
        0xB9 => {
            r.skip(4)?;
            shape(opcode, InsnKind::MethodInsn)
        }
        0xBA => {
            r.skip(4)?;
            shape(opcode, InsnKind::InvokeDynamicInsn)
        }

        // new, anewarray, checkcast, instanceof
        0xBB | 0xBD | 0xC0 | 0xC1 => {
            r.skip(2)?;
            shape(opcode, InsnKind::TypeInsn)
        }

        WIDE => {
            let widened = r.u8()?;
            match widened {
                IINC => {
                    r.skip(4)?;
                    shape(IINC, InsnKind::IincInsn)
                }
                0x15..=0x19 | 0x36..=0x3A | 0xA9 => {
                    r.skip(2)?;
                    shape(widened, InsnKind::VarInsn)
                }
                other => {
                    return Err(ClassFormatError::InvalidOpcode {
                        opcode: other,
                        offset: offset + 1,
                    });
                }
            }
        }

        0xC5 => {
            r.skip(3)?;
            shape(opcode, InsnKind::MultianewarrayInsn)
        }

        other => return Err(ClassFormatError::InvalidOpcode { opcode: other, offset }),
    };

    Ok(s)
}

/// Switch operands start at the next 4-byte boundary relative to the start
/// of the bytecode array.
fn skip_switch_padding(r: &mut ByteReader<'_>, opcode_offset: usize) -> Result<(), ClassFormatError> {
    let padding = (4 - (opcode_offset + 1) % 4) % 4;
    r.skip(padding)
}
