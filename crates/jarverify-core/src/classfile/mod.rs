//! Binary class reader.
//!
//! Decodes the compiled-class format into a [`node::ClassNode`] tree. The
//! reader only models the structural surface: instruction operands, stack
//! map frames and line tables are never retained.

use thiserror::Error;

pub mod constpool;
pub mod node;
pub mod parse;
pub mod read;
pub mod reader;
pub mod scan;
pub mod version;

pub use node::ClassNode;
pub use parse::{DecodeOptions, parse_class};
pub use version::{ClassVersion, UnknownClassVersion};

/// A class file could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassFormatError {
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("bad magic number 0x{0:08X}")]
    BadMagic(u32),

    #[error("invalid constant pool index {index}")]
    BadConstantIndex { index: u16 },

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },

    #[error("constant pool index {index}: expected {expected}, found {found}")]
    ConstantTypeMismatch {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },

    #[error("malformed modified UTF-8 at constant pool index {index}")]
    InvalidUtf8 { index: u16 },

    #[error("invalid opcode 0x{opcode:02X} at bytecode offset {offset}")]
    InvalidOpcode { opcode: u8, offset: usize },

    #[error("unknown element value tag '{0}'")]
    BadElementTag(char),

    #[error("unknown type annotation target 0x{0:02X}")]
    BadTargetType(u8),

    #[error("malformed {attribute}: {reason}")]
    BadAttribute { attribute: String, reason: String },
}
