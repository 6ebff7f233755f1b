//! AllJoyn type signature codec.
//!
//! Converts between the compact type signature grammar used in the `type`
//! attributes of introspection XML and [`TypeDescriptor`]s:
//!
//! | Signature | Descriptor |
//! |-----------|------------|
//! | `b` `s` `d` | boolean, string, number |
//! | `y` `n` `q` `i` `u` `x` `t` | integer with the bounds of that width |
//! | `a<T>` | array of `T` |
//! | `a{s<T>}` | dictionary (object with `additionalProperties: T`) |
//! | `(<T>...)` | struct (array whose items are one descriptor per member) |
//!
//! Integer descriptors carry no width tag. The width is recovered from the
//! `{minimum, maximum}` pair alone, so the bounds below are part of the wire
//! contract. Unsigned widths use `2^bits` as their maximum while signed
//! widths use `2^(bits-1) - 1`; both directions must agree on this.
//!
//! Signatures follow the D-Bus limits: at most 255 bytes, and at most 32
//! nested arrays and 32 nested structs or dictionary entries.

use t2t_protocol::{ArrayItems, TypeDescriptor};

use crate::error::CodecError;

const INTEGER_WIDTHS: [(char, i128, i128); 7] = [
    ('y', 0, 1 << 8),
    ('n', -(1 << 15), (1 << 15) - 1),
    ('q', 0, 1 << 16),
    ('i', -(1 << 31), (1 << 31) - 1),
    ('u', 0, 1 << 32),
    ('x', -(1 << 63), (1 << 63) - 1),
    ('t', 0, 1 << 64),
];

const MAX_SIGNATURE_LENGTH: usize = 255;
const MAX_ARRAY_DEPTH: usize = 32;
const MAX_STRUCT_DEPTH: usize = 32;

/// Bracketed codes and their closing characters.
const BRACKETS: [(char, char); 3] = [('(', ')'), ('{', '}'), ('[', ']')];

/// Decodes a complete type signature.
pub fn decode(signature: &str) -> Result<TypeDescriptor, CodecError> {
    parse(signature).map_err(|reason| CodecError::InvalidSignature {
        signature: signature.to_owned(),
        reason,
    })
}

/// Encodes a type descriptor as a type signature.
pub fn encode(descriptor: &TypeDescriptor) -> Result<String, CodecError> {
    let mut signature = String::new();
    encode_into(descriptor, &mut signature)?;
    Ok(signature)
}

/// Splits the first complete type off a signature, returning it and the rest.
///
/// Bracketed types are measured with a depth counter that starts at 1 after
/// the opening character and only counts brackets of the same kind.
pub fn split_first(signature: &str) -> Result<(&str, &str), CodecError> {
    check_length(signature)
        .and_then(|()| first_type(signature))
        .map_err(|reason| CodecError::InvalidSignature {
            signature: signature.to_owned(),
            reason,
        })
}

fn parse(signature: &str) -> Result<TypeDescriptor, String> {
    check_length(signature)?;
    let (first, rest) = first_type(signature)?;
    if !rest.is_empty() {
        return Err(format!("unexpected '{rest}' after complete type '{first}'"));
    }
    parse_complete(first, Depth::default())
}

// Bounds the recursion of `first_type` and `parse_complete` by input size.
fn check_length(signature: &str) -> Result<(), String> {
    if signature.len() > MAX_SIGNATURE_LENGTH {
        return Err(format!(
            "signature is {} bytes long; the limit is {MAX_SIGNATURE_LENGTH}",
            signature.len()
        ));
    }
    Ok(())
}

/// Container nesting around the type being parsed.
#[derive(Debug, Clone, Copy, Default)]
struct Depth {
    arrays: usize,
    structs: usize,
}

impl Depth {
    fn array(self) -> Result<Self, String> {
        if self.arrays == MAX_ARRAY_DEPTH {
            return Err(format!("arrays nested deeper than {MAX_ARRAY_DEPTH}"));
        }
        Ok(Self {
            arrays: self.arrays + 1,
            ..self
        })
    }

    fn structure(self) -> Result<Self, String> {
        if self.structs == MAX_STRUCT_DEPTH {
            return Err(format!(
                "structs and dictionary entries nested deeper than {MAX_STRUCT_DEPTH}"
            ));
        }
        Ok(Self {
            structs: self.structs + 1,
            ..self
        })
    }
}

fn first_type(signature: &str) -> Result<(&str, &str), String> {
    let Some(code) = signature.chars().next() else {
        return Err("missing type".to_owned());
    };

    if let Some(&(open, close)) = BRACKETS.iter().find(|(open, _)| *open == code) {
        let mut depth = 1_usize;
        for (index, ch) in signature.char_indices().skip(1) {
            if ch == open {
                depth += 1;
            } else if ch == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(signature.split_at(index + ch.len_utf8()));
                }
            }
        }
        return Err(format!("unbalanced '{open}' in '{signature}'"));
    }

    if code == 'a' {
        let (element, _) = first_type(&signature[1..])
            .map_err(|_| format!("array '{signature}' is missing a valid element type"))?;
        return Ok(signature.split_at(1 + element.len()));
    }

    Ok(signature.split_at(code.len_utf8()))
}

// `part` is exactly one complete type as measured by `first_type`.
fn parse_complete(part: &str, depth: Depth) -> Result<TypeDescriptor, String> {
    let mut chars = part.chars();
    let Some(code) = chars.next() else {
        return Err("missing type".to_owned());
    };

    match code {
        '(' => parse_struct(&part[1..part.len() - 1], depth.structure()?),
        'a' if part[1..].starts_with('{') => {
            parse_dictionary(&part[2..part.len() - 1], depth.array()?.structure()?)
        }
        'a' => Ok(TypeDescriptor::array(parse_complete(&part[1..], depth.array()?)?)),
        '[' => Err("named types are not supported".to_owned()),
        'b' => Ok(TypeDescriptor::Boolean),
        'd' => Ok(TypeDescriptor::Number),
        's' => Ok(TypeDescriptor::String),
        _ => INTEGER_WIDTHS
            .iter()
            .find(|(width_code, _, _)| *width_code == code)
            .map(|&(_, minimum, maximum)| TypeDescriptor::integer(minimum, maximum))
            .ok_or_else(|| format!("type code '{code}' is not supported")),
    }
}

fn parse_struct(mut members: &str, depth: Depth) -> Result<TypeDescriptor, String> {
    let mut out = Vec::new();
    while !members.is_empty() {
        let (member, rest) = first_type(members)?;
        out.push(parse_complete(member, depth)?);
        members = rest;
    }
    Ok(TypeDescriptor::structure(out))
}

fn parse_dictionary(entry: &str, depth: Depth) -> Result<TypeDescriptor, String> {
    let (key, rest) = first_type(entry).map_err(|_| "dictionary key type missing".to_owned())?;
    if key != "s" {
        return Err(format!(
            "dictionary key type '{key}' is not supported; keys must be strings"
        ));
    }

    let (value, rest) = first_type(rest).map_err(|_| "dictionary value type missing".to_owned())?;
    if !rest.is_empty() {
        return Err(format!("dictionary entry has extra types '{rest}'"));
    }
    Ok(TypeDescriptor::dictionary(parse_complete(value, depth)?))
}

fn encode_into(descriptor: &TypeDescriptor, out: &mut String) -> Result<(), CodecError> {
    match descriptor {
        TypeDescriptor::Boolean => out.push('b'),
        TypeDescriptor::String => out.push('s'),
        TypeDescriptor::Number => out.push('d'),
        TypeDescriptor::Integer { minimum, maximum } => {
            out.push(integer_code(*minimum, *maximum)?);
        }
        TypeDescriptor::Array {
            items: ArrayItems::Single(item),
        } => {
            out.push('a');
            encode_into(item, out)?;
        }
        TypeDescriptor::Array {
            items: ArrayItems::Tuple(members),
        } => {
            out.push('(');
            for member in members {
                encode_into(member, out)?;
            }
            out.push(')');
        }
        TypeDescriptor::Object {
            additional_properties: Some(value),
            properties,
        } if properties.is_empty() => {
            out.push_str("a{s");
            encode_into(value, out)?;
            out.push('}');
        }
        TypeDescriptor::Object { .. } => {
            return Err(CodecError::UnsupportedType(
                "non-dictionary object types".to_owned(),
            ));
        }
        TypeDescriptor::Titled { title, .. } => {
            return Err(CodecError::UnsupportedType(format!("named type '{title}'")));
        }
    }
    Ok(())
}

fn integer_code(minimum: Option<i128>, maximum: Option<i128>) -> Result<char, CodecError> {
    let (Some(min), Some(max)) = (minimum, maximum) else {
        if minimum.is_none() && maximum.is_none() {
            return Ok('i');
        }
        return Err(CodecError::UnsupportedRange { minimum, maximum });
    };

    INTEGER_WIDTHS
        .iter()
        .find(|&&(_, width_min, width_max)| width_min == min && width_max == max)
        .map(|&(code, _, _)| code)
        .ok_or(CodecError::UnsupportedRange { minimum, maximum })
}
