use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use crate::object::array::Array;
use crate::object::map::Map;
use crate::object::Value;

// Shared rendering for Display and Debug. The `visiting` stack holds
// the addresses of the containers currently being rendered; reaching
// one of them again is a back-edge and prints as "..." so the output
// stays finite on cyclic graphs.

pub(crate) fn write_value(
    f: &mut Formatter<'_>,
    value: &Value,
    visiting: &mut Vec<usize>,
) -> FmtResult {
    match value {
        Value::Null => write!(f, "null"),
        Value::Bool(boolean) => write!(f, "{}", boolean),
        Value::Int(int) => write!(f, "{}", int),
        Value::Real(real) => write!(f, "{}", real),
        Value::String(string) => write_string(f, string),
        Value::Array(array) => write_array(f, array, visiting),
        Value::Map(map) => write_map(f, map, visiting),
    }
}

pub(crate) fn write_array(
    f: &mut Formatter<'_>,
    array: &Array,
    visiting: &mut Vec<usize>,
) -> FmtResult {
    if visiting.contains(&array.addr()) {
        return write!(f, "...");
    }
    visiting.push(array.addr());
    write!(f, "[")?;
    for (i, item) in array.items().iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_value(f, item, visiting)?;
    }
    visiting.pop();
    write!(f, "]")
}

pub(crate) fn write_map(f: &mut Formatter<'_>, map: &Map, visiting: &mut Vec<usize>) -> FmtResult {
    if visiting.contains(&map.addr()) {
        return write!(f, "...");
    }
    visiting.push(map.addr());
    write!(f, "{{")?;
    for (i, (key, value)) in map.entries().iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_string(f, key)?;
        write!(f, ": ")?;
        write_value(f, value, visiting)?;
    }
    visiting.pop();
    write!(f, "}}")
}

fn write_string(f: &mut Formatter<'_>, string: &str) -> FmtResult {
    write!(f, "\"")?;
    for char in string.chars() {
        match char {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            // Control characters take the JSON escape form
            char if char.is_control() => write!(f, "\\u{:04x}", char as u32)?,
            char => write!(f, "{}", char)?,
        }
    }
    write!(f, "\"")
}
