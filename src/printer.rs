use std::fmt::{self, Write};

use crate::ast::{Label, Record, Type};

const INDENT_WIDTH: usize = 2;

/// Words that can't be used as bare labels.
static RESERVED: phf::Set<&'static str> = phf::phf_set! {
    "if", "then", "else", "let", "in", "as", "using", "merge", "missing",
    "Infinity", "NaN", "toMap", "assert", "forall", "with", "showConstructor",
};

/// Writes `ty` in canonical multi-line layout.
///
/// The first line is never indented: the output is meant to follow a prefix
/// on the caller's line. Every following line is shifted by `indent` levels.
pub fn print(w: &mut impl Write, ty: &Type, indent: usize) -> fmt::Result {
    match ty {
        Type::Scalar(name) => w.write_str(name),
        Type::Optional(inner) => print_application(w, "Optional", inner, indent),
        Type::List(element) => print_application(w, "List", element, indent),
        Type::Record(record) => print_record(w, record, indent),
    }
}

/// Returns `ty` in canonical multi-line layout. See [`print`].
pub fn print_string(ty: &Type, indent: usize) -> String {
    Pretty { ty, indent }.to_string()
}

/// Returns `ty` on a single line, as in `{ a : Text, b : List Natural }`.
pub fn print_compact(ty: &Type) -> String {
    ty.to_string()
}

fn print_application(w: &mut impl Write, ctor: &str, arg: &Type, indent: usize) -> fmt::Result {
    write!(w, "{ctor} ")?;
    if arg.is_application() {
        w.write_char('(')?;
        print(w, arg, indent)?;
        w.write_char(')')
    } else {
        print(w, arg, indent)
    }
}

fn print_record(w: &mut impl Write, record: &Record, indent: usize) -> fmt::Result {
    if record.is_empty() {
        return w.write_str("{}");
    }
    writeln!(w, "{{")?;
    let last = record.len() - 1;
    for (idx, field) in record.fields().iter().enumerate() {
        sp(w, indent + 1)?;
        write!(w, "{} : ", LabelWriter(&field.label))?;
        print(w, &field.ty, indent + 1)?;
        if idx != last {
            w.write_char(',')?;
        }
        writeln!(w)?;
    }
    sp(w, indent)?;
    w.write_char('}')
}

fn sp(w: &mut impl Write, i: usize) -> fmt::Result {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}

/// Pretty-printing adapter over [`print`].
pub struct Pretty<'a> {
    pub ty: &'a Type,
    pub indent: usize,
}

impl fmt::Display for Pretty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print(f, self.ty, self.indent)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Scalar(name) => f.write_str(name),
            Type::Optional(arg) | Type::List(arg) => {
                let ctor = if matches!(self, Type::List(_)) {
                    "List"
                } else {
                    "Optional"
                };
                if arg.is_application() {
                    write!(f, "{ctor} ({arg})")
                } else {
                    write!(f, "{ctor} {arg}")
                }
            }
            Type::Record(record) if record.is_empty() => f.write_str("{}"),
            Type::Record(record) => {
                f.write_str("{ ")?;
                for (idx, field) in record.fields().iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} : {}", LabelWriter(&field.label), field.ty)?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// Writes a label, quoting it in backticks when it isn't a simple label.
struct LabelWriter<'a>(&'a Label);

impl fmt::Display for LabelWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.0.as_str();
        if Label::is_simple(label) && !RESERVED.contains(label) {
            f.write_str(label)
        } else {
            write!(f, "`{label}`")
        }
    }
}
