use std::io::Write;

use crate::ast::{Record, Type};

const INDENT_WIDTH: usize = 2;

/// Returns the AST as an indented tree, one node per line.
pub fn print_type_string(ty: &Type) -> String {
    let mut buf = Vec::with_capacity(512);
    // Writing into a `Vec` can't fail.
    _ = print_type(&mut buf, 0, ty);
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn print_type(w: &mut impl Write, i: usize, ty: &Type) -> std::io::Result<()> {
    sp(w, i)?;
    match ty {
        Type::Scalar(name) => writeln!(w, "scalar {name}")?,
        Type::Optional(inner) => {
            writeln!(w, "optional")?;
            print_type(w, i + 1, inner)?;
        }
        Type::List(element) => {
            writeln!(w, "list")?;
            print_type(w, i + 1, element)?;
        }
        Type::Record(record) => {
            writeln!(w, "record")?;
            print_fields(w, i + 1, record)?;
        }
    }
    Ok(())
}

fn print_fields(w: &mut impl Write, i: usize, record: &Record) -> std::io::Result<()> {
    for field in record.fields() {
        sp(w, i)?;
        writeln!(w, "field {}", field.label)?;
        print_type(w, i + 1, &field.ty)?;
    }
    Ok(())
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
