use crate::strings::string_repr;
use crate::types::{Cell, LispFloat, LispObject};
use std::fmt::Write;

/// Renders `object` in the token grammar the reader accepts.
///
/// Atoms are followed by a separator space. A proper list prints its
/// elements back to back and closes with `)`; a chain ending in anything but
/// nil prints as nested `(cons A B)` forms.
pub fn pr_str(object: &LispObject) -> String {
    let mut output = String::new();
    print_into(&mut output, object);
    output
}

fn print_into(output: &mut String, object: &LispObject) {
    match object {
        LispObject::Nil => output.push_str("()"),
        LispObject::Integer(value) => {
            let _ = write!(output, "{} ", value);
        }
        LispObject::Float(value) => {
            print_float(output, *value);
            output.push(' ');
        }
        LispObject::String(value) => {
            output.push_str(&string_repr(value));
            output.push(' ');
        }
        LispObject::Symbol(symbol) => {
            let _ = write!(output, "{} ", symbol);
        }
        LispObject::Cell(cell) if is_proper(cell) => {
            output.push('(');
            for element in object.iter() {
                print_into(output, &element);
            }
            output.push(')');
        }
        LispObject::Cell(cell) => {
            output.push_str("(cons ");
            print_into(output, &cell.car());
            print_into(output, &cell.cdr());
            output.push_str(") ");
        }
        LispObject::Closure(closure) => print_into(output, &closure.source()),
        LispObject::Sentinel(sentinel) => {
            let _ = write!(output, "{} ", sentinel);
        }
    }
}

// Plain decimal notation, with a `.` so the text reads back as a float.
fn print_float(output: &mut String, value: LispFloat) {
    let text = value.to_string();
    let needs_point = value.is_finite() && !text.contains('.');
    output.push_str(&text);
    if needs_point {
        output.push_str(".0");
    }
}

fn is_proper(cell: &Cell) -> bool {
    let mut tail = cell.cdr();
    loop {
        match tail {
            LispObject::Nil => return true,
            LispObject::Cell(next) => tail = next.cdr(),
            _ => return false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reader::read_str;
    use crate::types::Sentinel;

    fn round_trip(input: &str) -> String {
        pr_str(&read_str(input).unwrap().unwrap())
    }

    #[test]
    fn atoms_round_trip() {
        assert_eq!(round_trip("42").trim_end(), "42");
        assert_eq!(round_trip("-3").trim_end(), "-3");
        assert_eq!(round_trip("1.5").trim_end(), "1.5");
        assert_eq!(round_trip("2.0").trim_end(), "2.0");
        assert_eq!(round_trip("-3.").trim_end(), "-3.0");
        assert_eq!(
            round_trip("100000000000000000000.0").trim_end(),
            "100000000000000000000.0"
        );
        assert_eq!(round_trip("0.0000001").trim_end(), "0.0000001");
        assert_eq!(round_trip("foo").trim_end(), "foo");
        assert_eq!(round_trip(r#""a \"b\"""#).trim_end(), r#""a \"b\"""#);
    }

    #[test]
    fn atoms_carry_a_separator() {
        assert_eq!(round_trip("7"), "7 ");
        assert_eq!(round_trip("x"), "x ");
    }

    #[test]
    fn nil_prints_as_empty_list() {
        assert_eq!(pr_str(&LispObject::Nil), "()");
    }

    #[test]
    fn lists() {
        assert_eq!(round_trip("(1 2 3)"), "(1 2 3 )");
        assert_eq!(round_trip("(a (b) c)"), "(a (b )c )");
        assert_eq!(round_trip("(())"), "(())");
    }

    #[test]
    fn extreme_floats_read_back_as_floats() {
        for value in [1e20, 1e-7, 1.5e300, -2.5e-10].iter() {
            let printed = pr_str(&LispObject::Float(*value));
            assert_eq!(read_str(&printed).unwrap().unwrap(), LispObject::Float(*value));
        }
    }

    #[test]
    fn printed_lists_read_back() {
        let printed = round_trip("(a (b \"c\") 1.5 ())");
        assert_eq!(round_trip(&printed), printed);
    }

    #[test]
    fn dotted_pairs() {
        let pair = LispObject::cons(LispObject::Integer(1), LispObject::Integer(2));
        assert_eq!(pr_str(&pair), "(cons 1 2 ) ");
        let improper = LispObject::cons(LispObject::Integer(0), pair);
        assert_eq!(pr_str(&improper), "(cons 0 (cons 1 2 ) ) ");
    }

    #[test]
    fn sentinels() {
        let invalid = LispObject::Sentinel(Sentinel::InvalidFunction);
        assert_eq!(pr_str(&invalid).trim_end(), "<INVALID FUNCTION>");
    }
}
