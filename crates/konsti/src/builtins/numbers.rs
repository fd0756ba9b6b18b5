//! Numeric, boolean and char built-ins.
//!
//! Arithmetic runs at the width dictated by the most precise operand kind:
//! byte/short/int combinations produce `Int`, anything with a `Long`
//! produces `Long`, and the floating kinds win over the integral ones.
//! Integral arithmetic wraps in two's complement; integral division and
//! remainder by zero raise `ArithmeticException`.

use num_traits::ToPrimitive;

use crate::{
    exception::BuiltinExc,
    interp::flow::EvalFault,
    value::{Primitive, Value},
};

/// Both operands converted to their common arithmetic width.
enum NumPair {
    Int(i32, i32),
    Long(i64, i64),
    Float(f32, f32),
    Double(f64, f64),
}

fn as_i64(p: &Primitive) -> Option<i64> {
    match p {
        Primitive::Byte(v) => Some(i64::from(*v)),
        Primitive::Short(v) => Some(i64::from(*v)),
        Primitive::Int(v) => Some(i64::from(*v)),
        Primitive::Long(v) => Some(*v),
        _ => None,
    }
}

fn as_f64(p: &Primitive) -> Option<f64> {
    match p {
        Primitive::Float(v) => Some(f64::from(*v)),
        Primitive::Double(v) => Some(*v),
        other => as_i64(other).map(|v| v as f64),
    }
}

/// Promotes two numeric primitives to their common width.
fn promote(a: &Primitive, b: &Primitive) -> Option<NumPair> {
    use Primitive as P;
    let pair = match (a, b) {
        (P::Double(_), _) | (_, P::Double(_)) => NumPair::Double(as_f64(a)?, as_f64(b)?),
        (P::Float(_), _) | (_, P::Float(_)) => {
            NumPair::Float(as_f64(a)? as f32, as_f64(b)? as f32)
        }
        (P::Long(_), _) | (_, P::Long(_)) => NumPair::Long(as_i64(a)?, as_i64(b)?),
        _ => {
            let (x, y) = (as_i64(a)?, as_i64(b)?);
            NumPair::Int(x as i32, y as i32)
        }
    };
    Some(pair)
}

fn int(v: i32) -> Value {
    Value::Primitive(Primitive::Int(v))
}

fn boolean(v: bool) -> Value {
    Value::Primitive(Primitive::Boolean(v))
}

fn div_by_zero() -> EvalFault {
    EvalFault::exc(BuiltinExc::ArithmeticException, "/ by zero")
}

/// Numeric/boolean/char dispatch; `Ok(None)` defers to the shared forms.
pub(super) fn dispatch(name: &str, receiver: &Primitive, args: &[Value]) -> Result<Option<Value>, EvalFault> {
    match args {
        [] => unary(name, receiver),
        [Value::Primitive(arg)] => binary(name, receiver, arg),
        _ => Ok(None),
    }
}

fn unary(name: &str, receiver: &Primitive) -> Result<Option<Value>, EvalFault> {
    use Primitive as P;
    let result = match (name, receiver) {
        ("unaryMinus", p) => match promote(p, &P::Int(0)) {
            Some(NumPair::Int(v, _)) => Some(int(v.wrapping_neg())),
            Some(NumPair::Long(v, _)) => Some(Value::Primitive(P::Long(v.wrapping_neg()))),
            Some(NumPair::Float(v, _)) => Some(Value::Primitive(P::Float(-v))),
            Some(NumPair::Double(v, _)) => Some(Value::Primitive(P::Double(-v))),
            None => None,
        },
        ("unaryPlus", p) if as_f64(p).is_some() => Some(Value::Primitive(p.clone())),
        ("inv", P::Int(v)) => Some(int(!v)),
        ("inv", P::Long(v)) => Some(Value::Primitive(P::Long(!v))),
        ("not", P::Boolean(b)) => Some(boolean(!b)),
        ("code", P::Char(c)) => Some(int(*c as i32)),
        ("toByte", p) => as_i64(p).map(|v| Value::Primitive(P::Byte(v as i8))),
        ("toShort", p) => as_i64(p).map(|v| Value::Primitive(P::Short(v as i16))),
        ("toInt", P::Char(c)) => Some(int(*c as i32)),
        ("toInt", p @ (P::Float(_) | P::Double(_))) => {
            as_f64(p).map(|v| int(v.to_i32().unwrap_or_else(|| saturate_i32(v))))
        }
        ("toInt", p) => as_i64(p).map(|v| int(v as i32)),
        ("toLong", p @ (P::Float(_) | P::Double(_))) => {
            as_f64(p).map(|v| Value::Primitive(P::Long(saturate_i64(v))))
        }
        ("toLong", p) => as_i64(p).map(|v| Value::Primitive(P::Long(v))),
        ("toFloat", p) => as_f64(p).map(|v| Value::Primitive(P::Float(v as f32))),
        ("toDouble", p) => as_f64(p).map(|v| Value::Primitive(P::Double(v))),
        ("toChar", p) => as_i64(p).and_then(|v| char::from_u32((v as u32) & 0xFFFF)).map(|c| Value::Primitive(P::Char(c))),
        _ => None,
    };
    Ok(result)
}

fn binary(name: &str, receiver: &Primitive, arg: &Primitive) -> Result<Option<Value>, EvalFault> {
    use Primitive as P;

    // Boolean connectives; both operands are already evaluated here, so
    // short-circuit forms must be lowered to branches in the IR.
    if let (P::Boolean(a), P::Boolean(b)) = (receiver, arg) {
        let result = match name {
            "and" => Some(boolean(*a && *b)),
            "or" => Some(boolean(*a || *b)),
            "xor" => Some(boolean(*a != *b)),
            _ => None,
        };
        if result.is_some() {
            return Ok(result);
        }
    }

    // Char arithmetic: Char ± Int → Char, Char - Char → Int.
    match (name, receiver, arg) {
        ("plus", P::Char(c), P::Int(d)) => {
            return Ok(char::from_u32((*c as i32).wrapping_add(*d) as u32)
                .map(|c| Value::Primitive(P::Char(c))));
        }
        ("minus", P::Char(c), P::Int(d)) => {
            return Ok(char::from_u32((*c as i32).wrapping_sub(*d) as u32)
                .map(|c| Value::Primitive(P::Char(c))));
        }
        ("minus", P::Char(a), P::Char(b)) => {
            return Ok(Some(int(*a as i32 - *b as i32)));
        }
        ("compareTo", P::Char(a), P::Char(b)) => {
            return Ok(Some(int((*a as i32).cmp(&(*b as i32)) as i32)));
        }
        _ => {}
    }

    // Shifts take an Int count on both Int and Long receivers; the count is
    // masked to the receiver width like the host's shift instructions.
    if let P::Int(count) = arg {
        let shifted = match (name, receiver) {
            ("shl", P::Int(v)) => Some(int(v.wrapping_shl(*count as u32))),
            ("shr", P::Int(v)) => Some(int(v.wrapping_shr(*count as u32))),
            ("ushr", P::Int(v)) => Some(int(((*v as u32).wrapping_shr(*count as u32)) as i32)),
            ("shl", P::Long(v)) => Some(Value::Primitive(P::Long(v.wrapping_shl(*count as u32)))),
            ("shr", P::Long(v)) => Some(Value::Primitive(P::Long(v.wrapping_shr(*count as u32)))),
            ("ushr", P::Long(v)) => {
                Some(Value::Primitive(P::Long(((*v as u64).wrapping_shr(*count as u32)) as i64)))
            }
            _ => None,
        };
        if shifted.is_some() {
            return Ok(shifted);
        }
    }

    // Integral bitwise operators at the common width.
    if matches!(name, "and" | "or" | "xor")
        && let (Some(a), Some(b)) = (as_i64(receiver), as_i64(arg))
        && !matches!(receiver, P::Float(_) | P::Double(_))
        && !matches!(arg, P::Float(_) | P::Double(_))
    {
        let v = match name {
            "and" => a & b,
            "or" => a | b,
            _ => a ^ b,
        };
        let result = if matches!(receiver, P::Long(_)) || matches!(arg, P::Long(_)) {
            Value::Primitive(P::Long(v))
        } else {
            int(v as i32)
        };
        return Ok(Some(result));
    }

    let Some(pair) = promote(receiver, arg) else { return Ok(None) };
    let result = match name {
        "plus" => Some(arith(pair, i32::wrapping_add, i64::wrapping_add, |a, b| a + b, |a, b| a + b)?),
        "minus" => Some(arith(pair, i32::wrapping_sub, i64::wrapping_sub, |a, b| a - b, |a, b| a - b)?),
        "times" => Some(arith(pair, i32::wrapping_mul, i64::wrapping_mul, |a, b| a * b, |a, b| a * b)?),
        "div" => Some(divide(pair)?),
        "rem" => Some(remainder(pair)?),
        "compareTo" => Some(int(compare(&pair))),
        "less" => Some(boolean(compare(&pair) < 0)),
        "lessOrEqual" => Some(boolean(compare(&pair) <= 0)),
        "greater" => Some(boolean(compare(&pair) > 0)),
        "greaterOrEqual" => Some(boolean(compare(&pair) >= 0)),
        _ => None,
    };
    Ok(result)
}

fn arith(
    pair: NumPair,
    fi: fn(i32, i32) -> i32,
    fl: fn(i64, i64) -> i64,
    ff: fn(f32, f32) -> f32,
    fd: fn(f64, f64) -> f64,
) -> Result<Value, EvalFault> {
    Ok(match pair {
        NumPair::Int(a, b) => Value::Primitive(Primitive::Int(fi(a, b))),
        NumPair::Long(a, b) => Value::Primitive(Primitive::Long(fl(a, b))),
        NumPair::Float(a, b) => Value::Primitive(Primitive::Float(ff(a, b))),
        NumPair::Double(a, b) => Value::Primitive(Primitive::Double(fd(a, b))),
    })
}

fn divide(pair: NumPair) -> Result<Value, EvalFault> {
    Ok(match pair {
        NumPair::Int(_, 0) | NumPair::Long(_, 0) => return Err(div_by_zero()),
        NumPair::Int(a, b) => Value::Primitive(Primitive::Int(a.wrapping_div(b))),
        NumPair::Long(a, b) => Value::Primitive(Primitive::Long(a.wrapping_div(b))),
        NumPair::Float(a, b) => Value::Primitive(Primitive::Float(a / b)),
        NumPair::Double(a, b) => Value::Primitive(Primitive::Double(a / b)),
    })
}

fn remainder(pair: NumPair) -> Result<Value, EvalFault> {
    Ok(match pair {
        NumPair::Int(_, 0) | NumPair::Long(_, 0) => return Err(div_by_zero()),
        NumPair::Int(a, b) => Value::Primitive(Primitive::Int(a.wrapping_rem(b))),
        NumPair::Long(a, b) => Value::Primitive(Primitive::Long(a.wrapping_rem(b))),
        NumPair::Float(a, b) => Value::Primitive(Primitive::Float(a % b)),
        NumPair::Double(a, b) => Value::Primitive(Primitive::Double(a % b)),
    })
}

fn compare(pair: &NumPair) -> i32 {
    match pair {
        NumPair::Int(a, b) => a.cmp(b) as i32,
        NumPair::Long(a, b) => a.cmp(b) as i32,
        NumPair::Float(a, b) => a.partial_cmp(b).map_or(1, |o| o as i32),
        NumPair::Double(a, b) => a.partial_cmp(b).map_or(1, |o| o as i32),
    }
}

/// Float→Int conversion with host saturation semantics.
fn saturate_i32(v: f64) -> i32 {
    if v.is_nan() {
        0
    } else if v >= f64::from(i32::MAX) {
        i32::MAX
    } else if v <= f64::from(i32::MIN) {
        i32::MIN
    } else {
        v as i32
    }
}

fn saturate_i64(v: f64) -> i64 {
    if v.is_nan() {
        0
    } else if v >= i64::MAX as f64 {
        i64::MAX
    } else if v <= i64::MIN as f64 {
        i64::MIN
    } else {
        v as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(name: &str, a: Primitive, b: Primitive) -> Value {
        binary(name, &a, &b).unwrap().unwrap()
    }

    #[test]
    fn int_arithmetic_wraps() {
        let v = eval("plus", Primitive::Int(i32::MAX), Primitive::Int(1));
        assert!(matches!(v, Value::Primitive(Primitive::Int(i32::MIN))));
    }

    #[test]
    fn mixed_width_promotes_to_long() {
        let v = eval("times", Primitive::Int(3), Primitive::Long(4));
        assert!(matches!(v, Value::Primitive(Primitive::Long(12))));
    }

    #[test]
    fn byte_plus_byte_is_int() {
        let v = eval("plus", Primitive::Byte(100), Primitive::Byte(100));
        assert!(matches!(v, Value::Primitive(Primitive::Int(200))));
    }

    #[test]
    fn div_by_zero_raises() {
        let err = binary("div", &Primitive::Int(1), &Primitive::Int(0)).unwrap_err();
        assert!(matches!(err, EvalFault::Exc { kind: BuiltinExc::ArithmeticException, .. }));
    }

    #[test]
    fn float_division_by_zero_is_infinite() {
        let v = eval("div", Primitive::Double(1.0), Primitive::Double(0.0));
        assert!(matches!(v, Value::Primitive(Primitive::Double(d)) if d.is_infinite()));
    }

    #[test]
    fn ushr_fills_with_zero() {
        let v = eval("ushr", Primitive::Int(-1), Primitive::Int(28));
        assert!(matches!(v, Value::Primitive(Primitive::Int(15))));
    }

    #[test]
    fn char_arithmetic() {
        let v = eval("plus", Primitive::Char('a'), Primitive::Int(1));
        assert!(matches!(v, Value::Primitive(Primitive::Char('b'))));
        let v = eval("minus", Primitive::Char('d'), Primitive::Char('a'));
        assert!(matches!(v, Value::Primitive(Primitive::Int(3))));
    }
}
