//! Binary `NUMERIC` wire format: header of four 16-bit fields, then base-10000 digit groups.

use std::error::Error;

use tokio_postgres::types::{FromSql, Type};
use tokio_util::bytes::{BufMut, BytesMut};

type BoxError = Box<dyn Error + Sync + Send>;

const SIGN_POSITIVE: u16 = 0x0000;
const SIGN_NEGATIVE: u16 = 0x4000;
const SIGN_NAN: u16 = 0xC000;
const SIGN_POS_INF: u16 = 0xD000;
const SIGN_NEG_INF: u16 = 0xF000;

/// A decoded `NUMERIC` value, widened to `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PgNumeric(pub f64);

fn read_u16(raw: &[u8], offset: usize) -> Result<u16, BoxError> {
    raw.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| "truncated numeric value".into())
}

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let ndigits = usize::from(read_u16(raw, 0)?);
        #[allow(clippy::cast_possible_wrap)]
        let weight = i32::from(read_u16(raw, 2)? as i16);
        let sign = read_u16(raw, 4)?;

        match sign {
            SIGN_NAN => return Ok(PgNumeric(f64::NAN)),
            SIGN_POS_INF => return Ok(PgNumeric(f64::INFINITY)),
            SIGN_NEG_INF => return Ok(PgNumeric(f64::NEG_INFINITY)),
            SIGN_POSITIVE | SIGN_NEGATIVE => {}
            other => return Err(format!("unknown numeric sign {other:#06x}").into()),
        }

        let mut body = String::with_capacity(ndigits * 4);
        for i in 0..ndigits {
            body.push_str(&format!("{:04}", read_u16(raw, 8 + i * 2)?));
        }

        // the decimal point sits after `weight + 1` groups
        let point = (weight + 1) * 4;
        let text = if point <= 0 {
            format!("0.{}{body}", "0".repeat(point.unsigned_abs() as usize))
        } else {
            let point = point.unsigned_abs() as usize;
            if body.len() < point {
                body.push_str(&"0".repeat(point - body.len()));
            }
            let (int, frac) = body.split_at(point);
            if frac.is_empty() {
                int.to_owned()
            } else {
                format!("{int}.{frac}")
            }
        };

        let value: f64 = if text.is_empty() { 0.0 } else { text.parse()? };
        Ok(PgNumeric(if sign == SIGN_NEGATIVE { -value } else { value }))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// Encode a plain decimal string (`-123.45`, `0.001`, `NaN`) as binary `NUMERIC`.
///
/// # Errors
/// Returns an error for anything that is not an optionally signed run of digits with at most one
/// decimal point.
pub fn encode_decimal(text: &str, out: &mut BytesMut) -> Result<(), BoxError> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("nan") {
        put_header(out, 0, 0, SIGN_NAN, 0);
        return Ok(());
    }

    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return Err(format!("invalid numeric literal {text:?}").into());
    }

    let dscale = u16::try_from(frac_part.len())?;
    let int_part = int_part.trim_start_matches('0');
    let int_pad = (4 - int_part.len() % 4) % 4;
    let frac_pad = (4 - frac_part.len() % 4) % 4;
    let digits = format!(
        "{}{int_part}{frac_part}{}",
        "0".repeat(int_pad),
        "0".repeat(frac_pad)
    );

    let mut groups: Vec<u16> = digits
        .as_bytes()
        .chunks(4)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'))
        })
        .collect();
    let mut weight = i16::try_from((int_part.len() + int_pad) / 4)? - 1;
    let leading = groups.iter().take_while(|g| **g == 0).count();
    groups.drain(..leading);
    weight -= i16::try_from(leading)?;
    while groups.last() == Some(&0) {
        groups.pop();
    }
    if groups.is_empty() {
        weight = 0;
    }

    let sign = if negative && !groups.is_empty() {
        SIGN_NEGATIVE
    } else {
        SIGN_POSITIVE
    };
    put_header(out, u16::try_from(groups.len())?, weight, sign, dscale);
    for group in groups {
        out.put_u16(group);
    }
    Ok(())
}

fn put_header(out: &mut BytesMut, ndigits: u16, weight: i16, sign: u16, dscale: u16) {
    out.put_u16(ndigits);
    out.put_i16(weight);
    out.put_u16(sign);
    out.put_u16(dscale);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(text: &str) -> f64 {
        let mut buf = BytesMut::new();
        encode_decimal(text, &mut buf).unwrap();
        PgNumeric::from_sql(&Type::NUMERIC, &buf).unwrap().0
    }

    #[test]
    fn encodes_known_layouts() {
        let mut buf = BytesMut::new();
        encode_decimal("123.45", &mut buf).unwrap();
        // ndigits 2, weight 0, positive, dscale 2, groups 123 and 4500
        assert_eq!(&buf[..], &[0, 2, 0, 0, 0, 0, 0, 2, 0, 123, 0x11, 0x94]);
    }

    #[test]
    fn decodes_through_the_wire_format() {
        assert_eq!(round_trip("-123.45"), -123.45);
        assert_eq!(round_trip("0.001"), 0.001);
        assert_eq!(round_trip("10000"), 10000.0);
        assert_eq!(round_trip("0"), 0.0);
        assert!(round_trip("NaN").is_nan());
    }

    #[test]
    fn rejects_garbage() {
        let mut buf = BytesMut::new();
        assert!(encode_decimal("1e5", &mut buf).is_err());
        assert!(encode_decimal(".", &mut buf).is_err());
    }
}
