use std::error::Error;

use chrono::{NaiveDate, TimeZone, Utc};
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use super::numeric::encode_decimal;
use crate::types::RowValues;

/// Borrowed Postgres parameters for one statement.
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    #[must_use]
    pub fn convert(params: &'a [RowValues]) -> Params<'a> {
        Params {
            references: params.iter().map(|p| p as &(dyn ToSql + Sync)).collect(),
        }
    }

    #[must_use]
    pub fn as_refs(&self) -> &[&(dyn ToSql + Sync)] {
        &self.references
    }
}

/// Values are encoded according to the parameter type the server inferred, so an `Int` can
/// bind to `int4`, `numeric`, or `float8` columns alike.
impl ToSql for RowValues {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            RowValues::Null => Ok(IsNull::Yes),
            RowValues::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                #[allow(clippy::cast_precision_loss)]
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                #[allow(clippy::cast_precision_loss)]
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                Type::NUMERIC => encode_decimal(&i.to_string(), out).map(|()| IsNull::No),
                Type::BOOL => (*i != 0).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                    i.to_string().to_sql(ty, out)
                }
                _ => i.to_sql(ty, out),
            },
            RowValues::Float(f) => match *ty {
                #[allow(clippy::cast_possible_truncation)]
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::NUMERIC => {
                    if f.is_nan() {
                        encode_decimal("NaN", out).map(|()| IsNull::No)
                    } else if f.is_finite() {
                        encode_decimal(&f.to_string(), out).map(|()| IsNull::No)
                    } else {
                        Err("infinite value cannot be bound to numeric".into())
                    }
                }
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                    f.to_string().to_sql(ty, out)
                }
                _ => f.to_sql(ty, out),
            },
            RowValues::Text(s) => match *ty {
                Type::NUMERIC => encode_decimal(s, out).map(|()| IsNull::No),
                Type::DATE => NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d")?
                    .to_sql(ty, out),
                Type::TIMESTAMP | Type::TIMESTAMPTZ => match self.as_timestamp() {
                    Some(dt) => RowValues::Timestamp(dt).to_sql(ty, out),
                    None => Err(format!("cannot read {s:?} as a timestamp").into()),
                },
                Type::JSON | Type::JSONB => {
                    serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out)
                }
                _ => s.to_sql(ty, out),
            },
            RowValues::Bool(b) => match *ty {
                Type::INT2 => i16::from(*b).to_sql(ty, out),
                Type::INT4 => i32::from(*b).to_sql(ty, out),
                Type::INT8 => i64::from(*b).to_sql(ty, out),
                _ => b.to_sql(ty, out),
            },
            RowValues::Timestamp(dt) => match *ty {
                Type::DATE => dt.date().to_sql(ty, out),
                Type::TIMESTAMPTZ => Utc.from_utc_datetime(dt).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => {
                    dt.format("%Y-%m-%d %H:%M:%S%.f").to_string().to_sql(ty, out)
                }
                _ => dt.to_sql(ty, out),
            },
            RowValues::JSON(jsval) => jsval.to_sql(ty, out),
            RowValues::Blob(bytes) => bytes.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::NUMERIC
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::UNKNOWN
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        )
    }

    to_sql_checked!();
}
