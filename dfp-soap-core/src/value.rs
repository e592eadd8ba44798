//! Tagged values.
//!
//! The API carries bind variables and PQL result cells as an abstract
//! `Value` type whose concrete subtype is named by `xsi:type`. [`Value`]
//! models that closed set as a Rust enum.

use std::fmt;

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::element::Element;
use crate::error::ValueError;

/// Discriminant of a [`Value`], named after its wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Number,
    Boolean,
    Date,
    DateTime,
    Set,
}

impl ValueKind {
    /// The `xsi:type` name of this kind.
    pub fn xsi_type(&self) -> &'static str {
        match self {
            Self::Text => "TextValue",
            Self::Number => "NumberValue",
            Self::Boolean => "BooleanValue",
            Self::Date => "DateValue",
            Self::DateTime => "DateTimeValue",
            Self::Set => "SetValue",
        }
    }

    pub fn from_xsi_type(name: &str) -> Option<Self> {
        // Some responses qualify the type with a namespace prefix.
        let name = name.rsplit_once(':').map_or(name, |(_, local)| local);
        match name {
            "TextValue" => Some(Self::Text),
            "NumberValue" => Some(Self::Number),
            "BooleanValue" => Some(Self::Boolean),
            "DateValue" => Some(Self::Date),
            "DateTimeValue" => Some(Self::DateTime),
            "SetValue" => Some(Self::Set),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.xsi_type())
    }
}

/// A calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl Date {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Validate the components as a calendar date.
    pub fn to_naive(&self) -> Result<NaiveDate, ValueError> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or(ValueError::InvalidDate {
            year: self.year,
            month: self.month,
            day: self.day,
        })
    }

    /// Encode as a `Date` structure named `name`: `year`, `month`, `day`.
    ///
    /// This is the plain form used for fields such as `endDate`; inside a
    /// bind variable the date is wrapped by [`Value::to_element`].
    pub fn to_element(&self, name: &str) -> Element {
        Element::new(name)
            .with_child(Element::text_element("year", self.year.to_string()))
            .with_child(Element::text_element("month", self.month.to_string()))
            .with_child(Element::text_element("day", self.day.to_string()))
    }

    fn from_element(element: &Element, kind: ValueKind) -> Result<Self, ValueError> {
        Ok(Self {
            year: parse_component(element, "year", kind)?,
            month: parse_component(element, "month", kind)?,
            day: parse_component(element, "day", kind)?,
        })
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month(), date.day())
    }
}

/// A wall-clock time in a named IANA time zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTime {
    pub date: Date,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub time_zone_id: String,
}

impl DateTime {
    pub fn new<S: Into<String>>(date: Date, hour: u32, minute: u32, second: u32, time_zone_id: S) -> Self {
        Self {
            date,
            hour,
            minute,
            second,
            time_zone_id: time_zone_id.into(),
        }
    }

    /// Attach `time_zone_id` to a wall-clock time, rejecting ids that are
    /// not in the IANA database.
    pub fn in_zone(naive: NaiveDateTime, time_zone_id: &str) -> Result<Self, ValueError> {
        let tz: Tz = time_zone_id
            .parse()
            .map_err(|_| ValueError::UnknownTimeZone(time_zone_id.to_string()))?;
        Ok(Self::from(tz.from_local_datetime(&naive).latest().ok_or_else(|| {
            ValueError::NonexistentLocalTime(naive.to_string(), time_zone_id.to_string())
        })?))
    }

    /// Encode as a `DateTime` structure named `name`: `date`, `hour`,
    /// `minute`, `second`, `timeZoneId`.
    pub fn to_element(&self, name: &str) -> Element {
        Element::new(name)
            .with_child(self.date.to_element("date"))
            .with_child(Element::text_element("hour", self.hour.to_string()))
            .with_child(Element::text_element("minute", self.minute.to_string()))
            .with_child(Element::text_element("second", self.second.to_string()))
            .with_child(Element::text_element("timeZoneId", self.time_zone_id.as_str()))
    }

    /// Resolve the wall-clock time in its zone.
    ///
    /// A time repeated by a daylight-saving transition resolves to the later
    /// of the two instants; a skipped time is an error.
    pub fn localize(&self) -> Result<chrono::DateTime<Tz>, ValueError> {
        let tz: Tz = self
            .time_zone_id
            .parse()
            .map_err(|_| ValueError::UnknownTimeZone(self.time_zone_id.clone()))?;
        let naive = self
            .date
            .to_naive()?
            .and_hms_opt(self.hour, self.minute, self.second)
            .ok_or_else(|| ValueError::Malformed {
                kind: ValueKind::DateTime,
                reason: format!(
                    "invalid time {:02}:{:02}:{:02}",
                    self.hour, self.minute, self.second
                ),
            })?;
        tz.from_local_datetime(&naive)
            .latest()
            .ok_or_else(|| ValueError::NonexistentLocalTime(naive.to_string(), self.time_zone_id.clone()))
    }
}

impl From<chrono::DateTime<Tz>> for DateTime {
    fn from(value: chrono::DateTime<Tz>) -> Self {
        Self {
            date: value.date_naive().into(),
            hour: value.hour(),
            minute: value.minute(),
            second: value.second(),
            time_zone_id: value.timezone().name().to_string(),
        }
    }
}

/// Only a zero offset maps to a zone (`UTC`); any other fixed offset does
/// not name an IANA zone and is rejected.
impl TryFrom<chrono::DateTime<FixedOffset>> for DateTime {
    type Error = ValueError;

    fn try_from(value: chrono::DateTime<FixedOffset>) -> Result<Self, Self::Error> {
        if value.offset().local_minus_utc() != 0 {
            return Err(ValueError::ZoneUnaware(value.to_rfc3339()));
        }
        Ok(Self::from(value.with_timezone(&Tz::UTC)))
    }
}

/// A tagged value as carried by bind variables and PQL result rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    /// Decimal text exactly as it travels on the wire.
    Number(String),
    Boolean(bool),
    Date(Date),
    DateTime(DateTime),
    Set(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Text(_) => ValueKind::Text,
            Value::Number(_) => ValueKind::Number,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Set(_) => ValueKind::Set,
        }
    }

    /// Build a SetValue, rejecting elements of mixed kinds.
    pub fn set<I, V>(items: I) -> Result<Value, ValueError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        ensure_homogeneous(&items)?;
        Ok(Value::Set(items))
    }

    /// Encode as an element named `name` tagged with `xsi:type`.
    pub fn to_element(&self, name: &str) -> Element {
        let element = Element::new(name).with_attribute("xsi:type", self.kind().xsi_type());
        match self {
            Value::Text(text) | Value::Number(text) => {
                element.with_child(Element::text_element("value", text.as_str()))
            }
            Value::Boolean(b) => element.with_child(Element::text_element("value", b.to_string())),
            Value::Date(date) => element.with_child(date.to_element("value")),
            Value::DateTime(dt) => element.with_child(dt.to_element("value")),
            Value::Set(items) => element.with_children(items.iter().map(|v| v.to_element("values"))),
        }
    }

    /// Decode a tagged value element.
    ///
    /// Returns `Ok(None)` when the element names a type but carries no
    /// value, which is how the server reports a null cell. Set elements are
    /// not checked for homogeneity here.
    pub fn from_element(element: &Element) -> Result<Option<Value>, ValueError> {
        let type_name = element.attribute("type").unwrap_or_default();
        let kind = ValueKind::from_xsi_type(type_name)
            .ok_or_else(|| ValueError::UnknownType(type_name.to_string()))?;

        if kind == ValueKind::Set {
            return Ok(Some(Value::Set(decode_set(element)?)));
        }

        let Some(inner) = element.child("value") else {
            return Ok(None);
        };
        let text = inner.text().unwrap_or_default();
        let value = match kind {
            ValueKind::Text => Value::Text(text.to_string()),
            ValueKind::Number => Value::Number(text.trim().to_string()),
            ValueKind::Boolean => match text.trim() {
                "true" | "1" => Value::Boolean(true),
                "false" | "0" => Value::Boolean(false),
                other => {
                    return Err(ValueError::Malformed {
                        kind,
                        reason: format!("not a boolean: {other:?}"),
                    });
                }
            },
            ValueKind::Date => Value::Date(Date::from_element(inner, kind)?),
            ValueKind::DateTime => {
                let date = inner.child("date").ok_or_else(|| ValueError::Malformed {
                    kind,
                    reason: "missing date".into(),
                })?;
                let time_zone_id = inner
                    .child_text("timeZoneId")
                    .or_else(|| inner.child_text("timeZoneID"))
                    .ok_or_else(|| ValueError::Malformed {
                        kind,
                        reason: "missing timeZoneId".into(),
                    })?;
                Value::DateTime(DateTime {
                    date: Date::from_element(date, kind)?,
                    hour: parse_component(inner, "hour", kind)?,
                    minute: parse_component(inner, "minute", kind)?,
                    second: parse_component(inner, "second", kind)?,
                    time_zone_id: time_zone_id.trim().to_string(),
                })
            }
            ValueKind::Set => Value::Set(decode_set(element)?),
        };
        Ok(Some(value))
    }
}

fn decode_set(element: &Element) -> Result<Vec<Value>, ValueError> {
    let mut items = Vec::new();
    for child in element.children_named("values") {
        if let Some(value) = Value::from_element(child)? {
            items.push(value);
        }
    }
    Ok(items)
}

/// Check that every element of a set has the kind of the first.
pub fn ensure_homogeneous(items: &[Value]) -> Result<(), ValueError> {
    let Some(first) = items.first() else {
        return Ok(());
    };
    let expected = first.kind();
    match items.iter().map(Value::kind).find(|kind| *kind != expected) {
        Some(found) => Err(ValueError::HeterogeneousSetValue { expected, found }),
        None => Ok(()),
    }
}

fn parse_component<T: std::str::FromStr>(
    element: &Element,
    name: &str,
    kind: ValueKind,
) -> Result<T, ValueError> {
    let text = element.child_text(name).ok_or_else(|| ValueError::Malformed {
        kind,
        reason: format!("missing {name}"),
    })?;
    text.trim().parse().map_err(|_| ValueError::Malformed {
        kind,
        reason: format!("invalid {name}: {text:?}"),
    })
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(value.to_string())
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, f32, f64);

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value.into())
    }
}

impl From<DateTime> for Value {
    fn from(value: DateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<chrono::DateTime<Tz>> for Value {
    fn from(value: chrono::DateTime<Tz>) -> Self {
        Value::DateTime(value.into())
    }
}

/// A named bind variable, referenced in a query as `:key`.
#[derive(Debug, Clone, PartialEq)]
pub struct BindVariable {
    pub key: String,
    pub value: Value,
}

impl BindVariable {
    pub fn new<K: Into<String>, V: Into<Value>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Encode as a `String_ValueMapEntry` element.
    pub fn to_element(&self, name: &str) -> Element {
        Element::new(name)
            .with_child(Element::text_element("key", self.key.as_str()))
            .with_child(self.value.to_element("value"))
    }
}
