//! Inline helper registry.
//!
//! The registry is built once and only read afterwards, so a single
//! instance can serve concurrent renders without locking. Block helpers
//! (`if`, `each`, ...) are structural and live in the renderer; only the
//! value-producing helpers are registered here.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use mdc_core::{InlineHelper, Value};
use rust_decimal::prelude::ToPrimitive;
use time::macros::format_description;
use time::{Date, Duration};

use crate::clock::{Clock, SystemClock};

/// A pure helper function. Arguments arrive already resolved; missing
/// arguments read as `Null`.
pub type HelperFn = fn(&[Value], &dyn Clock) -> Value;

/// Rendered by `addDays` when the shifted date is out of range.
pub const INVALID_DATE: &str = "INVALID DATE";

/// Larger offsets cannot land inside the representable date range.
const MAX_DAY_OFFSET: u64 = 10_000_000;

pub struct HelperRegistry {
    helpers: BTreeMap<InlineHelper, HelperFn>,
    clock: Arc<dyn Clock>,
}

impl HelperRegistry {
    /// The built-in helpers, reading the system clock.
    pub fn builtin() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// The built-in helpers with an injected clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let mut helpers: BTreeMap<InlineHelper, HelperFn> = BTreeMap::new();
        helpers.insert(InlineHelper::Eq, eq);
        helpers.insert(InlineHelper::IsIn, is_in);
        helpers.insert(InlineHelper::AddDays, add_days);
        helpers.insert(InlineHelper::Lookup, lookup);
        HelperRegistry { helpers, clock }
    }

    /// Process-wide registry. Initialised on first use; later calls return
    /// the same instance.
    pub fn global() -> &'static HelperRegistry {
        static GLOBAL: OnceLock<HelperRegistry> = OnceLock::new();
        GLOBAL.get_or_init(HelperRegistry::builtin)
    }

    pub fn call(&self, helper: InlineHelper, args: &[Value]) -> Value {
        match self.helpers.get(&helper) {
            Some(f) => f(args, self.clock.as_ref()),
            None => Value::Null,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperRegistry")
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .field("clock", &self.clock)
            .finish()
    }
}

fn arg(args: &[Value], i: usize) -> &Value {
    static NULL: Value = Value::Null;
    args.get(i).unwrap_or(&NULL)
}

// ──────────────────────────────────────────────
// Built-in helpers
// ──────────────────────────────────────────────

/// Structural equality: same tag and same content.
fn eq(args: &[Value], _: &dyn Clock) -> Value {
    Value::Bool(arg(args, 0) == arg(args, 1))
}

/// Whether the first argument is a list containing the second.
fn is_in(args: &[Value], _: &dyn Clock) -> Value {
    match arg(args, 0) {
        Value::List(items) => Value::Bool(items.contains(arg(args, 1))),
        _ => Value::Bool(false),
    }
}

/// `map[key]`, or `Null` when absent or when the first argument is not a map.
fn lookup(args: &[Value], _: &dyn Clock) -> Value {
    let key = match arg(args, 1) {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.normalize().to_string(),
        _ => return Value::Null,
    };
    match arg(args, 0) {
        Value::Map(fields) => fields.get(&key).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Shifts a date by a number of days and formats it as `DD/MMM/YYYY`.
/// An unparseable date falls back to today.
fn add_days(args: &[Value], clock: &dyn Clock) -> Value {
    let base = match arg(args, 0) {
        Value::String(s) => parse_date(s),
        _ => None,
    }
    .unwrap_or_else(|| clock.today());

    let shifted = day_offset(arg(args, 1))
        .filter(|days| days.unsigned_abs() <= MAX_DAY_OFFSET)
        .and_then(|days| base.checked_add(Duration::days(days)));

    match shifted.and_then(format_date) {
        Some(text) => Value::String(text),
        None => Value::String(INVALID_DATE.to_owned()),
    }
}

/// Numbers truncate toward zero, integer strings parse, anything else is 0.
/// `None` means the offset itself is unrepresentable.
fn day_offset(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.trunc().to_i64(),
        Value::String(s) => Some(s.trim().parse::<i64>().unwrap_or(0)),
        _ => Some(0),
    }
}

/// Accepts `YYYY-MM-DD`, an ISO datetime (date prefix), or `DD/MMM/YYYY`.
pub fn parse_date(s: &str) -> Option<Date> {
    let s = s.trim();
    let iso = format_description!("[year]-[month]-[day]");
    if let Some(prefix) = s.get(..10) {
        let rest = &s[10..];
        if rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ') {
            if let Ok(d) = Date::parse(prefix, iso) {
                return Some(d);
            }
        }
    }
    let display = format_description!("[day]/[month repr:short case_sensitive:false]/[year]");
    Date::parse(s, display).ok()
}

/// `07/JUN/2025`
pub fn format_date(d: Date) -> Option<String> {
    let display = format_description!("[day]/[month repr:short]/[year]");
    d.format(display).ok().map(|s| s.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use time::macros::date;

    fn registry() -> HelperRegistry {
        HelperRegistry::with_clock(Arc::new(FixedClock(date!(2025 - 06 - 07))))
    }

    fn call(helper: InlineHelper, args: Vec<Value>) -> Value {
        registry().call(helper, &args)
    }

    #[test]
    fn eq_is_structural() {
        assert_eq!(call(InlineHelper::Eq, vec!["a".into(), "a".into()]), Value::Bool(true));
        assert_eq!(call(InlineHelper::Eq, vec!["1".into(), 1.into()]), Value::Bool(false));
        assert_eq!(call(InlineHelper::Eq, vec![Value::Null, Value::Null]), Value::Bool(true));
        assert_eq!(call(InlineHelper::Eq, vec![]), Value::Bool(true));
        assert_eq!(
            call(
                InlineHelper::Eq,
                vec![Value::List(vec![1.into()]), Value::List(vec![1.into()])]
            ),
            Value::Bool(true)
        );
    }

    #[test]
    fn is_in_requires_a_list() {
        let list = Value::List(vec!["LSPD".into(), "BCSO".into()]);
        assert_eq!(call(InlineHelper::IsIn, vec![list.clone(), "BCSO".into()]), Value::Bool(true));
        assert_eq!(call(InlineHelper::IsIn, vec![list, "SAHP".into()]), Value::Bool(false));
        assert_eq!(
            call(InlineHelper::IsIn, vec!["LSPD".into(), "LSPD".into()]),
            Value::Bool(false)
        );
    }

    #[test]
    fn lookup_reads_maps_only() {
        let map = Value::map([("date", Value::from("2025-01-01")), ("2", Value::from("two"))]);
        assert_eq!(call(InlineHelper::Lookup, vec![map.clone(), "date".into()]), Value::from("2025-01-01"));
        assert_eq!(call(InlineHelper::Lookup, vec![map.clone(), 2.into()]), Value::from("two"));
        assert_eq!(call(InlineHelper::Lookup, vec![map, "missing".into()]), Value::Null);
        assert_eq!(
            call(InlineHelper::Lookup, vec![Value::List(vec!["x".into()]), 0.into()]),
            Value::Null
        );
    }

    #[test]
    fn add_days_formats_upper_case_month() {
        assert_eq!(call(InlineHelper::AddDays, vec!["2025-01-01".into(), 5.into()]), Value::from("06/JAN/2025"));
        assert_eq!(call(InlineHelper::AddDays, vec!["2025-03-01".into(), (-1).into()]), Value::from("28/FEB/2025"));
        assert_eq!(call(InlineHelper::AddDays, vec!["2024-12-31T23:00:00Z".into(), 1.into()]), Value::from("01/JAN/2025"));
        assert_eq!(call(InlineHelper::AddDays, vec!["07/jun/2025".into(), "3".into()]), Value::from("10/JUN/2025"));
    }

    #[test]
    fn add_days_falls_back_to_today() {
        assert_eq!(call(InlineHelper::AddDays, vec!["not-a-date".into(), 5.into()]), Value::from("12/JUN/2025"));
        assert_eq!(call(InlineHelper::AddDays, vec![Value::Null, Value::Null]), Value::from("07/JUN/2025"));
    }

    #[test]
    fn add_days_truncates_fractional_days() {
        let half = Value::Number("2.9".parse().unwrap());
        assert_eq!(call(InlineHelper::AddDays, vec!["2025-01-01".into(), half]), Value::from("03/JAN/2025"));
    }

    #[test]
    fn add_days_out_of_range_is_invalid() {
        assert_eq!(
            call(InlineHelper::AddDays, vec!["9999-12-31".into(), 1.into()]),
            Value::from(INVALID_DATE)
        );
        assert_eq!(
            call(InlineHelper::AddDays, vec!["2025-01-01".into(), Value::from(i64::MAX)]),
            Value::from(INVALID_DATE)
        );
    }

    #[test]
    fn global_registry_is_initialised_once() {
        let a = HelperRegistry::global() as *const HelperRegistry;
        let b = HelperRegistry::global() as *const HelperRegistry;
        assert_eq!(a, b);
    }
}
