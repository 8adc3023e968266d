// Flag diacritics: P, N, R, D, C, U
//
// Flags are symbols of the form `@OP.FEATURE@` or `@OP.FEATURE.VALUE@`.
// They consume nothing during apply; a finished path is accepted only if
// its flags are consistent when read left to right.

use crate::FstError;
use hashbrown::{HashMap, HashSet};

/// Flag diacritic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagOp {
    /// Positive set: feature becomes `+VALUE`.
    P,
    /// Negative set: feature becomes `-VALUE`.
    N,
    /// Require: feature is `+VALUE`, or with no value, set at all.
    R,
    /// Disallow: feature is not `+VALUE`, or with no value, unset.
    D,
    /// Clear: reset feature to neutral.
    C,
    /// Unification: set if neutral or negated to another value, pass if equal.
    U,
}

impl FlagOp {
    fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            b'P' => FlagOp::P,
            b'N' => FlagOp::N,
            b'R' => FlagOp::R,
            b'D' => FlagOp::D,
            b'C' => FlagOp::C,
            b'U' => FlagOp::U,
            _ => return None,
        })
    }

    fn requires_value(self) -> bool {
        matches!(self, FlagOp::P | FlagOp::N | FlagOp::U)
    }
}

/// Current setting of one feature. Values are interned indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagValue {
    #[default]
    Neutral,
    Positive(u16),
    Negative(u16),
}

/// A parsed flag diacritic with interned feature and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpFeatureValue {
    pub op: FlagOp,
    pub feature: u16,
    /// `None` for the value-less forms (`@C.F@`, `@R.F@`, `@D.F@`).
    pub value: Option<u16>,
}

/// Result of checking one flag against the current feature setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagCheckResult {
    /// Constraint violated.
    Reject,
    /// Allowed; the feature takes the given value.
    AcceptAndUpdate { feature: u16, value: FlagValue },
    /// Allowed; no change.
    AcceptNoUpdate { feature: u16 },
}

/// Check one flag against the feature's current value.
///
/// The caller applies the update carried by the result.
pub fn check_flag(ofv: &OpFeatureValue, current: FlagValue) -> FlagCheckResult {
    use FlagCheckResult::{AcceptAndUpdate, AcceptNoUpdate, Reject};
    let feature = ofv.feature;
    let update = |value| AcceptAndUpdate { feature, value };
    let pass = |ok: bool| if ok { AcceptNoUpdate { feature } } else { Reject };

    match (ofv.op, ofv.value) {
        (FlagOp::P, Some(v)) => update(FlagValue::Positive(v)),
        (FlagOp::N, Some(v)) => update(FlagValue::Negative(v)),
        (FlagOp::C, _) => update(FlagValue::Neutral),
        (FlagOp::R, Some(v)) => pass(current == FlagValue::Positive(v)),
        (FlagOp::R, None) => pass(current != FlagValue::Neutral),
        (FlagOp::D, Some(v)) => pass(current != FlagValue::Positive(v)),
        (FlagOp::D, None) => pass(current == FlagValue::Neutral),
        (FlagOp::U, Some(v)) => match current {
            FlagValue::Neutral => update(FlagValue::Positive(v)),
            FlagValue::Positive(w) => pass(w == v),
            FlagValue::Negative(w) if w == v => Reject,
            FlagValue::Negative(_) => update(FlagValue::Positive(v)),
        },
        // Value-requiring ops are never built without a value.
        (FlagOp::P | FlagOp::N | FlagOp::U, None) => Reject,
    }
}

/// Split a flag symbol into its parts without allocating.
fn parse_parts(symbol: &str) -> Option<(FlagOp, &str, Option<&str>)> {
    let bytes = symbol.as_bytes();
    if bytes.len() < 5 || bytes[0] != b'@' || bytes[2] != b'.' || bytes[bytes.len() - 1] != b'@' {
        return None;
    }
    let op = FlagOp::from_byte(bytes[1])?;
    let inner = &symbol[3..symbol.len() - 1];
    let (feature, value) = match inner.split_once('.') {
        Some((feature, value)) => (feature, Some(value)),
        None => (inner, None),
    };
    let well_formed = |part: &str| !part.is_empty() && !part.contains('@');
    if !well_formed(feature) || !value.is_none_or(well_formed) {
        return None;
    }
    Some((op, feature, value))
}

/// Whether `symbol` is syntactically a flag diacritic.
pub fn is_flag(symbol: &str) -> bool {
    parse_parts(symbol).is_some_and(|(op, _, value)| value.is_some() || !op.requires_value())
}

/// Drop flag diacritics from a symbol sequence.
pub fn filter_flags(symbols: Vec<String>) -> Vec<String> {
    symbols.into_iter().filter(|s| !is_flag(s)).collect()
}

/// Interns feature and value names as they are first seen.
#[derive(Debug, Clone, Default)]
pub struct FlagDiacriticParser {
    features: HashMap<String, u16>,
    values: HashMap<String, u16>,
}

impl FlagDiacriticParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct features seen so far.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Parse `@OP.FEATURE@` or `@OP.FEATURE.VALUE@`.
    pub fn parse(&mut self, symbol: &str) -> Result<OpFeatureValue, FstError> {
        let (op, feature, value) = parse_parts(symbol)
            .ok_or_else(|| FstError::InvalidFlagDiacritic(format!("malformed symbol {symbol:?}")))?;
        if op.requires_value() && value.is_none() {
            return Err(FstError::InvalidFlagDiacritic(format!(
                "operation {op:?} needs a value in {symbol:?}"
            )));
        }
        let feature = intern(&mut self.features, feature)?;
        let value = value.map(|v| intern(&mut self.values, v)).transpose()?;
        Ok(OpFeatureValue { op, feature, value })
    }
}

fn intern(table: &mut HashMap<String, u16>, name: &str) -> Result<u16, FstError> {
    if let Some(&index) = table.get(name) {
        return Ok(index);
    }
    let index = u16::try_from(table.len()).map_err(|_| {
        FstError::InvalidFlagDiacritic(format!(
            "too many distinct names, cannot intern {name:?}"
        ))
    })?;
    table.insert(name.to_string(), index);
    Ok(index)
}

/// Consistency predicate over finished symbol sequences.
///
/// Flags from the alphabet are parsed up front; flags met only on
/// transitions are parsed on first use.
#[derive(Debug, Clone, Default)]
pub struct FlagStringFilter {
    parser: FlagDiacriticParser,
    parsed: HashMap<String, OpFeatureValue>,
}

impl FlagStringFilter {
    pub fn new(alphabet: &HashSet<String>) -> Self {
        let mut filter = Self::default();
        for symbol in alphabet.iter().filter(|s| is_flag(s)) {
            filter.lookup(symbol);
        }
        filter
    }

    fn lookup(&mut self, symbol: &str) -> Option<OpFeatureValue> {
        if let Some(&ofv) = self.parsed.get(symbol) {
            return Some(ofv);
        }
        let ofv = self.parser.parse(symbol).ok()?;
        self.parsed.insert(symbol.to_string(), ofv);
        Some(ofv)
    }

    /// Whether the flags in `symbols` are consistent, starting from all
    /// features neutral. Symbols that are not flags are ignored.
    pub fn accepts<S: AsRef<str>>(&mut self, symbols: &[S]) -> bool {
        let mut values: Vec<FlagValue> = vec![FlagValue::Neutral; self.parser.feature_count()];
        for symbol in symbols.iter().map(|s| s.as_ref()) {
            if !is_flag(symbol) {
                continue;
            }
            let Some(ofv) = self.lookup(symbol) else {
                continue;
            };
            let slot = ofv.feature as usize;
            if slot >= values.len() {
                values.resize(slot + 1, FlagValue::Neutral);
            }
            match check_flag(&ofv, values[slot]) {
                FlagCheckResult::Reject => return false,
                FlagCheckResult::AcceptAndUpdate { value, .. } => values[slot] = value,
                FlagCheckResult::AcceptNoUpdate { .. } => {}
            }
        }
        true
    }
}
