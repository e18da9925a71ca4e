//! x264 advanced option string (`-x name=value:name=value`).
//!
//! Names are canonicalized through a fixed alias table. An `AdvancedOptionSet`
//! only ever holds overrides: options equal to the encoder default are dropped.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Alias -> canonical name.
const ALIASES: &[(&str, &str)] = &[
    ("frameref", "ref"),
    ("subme", "subq"),
    ("me-range", "merange"),
    ("me_range", "merange"),
    ("weight-b", "weightb"),
    ("weight_b", "weightb"),
    ("b_pyramid", "b-pyramid"),
    ("b_adapt", "b-adapt"),
    ("mixed_refs", "mixed-refs"),
    ("direct-pred", "direct"),
    ("direct_pred", "direct"),
    ("filter", "deblock"),
    ("partitions", "analyse"),
    ("psy_rd", "psy-rd"),
    ("no_fast_pskip", "no-fast-pskip"),
    ("nofast_pskip", "no-fast-pskip"),
    ("no_dct_decimate", "no-dct-decimate"),
    ("nodct_decimate", "no-dct-decimate"),
];

/// Encoder defaults, keyed by canonical name.
const DEFAULTS: &[(&str, &str)] = &[
    ("ref", "3"),
    ("mixed-refs", "1"),
    ("bframes", "3"),
    ("direct", "spatial"),
    ("b-adapt", "1"),
    ("weightb", "1"),
    ("b-pyramid", "0"),
    ("me", "hex"),
    ("merange", "16"),
    ("subq", "7"),
    ("analyse", "some"),
    ("8x8dct", "1"),
    ("trellis", "1"),
    ("no-fast-pskip", "0"),
    ("no-dct-decimate", "0"),
    ("cabac", "1"),
];

pub const PSY_RD_DEFAULT: f64 = 1.0;
pub const PSY_TRELLIS_DEFAULT: f64 = 0.0;

/// Map an option name to its canonical spelling. Unknown names pass through.
pub fn canonicalize_name(raw: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == raw)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(raw)
}

/// Documented default for a canonical option name, if it has one.
pub fn default_value(name: &str) -> Option<&'static str> {
    DEFAULTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| *v)
}

fn split_segment(segment: &str) -> (&str, &str) {
    match segment.split_once('=') {
        Some((name, value)) => (name.trim(), value.trim()),
        None => (segment.trim(), "1"),
    }
}

/// Canonicalize every name in an option string, keeping the original order.
///
/// A bare `name` becomes `name=1`; segments with an empty name are dropped.
pub fn standardize(raw: &str) -> String {
    raw.split(':')
        .filter_map(|segment| {
            let (name, value) = split_segment(segment);
            let name = canonicalize_name(name);
            if name.is_empty() {
                None
            } else {
                Some(format!("{}={}", name, value))
            }
        })
        .collect::<Vec<_>>()
        .join(":")
}

/// One entry of the advanced option string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdvancedOption {
    NamedValue { name: String, value: String },
    /// `deblock=alpha,beta`
    Deblock { alpha: i32, beta: i32 },
    /// `psy-rd=rd,trellis`, one decimal place each
    PsyRd { rd: f64, trellis: f64 },
}

impl AdvancedOption {
    /// Build an option from a name/value pair. The name is canonicalized.
    pub fn from_pair(name: &str, value: &str) -> Self {
        let name = canonicalize_name(name.trim());
        let value = value.trim();
        match name {
            "deblock" => {
                if let Some((alpha, beta)) = parse_pair::<i32>(value) {
                    return AdvancedOption::Deblock { alpha, beta };
                }
            }
            "psy-rd" => {
                if let Some((rd, trellis)) = parse_pair::<f64>(value) {
                    return AdvancedOption::PsyRd { rd, trellis };
                }
            }
            _ => {}
        }
        AdvancedOption::NamedValue {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AdvancedOption::NamedValue { name, .. } => name,
            AdvancedOption::Deblock { .. } => "deblock",
            AdvancedOption::PsyRd { .. } => "psy-rd",
        }
    }

    pub fn value(&self) -> String {
        match self {
            AdvancedOption::NamedValue { value, .. } => value.clone(),
            AdvancedOption::Deblock { alpha, beta } => format!("{},{}", alpha, beta),
            AdvancedOption::PsyRd { rd, trellis } => format!("{:.1},{:.1}", rd, trellis),
        }
    }

    pub fn is_default(&self) -> bool {
        match self {
            AdvancedOption::NamedValue { name, value } => {
                default_value(name).is_some_and(|d| d == value.as_str())
            }
            AdvancedOption::Deblock { alpha, beta } => *alpha == 0 && *beta == 0,
            AdvancedOption::PsyRd { rd, trellis } => {
                format!("{:.1}", rd) == format!("{:.1}", PSY_RD_DEFAULT)
                    && format!("{:.1}", trellis) == format!("{:.1}", PSY_TRELLIS_DEFAULT)
            }
        }
    }
}

impl fmt::Display for AdvancedOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name(), self.value())
    }
}

fn parse_pair<T: std::str::FromStr>(value: &str) -> Option<(T, T)> {
    let (a, b) = value.split_once(',')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

/// Ordered set of non-default advanced options, one per canonical name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AdvancedOptionSet {
    options: Vec<AdvancedOption>,
}

impl AdvancedOptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an option string. Later duplicates overwrite earlier ones in place.
    pub fn parse(raw: &str) -> Self {
        let mut set = Self::new();
        for segment in raw.split(':') {
            let (name, value) = split_segment(segment);
            if canonicalize_name(name).is_empty() {
                continue;
            }
            set.insert(AdvancedOption::from_pair(name, value));
        }
        set
    }

    /// Store an option, or remove it when it equals the encoder default.
    pub fn insert(&mut self, option: AdvancedOption) {
        if option.is_default() {
            self.remove(option.name());
            return;
        }
        match self.options.iter_mut().find(|o| o.name() == option.name()) {
            Some(existing) => *existing = option,
            None => self.options.push(option),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<AdvancedOption> {
        let name = canonicalize_name(name);
        let idx = self.options.iter().position(|o| o.name() == name)?;
        Some(self.options.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<&AdvancedOption> {
        let name = canonicalize_name(name);
        self.options.iter().find(|o| o.name() == name)
    }

    pub fn value_of(&self, name: &str) -> Option<String> {
        self.get(name).map(AdvancedOption::value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AdvancedOption> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        self.options
            .iter()
            .map(|o| o.to_string())
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl From<String> for AdvancedOptionSet {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<AdvancedOptionSet> for String {
    fn from(set: AdvancedOptionSet) -> Self {
        set.to_query_string()
    }
}

impl fmt::Display for AdvancedOptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// A single widget edit on the advanced panel.
#[derive(Debug, Clone, PartialEq)]
pub enum X264Field {
    /// Plain option; `None` means the widget is back on "Default".
    Value { name: String, value: Option<String> },
    /// Deblock alpha/beta; `None` for either side means "Default".
    Deblock {
        alpha: Option<i32>,
        beta: Option<i32>,
    },
    /// Psy-RD strength and psy-trellis.
    PsyRd { rd: f64, trellis: f64 },
}

/// Apply one named change and return the updated set.
///
/// `None` (or the encoder default) removes the option. Other options keep
/// their values and relative order.
pub fn apply_field_change(
    current: &AdvancedOptionSet,
    field_name: &str,
    new_value: Option<&str>,
) -> AdvancedOptionSet {
    let mut next = current.clone();
    match new_value {
        Some(value) => next.insert(AdvancedOption::from_pair(field_name, value)),
        None => {
            next.remove(field_name);
        }
    }
    next
}

/// Typed variant of [`apply_field_change`] for composite widgets.
///
/// Deblock with only one side set writes the other side as literal `0`,
/// since the encoder expects both values together.
pub fn apply_widget_change(current: &AdvancedOptionSet, field: &X264Field) -> AdvancedOptionSet {
    match field {
        X264Field::Value { name, value } => apply_field_change(current, name, value.as_deref()),
        X264Field::Deblock { alpha, beta } => {
            let mut next = current.clone();
            match (alpha, beta) {
                (None, None) => {
                    next.remove("deblock");
                }
                _ => next.insert(AdvancedOption::Deblock {
                    alpha: alpha.unwrap_or(0),
                    beta: beta.unwrap_or(0),
                }),
            }
            next
        }
        X264Field::PsyRd { rd, trellis } => {
            let mut next = current.clone();
            next.insert(AdvancedOption::PsyRd {
                rd: *rd,
                trellis: *trellis,
            });
            next
        }
    }
}
