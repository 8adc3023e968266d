// Text exports: AT&T tables, JSON dictionary form, JavaScript literal.
//
// All exports number states breadth-first from the initial state, visiting
// transitions by label then weight, so output is stable for an unchanged
// graph. Only `Display` keeps unreachable states.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use hashbrown::HashMap;
use lexfst_core::{Label, Weight};
use serde::{Deserialize, Serialize};

use crate::fst::Fst;
use crate::state::StateId;

/// Epsilon spelling used by foma and by [`Fst`]'s `Display`.
pub const ATT_EPSILON: &str = "@0@";

/// First alphabet code in [`FstDict`]; 0, 1 and 2 are reserved.
const FIRST_SYMBOL_CODE: usize = 3;

/// Weight in the shortest form that reads back exactly, always with a
/// decimal point for whole numbers (`2.0`, `0.5`, `inf`).
pub fn format_weight(weight: Weight) -> String {
    if weight.is_infinite() {
        return if weight > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if weight.fract() == 0.0 && weight.abs() < 1e16 {
        format!("{weight:.1}")
    } else {
        format!("{weight}")
    }
}

/// State numbering shared by the exporters.
struct Numbering {
    order: Vec<StateId>,
    number: Vec<Option<usize>>,
}

impl Numbering {
    fn canonical(fst: &Fst) -> Self {
        Self::from_order(fst, fst.canonical_order())
    }

    /// Canonical order followed by unreachable states in arena order.
    fn complete(fst: &Fst) -> Self {
        let mut order = fst.canonical_order();
        let mut reached = vec![false; fst.num_states()];
        for id in &order {
            reached[id.index()] = true;
        }
        order.extend(fst.state_ids().filter(|id| !reached[id.index()]));
        Self::from_order(fst, order)
    }

    fn from_order(fst: &Fst, order: Vec<StateId>) -> Self {
        let mut number = vec![None; fst.num_states()];
        for (n, id) in order.iter().enumerate() {
            number[id.index()] = Some(n);
        }
        Self { order, number }
    }

    fn of(&self, id: StateId) -> usize {
        // Targets of numbered states are numbered.
        self.number[id.index()].unwrap_or_default()
    }
}

/// Symbol table assigning codes in order of first appearance.
#[derive(Debug, Default)]
struct SymbolTable {
    symbols: Vec<String>,
    codes: HashMap<String, usize>,
}

impl SymbolTable {
    fn with_epsilon(epsilon: &str) -> Self {
        let mut table = Self::default();
        table.code(epsilon);
        table
    }

    fn code(&mut self, symbol: &str) -> usize {
        if let Some(&code) = self.codes.get(symbol) {
            return code;
        }
        let code = self.symbols.len();
        self.symbols.push(symbol.to_string());
        self.codes.insert(symbol.to_string(), code);
        code
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for (code, symbol) in self.symbols.iter().enumerate() {
            let _ = writeln!(out, "{symbol}\t{code}");
        }
        out
    }
}

/// AT&T export: transition text plus symbol tables.
///
/// Each table line is `symbol<TAB>code`; epsilon always has code 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttText {
    pub transitions: String,
    pub isyms: String,
    pub osyms: String,
    /// State symbol table, present when state names were kept.
    pub ssyms: Option<String>,
}

/// JSON-ready form of an automaton.
///
/// Transition keys are the input symbol, or `input|output` for pairs; a
/// `|` inside a symbol is written `\|`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FstDict {
    pub transitions: BTreeMap<usize, BTreeMap<String, Vec<usize>>>,
    pub alphabet: BTreeMap<String, usize>,
    pub finals: BTreeMap<usize, u8>,
}

/// Network literal read by foma's `foma_apply_down.js`.
#[derive(Debug, Serialize)]
struct JsNet {
    s: BTreeMap<String, usize>,
    maxlen: usize,
    f: BTreeMap<usize, u8>,
    t: JsArcs,
}

/// Arcs keyed by (state, input), written as `"state|input"` keys in
/// numeric state order.
#[derive(Debug, Default)]
struct JsArcs(BTreeMap<(usize, String), Vec<BTreeMap<usize, String>>>);

impl Serialize for JsArcs {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for ((src, input), arcs) in &self.0 {
            map.serialize_entry(&format!("{src}|{input}"), arcs)?;
        }
        map.end()
    }
}

fn att_symbol<'a>(symbol: &'a str, epsilon: &'a str) -> &'a str {
    if symbol.is_empty() { epsilon } else { symbol }
}

fn escape_bar(symbol: &str) -> String {
    symbol.replace('|', "\\|")
}

fn dict_label(label: &Label) -> String {
    let (input, output) = (escape_bar(label.input()), escape_bar(label.output()));
    if input == output {
        input
    } else {
        format!("{input}|{output}")
    }
}

impl Fst {
    /// AT&T tab-separated text with input and output symbol tables.
    ///
    /// States are numbered canonically; with `state_symbols`, named states
    /// keep their names and a state table is produced. Transition weights
    /// and final weights are written only when non-zero.
    pub fn to_att(&self, epsilon: &str, state_symbols: bool) -> AttText {
        let numbering = Numbering::canonical(self);
        let names: Vec<String> = numbering
            .order
            .iter()
            .enumerate()
            .map(|(n, &id)| match self.state(id).name() {
                Some(name) if state_symbols => name.to_string(),
                _ => n.to_string(),
            })
            .collect();

        let mut isyms = SymbolTable::with_epsilon(epsilon);
        let mut osyms = SymbolTable::with_epsilon(epsilon);

        let mut transitions = String::new();
        for (n, &id) in numbering.order.iter().enumerate() {
            let state = self.state(id);
            for t in state.sorted_transitions() {
                let isym = att_symbol(t.label.input(), epsilon);
                let osym = att_symbol(t.label.output(), epsilon);
                isyms.code(isym);
                osyms.code(osym);
                let target = &names[numbering.of(t.target)];
                let _ = write!(transitions, "{}\t{target}\t{isym}\t{osym}", names[n]);
                if t.weight != 0.0 {
                    let _ = write!(transitions, "\t{}", format_weight(t.weight));
                }
                transitions.push('\n');
            }
            if state.is_final() {
                transitions.push_str(&names[n]);
                if state.final_weight() != 0.0 {
                    let _ = write!(transitions, "\t{}", format_weight(state.final_weight()));
                }
                transitions.push('\n');
            }
        }

        let ssyms = state_symbols.then(|| {
            let mut out = String::new();
            for (n, name) in names.iter().enumerate() {
                let _ = writeln!(out, "{name}\t{n}");
            }
            out
        });
        AttText {
            transitions,
            isyms: isyms.render(),
            osyms: osyms.render(),
            ssyms,
        }
    }

    /// Dictionary form for JSON export. Weights are not included.
    pub fn to_dict(&self) -> FstDict {
        let numbering = Numbering::canonical(self);
        let mut dict = FstDict {
            transitions: BTreeMap::new(),
            alphabet: BTreeMap::new(),
            finals: BTreeMap::new(),
        };
        let mut discovered = 0usize;
        for (src, &id) in numbering.order.iter().enumerate() {
            let state = self.state(id);
            for t in state.sorted_transitions() {
                for symbol in t.label.symbols().iter().filter(|s| !s.is_empty()) {
                    if !dict.alphabet.contains_key(symbol) {
                        dict.alphabet.insert(symbol.clone(), FIRST_SYMBOL_CODE + discovered);
                        discovered += 1;
                    }
                }
                dict.transitions
                    .entry(src)
                    .or_default()
                    .entry(dict_label(&t.label))
                    .or_default()
                    .push(numbering.of(t.target));
            }
            if state.is_final() {
                dict.finals.insert(src, 1);
            }
        }
        dict
    }

    /// JavaScript statement `var NAME = {...} ;` defining the network for
    /// foma's browser-side apply.
    pub fn to_js(&self, name: &str) -> String {
        let numbering = Numbering::canonical(self);
        let dict = self.to_dict();
        let mut t = JsArcs::default();
        for (src, &id) in numbering.order.iter().enumerate() {
            for arc in self.state(id).sorted_transitions() {
                t.0.entry((src, arc.label.input().to_string()))
                    .or_default()
                    .push(BTreeMap::from([(
                        numbering.of(arc.target),
                        arc.label.output().to_string(),
                    )]));
            }
        }
        let maxlen = dict
            .alphabet
            .keys()
            .map(|symbol| symbol.encode_utf16().count())
            .max()
            .unwrap_or(0);
        let net = JsNet {
            s: dict.alphabet,
            maxlen,
            f: dict.finals,
            t,
        };
        // Maps with string or integer keys always serialize.
        let json = serde_json::to_string(&net).unwrap_or_default();
        format!("var {name} = {json} ;")
    }
}

/// AT&T text with `@0@` for epsilon and every weight written out. States
/// are numbered canonically; unreachable states follow the reachable ones.
impl fmt::Display for Fst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numbering = Numbering::complete(self);
        for (n, &id) in numbering.order.iter().enumerate() {
            for t in self.state(id).sorted_transitions() {
                writeln!(
                    f,
                    "{n}\t{}\t{}\t{}\t{}",
                    numbering.of(t.target),
                    att_symbol(t.label.input(), ATT_EPSILON),
                    att_symbol(t.label.output(), ATT_EPSILON),
                    format_weight(t.weight)
                )?;
            }
        }
        for (n, &id) in numbering.order.iter().enumerate() {
            let state = self.state(id);
            if state.is_final() {
                writeln!(f, "{n}\t{}", format_weight(state.final_weight()))?;
            }
        }
        Ok(())
    }
}
