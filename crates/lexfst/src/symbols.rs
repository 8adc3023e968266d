// Tokenization: input strings against an alphabet, lexicon sides into symbols.

use hashbrown::HashSet;
use lexfst_core::EPSILON;

use crate::fst::Fst;

impl Fst {
    /// Split `word` into symbols of this automaton's alphabet, longest
    /// match first.
    pub fn tokenize_against_alphabet(&self, word: &str) -> Vec<String> {
        tokenize_against_alphabet(word, self.alphabet())
    }
}

/// Split `word` into alphabet symbols, longest match first.
///
/// At each position the longest alphabet symbol that is a prefix of the
/// rest of the word wins; when none matches, a single character is taken.
/// Every string is tokenizable.
pub fn tokenize_against_alphabet(word: &str, alphabet: &HashSet<String>) -> Vec<String> {
    let max_len = alphabet
        .iter()
        .map(|symbol| symbol.chars().count())
        .max()
        .unwrap_or(0);

    let mut tokens = Vec::new();
    let mut rest = word;
    while let Some(first) = rest.chars().next() {
        let mut token_len = first.len_utf8();
        // Byte offsets of the candidate prefix ends, one per character.
        for (chars, (offset, ch)) in rest.char_indices().enumerate() {
            if chars >= max_len {
                break;
            }
            let end = offset + ch.len_utf8();
            if alphabet.contains(&rest[..end]) {
                token_len = end;
            }
        }
        tokens.push(rest[..token_len].to_string());
        rest = &rest[token_len..];
    }
    tokens
}

/// Tokenizer for the input and output sides of lexicon rules.
///
/// - `'...'` is one symbol; inside it `\'` is a literal quote, and `'''`
///   is the quote symbol itself;
/// - a backslash makes the next character literal;
/// - an unescaped space is an epsilon alignment filler;
/// - declared multi-character symbols outside quotes are one symbol each,
///   longest declaration first;
/// - every other character is one symbol.
#[derive(Debug, Clone, Default)]
pub struct SideTokenizer {
    multichar: Vec<String>,
}

impl SideTokenizer {
    pub fn new<I, S>(multichar_symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut multichar: Vec<String> = multichar_symbols
            .into_iter()
            .map(Into::into)
            .filter(|symbol: &String| symbol.chars().count() > 1)
            .collect();
        multichar.sort_by_key(|symbol| std::cmp::Reverse(symbol.chars().count()));
        Self { multichar }
    }

    /// Tokenize one side of a rule. The empty side is a single epsilon.
    pub fn tokenize(&self, side: &str) -> Vec<String> {
        if side.is_empty() {
            return vec![EPSILON.to_string()];
        }
        let bytes = side.as_bytes();
        let mut tokens = Vec::new();
        let mut pos = 0;
        while pos < side.len() {
            let rest = &side[pos..];
            if bytes[pos] == b'\'' {
                if let Some((token, next)) = quoted_run(side, pos) {
                    tokens.push(token);
                    pos = next;
                    continue;
                }
            }
            if let Some(symbol) = self.multichar.iter().find(|s| rest.starts_with(s.as_str())) {
                tokens.push(symbol.clone());
                pos += symbol.len();
                continue;
            }
            let mut chars = rest.chars();
            let Some(ch) = chars.next() else { break };
            match (ch, chars.next()) {
                ('\\', Some(escaped)) => {
                    tokens.push(escaped.to_string());
                    pos += 1 + escaped.len_utf8();
                }
                (' ', _) => {
                    tokens.push(EPSILON.to_string());
                    pos += 1;
                }
                (ch, _) => {
                    tokens.push(ch.to_string());
                    pos += ch.len_utf8();
                }
            }
        }
        tokens
    }
}

/// Quoted symbol starting at byte `open` (a `'`). Returns the unescaped
/// symbol and the byte offset after the closing quote, or `None` when the
/// quote is never closed.
///
/// The closing quote is the first unescaped `'`. Without one, the quote of
/// the last `\'` closes the run and its backslash stays in the symbol.
fn quoted_run(side: &str, open: usize) -> Option<(String, usize)> {
    let bytes = side.as_bytes();
    if bytes.get(open + 1) == Some(&b'\'') && bytes.get(open + 2) == Some(&b'\'') {
        return Some(("'".to_string(), open + 3));
    }

    let mut close = None;
    let mut last_escaped = None;
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1) == Some(&b'\'') => {
                last_escaped = Some(i + 1);
                i += 2;
            }
            b'\'' => {
                close = Some(i);
                break;
            }
            _ => i += 1,
        }
    }
    let close = close.or(last_escaped)?;
    let symbol = side[open + 1..close].replace("\\'", "'");
    Some((symbol, close + 1))
}
