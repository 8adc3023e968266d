// lexfst-export: Compile a lexicon and write it in an interchange format.
//
// Usage:
//   lexfst-export [-l LEXICON] [-s START] [-f FORMAT] [--name NAME]
//   lexfst-export [-l LEXICON] [-s START] -o BASE [--state-symbols]
//
// Formats:
//   att    AT&T transition table (default)
//   json   Nested transition dictionary
//   js     JavaScript `var NAME = {...} ;` for browser runtimes
//   text   Human-readable listing
//
// Options:
//   -l, --lexicon PATH   Lexicon JSON file (default: $LEXFST_LEXICON, ./lexicon.json)
//   -s, --start NAME     Start rule-set, overriding the lexicon file
//   -f, --format FORMAT  Output format
//       --name NAME      Variable name for the js format (default: myNet)
//   -o, --output BASE    Write BASE, BASE.isyms, BASE.osyms (att only)
//       --state-symbols  Keep state names and also write BASE.ssyms
//   -h, --help           Print help

use std::io::{self, Write};
use std::path::Path;

use lexfst::format::ATT_EPSILON;

const DEFAULT_JS_NAME: &str = "myNet";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if lexfst_cli::wants_help(&args) {
        println!("lexfst-export: Compile a lexicon and write it in an interchange format.");
        println!();
        println!("Usage: lexfst-export [-l LEXICON] [-s START] [-f FORMAT] [--name NAME]");
        println!("       lexfst-export [-l LEXICON] [-s START] -o BASE [--state-symbols]");
        println!();
        println!("Formats: att (default), json, js, text");
        println!("Without -o the export goes to stdout.");
        println!();
        println!("Options:");
        println!("  -l, --lexicon PATH   Lexicon JSON file");
        println!("  -s, --start NAME     Start rule-set, overriding the lexicon file");
        println!("  -f, --format FORMAT  Output format");
        println!("      --name NAME      Variable name for the js format (default: myNet)");
        println!("  -o, --output BASE    Write BASE, BASE.isyms, BASE.osyms (att only)");
        println!("      --state-symbols  Keep state names and also write BASE.ssyms");
        println!("  -h, --help           Print this help");
        return;
    }

    let (name, args) = take_value(&args, "--name");
    let (short_base, args) = take_value(&args, "-o");
    let (long_base, args) = take_value(&args, "--output");
    let base = long_base.or(short_base);
    let state_symbols = args.iter().any(|a| a == "--state-symbols");
    let args: Vec<String> = args.into_iter().filter(|a| a != "--state-symbols").collect();

    lexfst_cli::init_logging();
    let options = lexfst_cli::parse_options(&args).unwrap_or_else(|e| lexfst_cli::fatal(&e));
    let fst = lexfst_cli::load_lexicon(options.lexicon.as_deref(), options.start.as_deref())
        .unwrap_or_else(|e| lexfst_cli::fatal(&e));

    let format = options.format.as_deref().unwrap_or("att");
    if let Some(base) = base {
        if format != "att" {
            lexfst_cli::fatal(&format!("-o writes att tables only, not {format:?}"));
        }
        lexfst_cli::write_att_files(&fst, Path::new(&base), state_symbols)
            .unwrap_or_else(|e| lexfst_cli::fatal(&format!("failed to write {base}: {e}")));
        return;
    }

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let written = match format {
        "att" => write!(out, "{}", fst.to_att(ATT_EPSILON, state_symbols).transitions),
        "json" => match serde_json::to_string(&fst.to_dict()) {
            Ok(json) => writeln!(out, "{json}"),
            Err(e) => lexfst_cli::fatal(&format!("failed to serialize: {e}")),
        },
        "js" => writeln!(out, "{}", fst.to_js(name.as_deref().unwrap_or(DEFAULT_JS_NAME))),
        "text" => write!(out, "{fst}"),
        other => lexfst_cli::fatal(&format!("unknown format {other:?} (expected att, json, js or text)")),
    };
    if let Err(e) = written.and_then(|()| out.flush()) {
        lexfst_cli::fatal(&format!("failed to write output: {e}"));
    }
}

/// Remove `flag VALUE` (or `flag=VALUE`) from the args, returning the value.
fn take_value(args: &[String], flag: &str) -> (Option<String>, Vec<String>) {
    let mut value = None;
    let mut rest = Vec::new();
    let prefix = format!("{flag}=");
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            value = Some(args[i + 1].clone());
            i += 2;
            continue;
        }
        if let Some(v) = args[i].strip_prefix(&prefix) {
            value = Some(v.to_string());
        } else {
            rest.push(args[i].clone());
        }
        i += 1;
    }
    (value, rest)
}
