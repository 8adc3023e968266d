// lexfst-words: List the input/output pairs a lexicon accepts.
//
// Prints one `input<TAB>output<TAB>cost` line per accepted path in
// breadth-first order. Cyclic lexicons are infinite, so pass a limit.
//
// Usage:
//   lexfst-words [-l LEXICON] [-s START] [-n N]
//
// Options:
//   -l, --lexicon PATH   Lexicon JSON file (default: $LEXFST_LEXICON, ./lexicon.json)
//   -s, --start NAME     Start rule-set, overriding the lexicon file
//   -n, --limit N        Stop after N paths
//   -h, --help           Print help

use std::io::{self, Write};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if lexfst_cli::wants_help(&args) {
        println!("lexfst-words: List the input/output pairs a lexicon accepts.");
        println!();
        println!("Usage: lexfst-words [-l LEXICON] [-s START] [-n N]");
        println!();
        println!("Prints INPUT<TAB>OUTPUT<TAB>COST per accepted path, shortest first.");
        println!();
        println!("Options:");
        println!("  -l, --lexicon PATH   Lexicon JSON file");
        println!("  -s, --start NAME     Start rule-set, overriding the lexicon file");
        println!("  -n, --limit N        Stop after N paths");
        println!("  -h, --help           Print this help");
        return;
    }

    lexfst_cli::init_logging();
    let options = lexfst_cli::parse_options(&args).unwrap_or_else(|e| lexfst_cli::fatal(&e));
    let fst = lexfst_cli::load_lexicon(options.lexicon.as_deref(), options.start.as_deref())
        .unwrap_or_else(|e| lexfst_cli::fatal(&e));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let limit = options.limit.unwrap_or(usize::MAX);
    if let Err(e) = lexfst_cli::write_words(&mut out, &fst, limit).and_then(|()| out.flush()) {
        // A closed reader (e.g. `| head`) ends the listing.
        if e.kind() != io::ErrorKind::BrokenPipe {
            lexfst_cli::fatal(&format!("failed to write output: {e}"));
        }
    }
}
