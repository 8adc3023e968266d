// lexfst-analyze: Analyze surface forms with a lexicon.
//
// Reads surface words from the arguments or from stdin (one per line)
// and prints every analysis the lexicon assigns them, cheapest first.
//
// Usage:
//   lexfst-analyze [-l LEXICON] [-s START] [-w] [-t] [-n N] [WORD...]
//
// Options:
//   -l, --lexicon PATH   Lexicon JSON file (default: $LEXFST_LEXICON, ./lexicon.json)
//   -s, --start NAME     Start rule-set, overriding the lexicon file
//   -w, --weights        Print the cost of each analysis
//   -t, --tokens         Print analyses as space-separated symbols
//   -n, --limit N        Print at most N analyses per word
//       --no-flags       Ignore flag diacritics
//       --print-flags    Keep flag diacritics in the output
//   -h, --help           Print help

use lexfst::Direction;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if lexfst_cli::wants_help(&args) {
        println!("lexfst-analyze: Analyze surface forms with a lexicon.");
        println!();
        println!("Usage: lexfst-analyze [-l LEXICON] [-s START] [-w] [-t] [-n N] [WORD...]");
        println!();
        println!("If WORD arguments are given, analyzes each word.");
        println!("Otherwise reads words from stdin (one per line).");
        println!("Words without an analysis are printed as WORD<TAB>+?.");
        println!();
        println!("Options:");
        println!("  -l, --lexicon PATH   Lexicon JSON file");
        println!("  -s, --start NAME     Start rule-set, overriding the lexicon file");
        println!("  -w, --weights        Print the cost of each analysis");
        println!("  -t, --tokens         Print analyses as space-separated symbols");
        println!("  -n, --limit N        Print at most N analyses per word");
        println!("      --no-flags       Ignore flag diacritics");
        println!("      --print-flags    Keep flag diacritics in the output");
        println!("  -h, --help           Print this help");
        return;
    }

    lexfst_cli::run_apply(Direction::Analyze, &args);
}
