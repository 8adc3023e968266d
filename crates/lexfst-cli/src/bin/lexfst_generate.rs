// lexfst-generate: Generate surface forms from analysis strings.
//
// Reads analysis strings (e.g. `cat+N+Pl`) from the arguments or from
// stdin (one per line) and prints every surface form the lexicon maps
// them to, cheapest first.
//
// Usage:
//   lexfst-generate [-l LEXICON] [-s START] [-w] [-t] [-n N] [WORD...]
//
// Options:
//   -l, --lexicon PATH   Lexicon JSON file (default: $LEXFST_LEXICON, ./lexicon.json)
//   -s, --start NAME     Start rule-set, overriding the lexicon file
//   -w, --weights        Print the cost of each result
//   -t, --tokens         Print outputs as space-separated symbols
//   -n, --limit N        Print at most N results per word
//       --no-flags       Ignore flag diacritics
//       --print-flags    Keep flag diacritics in the output
//   -h, --help           Print help

use lexfst::Direction;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if lexfst_cli::wants_help(&args) {
        println!("lexfst-generate: Generate surface forms from analysis strings.");
        println!();
        println!("Usage: lexfst-generate [-l LEXICON] [-s START] [-w] [-t] [-n N] [WORD...]");
        println!();
        println!("If WORD arguments are given, generates from each of them.");
        println!("Otherwise reads words from stdin (one per line).");
        println!("Words without a result are printed as WORD<TAB>+?.");
        println!();
        println!("Options:");
        println!("  -l, --lexicon PATH   Lexicon JSON file");
        println!("  -s, --start NAME     Start rule-set, overriding the lexicon file");
        println!("  -w, --weights        Print the cost of each result");
        println!("  -t, --tokens         Print outputs as space-separated symbols");
        println!("  -n, --limit N        Print at most N results per word");
        println!("      --no-flags       Ignore flag diacritics");
        println!("      --print-flags    Keep flag diacritics in the output");
        println!("  -h, --help           Print this help");
        return;
    }

    lexfst_cli::run_apply(Direction::Generate, &args);
}
