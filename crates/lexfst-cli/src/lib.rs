// lexfst-cli: shared utilities for CLI tools.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use lexfst::{ApplyOptions, Direction, Fst, LexiconDocument};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Environment variable naming the default lexicon file.
pub const LEXICON_ENV: &str = "LEXFST_LEXICON";

/// Environment variable holding the log filter (`warn` when unset).
pub const LOG_ENV: &str = "LEXFST_LOG";

/// Lexicon file looked up in the working directory as a last resort.
const DEFAULT_LEXICON: &str = "lexicon.json";

/// Options shared by the tools, parsed from the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOptions {
    pub lexicon: Option<String>,
    /// Overrides the lexicon file's start rule-set.
    pub start: Option<String>,
    pub apply: ApplyOptions,
    /// Maximum results per word (or words in total for `lexfst-words`).
    pub limit: Option<usize>,
    /// Tool-specific option and its value, e.g. `--format att`.
    pub format: Option<String>,
    /// Positional arguments.
    pub words: Vec<String>,
}

/// Parse the shared options. Unknown `-` options are errors; everything
/// else is positional.
pub fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .cloned()
                .ok_or_else(|| format!("{name} requires a value"))
        };
        if let Some(val) = arg.strip_prefix("--lexicon=") {
            options.lexicon = Some(val.to_string());
        } else if let Some(val) = arg.strip_prefix("--start=") {
            options.start = Some(val.to_string());
        } else if let Some(val) = arg.strip_prefix("--limit=") {
            options.limit = Some(parse_limit(val)?);
        } else if let Some(val) = arg.strip_prefix("--format=") {
            options.format = Some(val.to_string());
        } else {
            match arg.as_str() {
                "-l" | "--lexicon" => options.lexicon = Some(value(arg)?),
                "-s" | "--start" => options.start = Some(value(arg)?),
                "-n" | "--limit" => options.limit = Some(parse_limit(&value(arg)?)?),
                "-f" | "--format" => options.format = Some(value(arg)?),
                "-w" | "--weights" => options.apply.weights = true,
                "-t" | "--tokens" => options.apply.tokenize_outputs = true,
                "--no-flags" => options.apply.obey_flags = false,
                "--print-flags" => options.apply.print_flags = true,
                "-h" | "--help" => {}
                "-" => options.words.push(arg.clone()),
                other if other.starts_with('-') => return Err(format!("unknown option {other}")),
                _ => options.words.push(arg.clone()),
            }
        }
    }
    Ok(options)
}

fn parse_limit(value: &str) -> Result<usize, String> {
    value
        .parse()
        .map_err(|_| format!("invalid limit {value:?}: expected a non-negative integer"))
}

/// Install the stderr log subscriber, filtered by `LEXFST_LOG`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Find, read and compile the lexicon.
///
/// Search order:
/// 1. `path` argument (if provided)
/// 2. `LEXFST_LEXICON` environment variable
/// 3. `lexicon.json` in the current directory
pub fn load_lexicon(path: Option<&str>, start: Option<&str>) -> Result<Fst, String> {
    let candidates = build_search_paths(path);
    let Some(file) = candidates.iter().find(|p| p.is_file()) else {
        return Err(format!(
            "could not find a lexicon file in any of the search paths:\n{}",
            candidates
                .iter()
                .map(|p| format!("  - {}", p.display()))
                .collect::<Vec<_>>()
                .join("\n")
        ));
    };

    let text = std::fs::read_to_string(file)
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let mut document: LexiconDocument = serde_json::from_str(&text)
        .map_err(|e| format!("failed to parse {}: {e}", file.display()))?;
    if let Some(start) = start {
        document.start = start.to_string();
    }
    info!(path = %file.display(), start = %document.start, "loading lexicon");
    Fst::from_lexicon(&document).map_err(|e| format!("failed to compile {}: {e}", file.display()))
}

fn build_search_paths(path: Option<&str>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(p) = path {
        paths.push(PathBuf::from(p));
        // An explicit path is never second-guessed.
        return paths;
    }
    if let Ok(env_path) = std::env::var(LEXICON_ENV) {
        paths.push(PathBuf::from(env_path));
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(DEFAULT_LEXICON));
    }
    paths
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}

/// Call `f` for each positional word, or for each non-empty stdin line
/// when there are none.
pub fn for_each_word(words: &[String], mut f: impl FnMut(&str)) {
    if !words.is_empty() {
        words.iter().for_each(|w| f(w));
        return;
    }
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("error reading stdin: {e}");
                break;
            }
        };
        let word = line.trim();
        if !word.is_empty() {
            f(word);
        }
    }
}

/// Write every result for `word`, one per line:
/// `word<TAB>output[<TAB>cost]`, or `word<TAB>+?` when nothing matches.
pub fn write_results(
    out: &mut impl Write,
    fst: &Fst,
    word: &str,
    direction: Direction,
    options: &CliOptions,
) -> io::Result<()> {
    let results = fst.apply(word, direction, options.apply);
    let mut found = 0usize;
    for result in results.take(options.limit.unwrap_or(usize::MAX)) {
        found += 1;
        write!(out, "{word}\t")?;
        match &result.output {
            lexfst::Output::Text(text) => write!(out, "{text}")?,
            lexfst::Output::Tokens(tokens) => write!(out, "{}", tokens.join(" "))?,
        }
        if let Some(cost) = result.cost {
            write!(out, "\t{}", lexfst::format::format_weight(cost))?;
        }
        writeln!(out)?;
    }
    if found == 0 {
        writeln!(out, "{word}\t+?")?;
    }
    debug!(word, found, "applied");
    Ok(())
}

/// Write up to `limit` accepted paths as `input<TAB>output<TAB>cost`
/// lines. Stops at the first write error, so a cyclic lexicon stops as
/// soon as the reader goes away.
pub fn write_words(out: &mut impl Write, fst: &Fst, limit: usize) -> io::Result<()> {
    for word in fst.words().take(limit) {
        writeln!(
            out,
            "{}\t{}\t{}",
            word.input(),
            word.output(),
            lexfst::format::format_weight(word.cost)
        )?;
    }
    Ok(())
}

/// Write the AT&T export as files: `BASE` (transitions), `BASE.isyms`,
/// `BASE.osyms`, and `BASE.ssyms` with `state_symbols`. Returns the paths
/// written.
pub fn write_att_files(fst: &Fst, base: &Path, state_symbols: bool) -> io::Result<Vec<PathBuf>> {
    let att = fst.to_att(lexfst::format::ATT_EPSILON, state_symbols);
    let mut files = vec![
        (base.to_path_buf(), att.transitions),
        (with_suffix(base, "isyms"), att.isyms),
        (with_suffix(base, "osyms"), att.osyms),
    ];
    if let Some(ssyms) = att.ssyms {
        files.push((with_suffix(base, "ssyms"), ssyms));
    }
    let mut written = Vec::with_capacity(files.len());
    for (path, contents) in files {
        std::fs::write(&path, contents)?;
        info!(path = %path.display(), "wrote");
        written.push(path);
    }
    Ok(written)
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Shared main for `lexfst-generate` and `lexfst-analyze`.
pub fn run_apply(direction: Direction, args: &[String]) {
    init_logging();
    let options = parse_options(args).unwrap_or_else(|e| fatal(&e));
    let fst = load_lexicon(options.lexicon.as_deref(), options.start.as_deref())
        .unwrap_or_else(|e| fatal(&e));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    for_each_word(&options.words, |word| {
        if let Err(e) = write_results(&mut out, &fst, word, direction, &options) {
            fatal(&format!("failed to write output: {e}"));
        }
    });
    if let Err(e) = out.flush() {
        fatal(&format!("failed to write output: {e}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags_and_values() {
        let options = parse_options(&args(&[
            "-l", "nouns.json", "--start=Root", "-w", "-t", "--no-flags", "-n", "3", "cats",
        ]))
        .unwrap();
        assert_eq!(options.lexicon.as_deref(), Some("nouns.json"));
        assert_eq!(options.start.as_deref(), Some("Root"));
        assert!(options.apply.weights);
        assert!(options.apply.tokenize_outputs);
        assert!(!options.apply.obey_flags);
        assert!(!options.apply.print_flags);
        assert_eq!(options.limit, Some(3));
        assert_eq!(options.words, vec!["cats"]);
    }

    #[test]
    fn defaults_match_apply_defaults() {
        let options = parse_options(&args(&["word"])).unwrap();
        assert_eq!(options.apply, ApplyOptions::default());
        assert_eq!(options.limit, None);
    }

    #[test]
    fn missing_value_and_unknown_option_are_errors() {
        assert!(parse_options(&args(&["--lexicon"])).is_err());
        assert!(parse_options(&args(&["--limit", "many"])).is_err());
        assert!(parse_options(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn help_flag_is_detected() {
        assert!(wants_help(&args(&["x", "-h"])));
        assert!(!wants_help(&args(&["x"])));
    }

    /// Accepts `budget` bytes, then fails like a closed pipe.
    struct ClosingPipe {
        budget: usize,
    }

    impl Write for ClosingPipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn cyclic() -> Fst {
        let grammar = lexfst::Grammar::new()
            .with_rule("R", lexfst::Rule::new("a", "R"))
            .with_rule("R", lexfst::Rule::new("", "#"));
        Fst::rlg(&grammar, "R", &[] as &[&str]).unwrap()
    }

    #[test]
    fn words_are_bounded_by_limit() {
        let mut out = Vec::new();
        write_words(&mut out, &cyclic(), 3).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\t\t0.0\na\ta\t0.0\naa\taa\t0.0\n");
    }

    #[test]
    fn words_stop_when_the_reader_goes_away() {
        // Unbounded listing of an infinite language must still return.
        let err = write_words(&mut ClosingPipe { budget: 64 }, &cyclic(), usize::MAX).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn att_files_hold_pure_tables() {
        let dir = std::env::temp_dir().join(format!("lexfst-cli-att-{}", process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("net.att");
        let fst = Fst::from_strings(["ab"], &[] as &[&str]).unwrap();

        let written = write_att_files(&fst, &base, true).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["net.att", "net.att.isyms", "net.att.osyms", "net.att.ssyms"]);

        let transitions = std::fs::read_to_string(&base).unwrap();
        assert!(!transitions.contains('#'));
        assert!(transitions.lines().all(|l| l.split('\t').count() <= 5));
        let isyms = std::fs::read_to_string(dir.join("net.att.isyms")).unwrap();
        assert!(isyms.starts_with("@0@\t0\n"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn writes_results_and_misses() {
        let fst = Fst::from_strings(["cat"], &[] as &[&str]).unwrap();
        let options = CliOptions {
            apply: ApplyOptions::default().with_weights(true),
            ..CliOptions::default()
        };
        let mut out = Vec::new();
        write_results(&mut out, &fst, "cat", Direction::Generate, &options).unwrap();
        write_results(&mut out, &fst, "dog", Direction::Generate, &options).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "cat\tcat\t0.0\ndog\t+?\n");
    }
}
