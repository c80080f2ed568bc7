use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use chartparse::Tree;
use log::{info, warn};

use cfg_translator::corpus::vocabulary;
use cfg_translator::pipeline::CoverageSummary;
use cfg_translator::report::{console_report, report_rows, write_jsonl};
use cfg_translator::{
    dedup_json, dedup_lines, tokenize, write_rendering, Resources, TranslatorConfig, Translator,
};

#[derive(Parser)]
#[command(name = "cfg-translate", version, about = "Tagalog to English translation with a context-free grammar")]
struct Opts {
    /// JSON configuration file. Fields it leaves out keep their defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(flatten)]
    resources: ResourceArgs,
    #[command(subcommand)]
    command: SubCommand,
}

#[derive(Args)]
struct ResourceArgs {
    /// Grammar rules in `LHS -> RHS | RHS` notation.
    #[arg(long, global = true)]
    grammar: Option<PathBuf>,
    /// Tab separated `TAG<TAB>word` lexicon.
    #[arg(long, global = true)]
    lexicon: Option<PathBuf>,
    /// JSON object mapping Tagalog words to English.
    #[arg(long, global = true)]
    dictionary: Option<PathBuf>,
    /// Tab separated parallel corpus.
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,
    /// Category for corpus tokens without a lexicon entry.
    #[arg(long, global = true)]
    fallback_category: Option<String>,
    /// Reject grammars that use undefined nonterminals.
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum SubCommand {
    /// Translates the whole corpus, prints a coverage report and writes JSON Lines.
    Corpus {
        /// Where to write the JSON Lines report.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Number of unparsed and parsed examples to print.
        #[arg(short = 'n', long)]
        examples: Option<usize>,
    },
    /// Translates one sentence and prints each stage.
    Sentence {
        sentence: String,
        /// Also print every constituent found.
        #[arg(long)]
        chart: bool,
    },
    /// Renders the parse tree of a sentence with Graphviz.
    Render {
        sentence: String,
        /// Output file. `.dot` writes the digraph; other extensions are passed to `dot`.
        #[arg(short, long, default_value = "parse_tree.dot")]
        path: PathBuf,
    },
    /// Rewrites a bracketed tree such as `(S (VP (V kumain)) (NP (N bata)))`.
    Rewrite { tree: String },
    /// Removes repeated lines from resource files in place.
    DedupLines {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Removes repeated keys from JSON object files in place.
    DedupJson {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

impl Opts {
    fn config(&self) -> anyhow::Result<TranslatorConfig> {
        let mut config = match &self.config {
            Some(path) => TranslatorConfig::from_path(path)?,
            None => TranslatorConfig::default(),
        };
        let args = &self.resources;
        if let Some(path) = &args.grammar {
            config.grammar = path.clone();
        }
        if let Some(path) = &args.lexicon {
            config.lexicon = path.clone();
        }
        if let Some(path) = &args.dictionary {
            config.dictionary = path.clone();
        }
        if let Some(path) = &args.corpus {
            config.corpus = path.clone();
        }
        if let Some(category) = &args.fallback_category {
            config.fallback_category = category.clone();
        }
        config.strict |= args.strict;
        Ok(config)
    }
}

/// Loads resources for single sentences. The corpus is optional here; without it, tokens
/// outside the lexicon get no fallback production.
fn load_for_sentence(config: &TranslatorConfig) -> anyhow::Result<Resources> {
    if config.corpus.exists() {
        Resources::load(config)
    } else {
        warn!(
            "corpus `{}` not found; building the grammar without fallback tokens",
            config.corpus.display()
        );
        Resources::load_without_corpus(config)
    }
}

fn translate_corpus(config: &TranslatorConfig) -> anyhow::Result<()> {
    let resources = Resources::load(config)?;

    let vocabulary: Vec<String> = vocabulary(&resources.corpus).into_iter().collect();
    let missing = resources.grammar.unknown_tokens(&vocabulary);
    if missing.is_empty() {
        info!("every corpus token has a lexical production");
    } else {
        warn!("corpus tokens without lexical productions: {}", missing.join(", "));
    }

    let translator = Translator::with_rules(
        &resources.grammar,
        &resources.dictionary,
        config.rewrite.clone(),
    );
    let sentences: Vec<Vec<String>> = resources.corpus.iter().map(|e| e.tokens.clone()).collect();
    let start = Instant::now();
    let results = translator.translate_corpus(&sentences);
    info!(
        "translated {} sentences in {:.3}s",
        results.len(),
        start.elapsed().as_secs_f32()
    );

    let summary = CoverageSummary::from_results(&results);
    print!(
        "{}",
        console_report(&resources.corpus, &results, &summary, config.examples)
    );

    let rows = report_rows(&resources.corpus, &results);
    write_jsonl(&config.output, &rows)
        .with_context(|| format!("failed to write report `{}`", config.output.display()))?;
    info!("wrote {} rows to {}", rows.len(), config.output.display());
    Ok(())
}

fn translate_sentence(config: &TranslatorConfig, sentence: &str, show_chart: bool) -> anyhow::Result<()> {
    let resources = load_for_sentence(config)?;
    let translator = Translator::with_rules(
        &resources.grammar,
        &resources.dictionary,
        config.rewrite.clone(),
    );
    let tokens = tokenize(sentence);

    if show_chart {
        match translator.parser().chart_parse(&tokens) {
            Ok(chart) => println!("{}\n", chart.pretty_format()),
            Err(reason) => println!("No chart: {}\n", reason),
        }
    }

    let result = translator.translate_tokens(&tokens);
    println!("Tokens:      {}", result.tokens.join(" "));
    match (result.outcome.tree(), &result.rewritten) {
        (Some(tree), Some(rewritten)) => {
            println!("\nParsed tree:\n{}", tree.pretty());
            println!("Rewritten tree:\n{}", rewritten.pretty());
            if let Some(text) = result.rewritten_text() {
                println!("Rewritten:   {}", text);
            }
        }
        _ => {
            if let Some(reason) = result.outcome.reason() {
                println!("Not parsed:  {}", reason);
            }
        }
    }
    println!("Translation: {}", result.translation);
    Ok(())
}

fn render(config: &TranslatorConfig, sentence: &str, path: &Path) -> anyhow::Result<()> {
    let resources = load_for_sentence(config)?;
    let translator = Translator::new(&resources.grammar, &resources.dictionary);
    let tree = translator
        .parser()
        .parse(&tokenize(sentence))
        .into_result()
        .map_err(|reason| anyhow!("cannot render `{}`: {}", sentence, reason))?;
    write_rendering(&tree, path)
        .with_context(|| format!("failed to render tree to `{}`", path.display()))?;
    println!("Wrote parse tree to {}", path.display());
    Ok(())
}

fn dedup_files<F>(paths: &[PathBuf], what: &str, dedup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> anyhow::Result<(String, usize)>,
{
    for path in paths {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let (deduped, removed) =
            dedup(&text).with_context(|| format!("failed to deduplicate `{}`", path.display()))?;
        std::fs::write(path, deduped)
            .with_context(|| format!("failed to write `{}`", path.display()))?;
        println!("Removed {} duplicate {} from {}", removed, what, path.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts: Opts = Opts::parse();
    match &opts.command {
        SubCommand::Corpus { output, examples } => {
            let mut config = opts.config()?;
            if let Some(output) = output {
                config.output = output.clone();
            }
            if let Some(examples) = examples {
                config.examples = *examples;
            }
            translate_corpus(&config)
        }
        SubCommand::Sentence { sentence, chart } => {
            translate_sentence(&opts.config()?, sentence, *chart)
        }
        SubCommand::Render { sentence, path } => render(&opts.config()?, sentence, path),
        SubCommand::Rewrite { tree } => {
            let config = opts.config()?;
            let tree = Tree::from_bracketed(tree)
                .map_err(|err| anyhow!("cannot read tree `{}`: {}", tree, err))?;
            println!("{}", config.rewrite.rewrite(&tree));
            Ok(())
        }
        SubCommand::DedupLines { paths } => {
            dedup_files(paths, "lines", |text| Ok(dedup_lines(text)))
        }
        SubCommand::DedupJson { paths } => {
            dedup_files(paths, "keys", |text| Ok(dedup_json(text)?))
        }
    }
}
