use anyhow::{bail, Context, Result};
use examforge_lib::models::StudyPack;
use examforge_lib::services::text_processor::normalize_punctuation;
use examforge_lib::services::ConfigStore;
use examforge_lib::{init_logging, Analyzer};
use std::path::Path;

const USAGE: &str = "Usage:
  study_report <file.txt|file.docx|file.pdf> [--questions <n>] [--mcqs <n>] [--topics <n>]
               [--summary <n>] [--seed <n>] [--answer-question <q> --answer <a>]
               [--detect] [--rewrite] [--out <json_path>]

Notes:
  - Settings default to config.json in the examforge config directory.
  - Without --seed, questions, options and rewrites differ between runs.";

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_count(args: &[String], key: &str) -> Result<Option<usize>> {
    parse_arg_value(args, key)
        .map(|v| v.parse().with_context(|| format!("{} expects a number, got '{}'", key, v)))
        .transpose()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn print_pack(pack: &StudyPack) {
    println!("Words: {}  Sentences: {}", pack.stats.word_count, pack.stats.sentence_count);
    println!("Key topics: {}", pack.stats.key_topics.join(", "));
    println!();

    println!("Topics:");
    for (i, topic) in pack.document.topics.iter().enumerate() {
        println!("  [T{}] {}", i + 1, topic);
    }
    println!();

    println!("Questions ({}):", pack.questions.len());
    for (i, q) in pack.questions.iter().enumerate() {
        println!("  {:2}. {}", i + 1, q);
    }
    println!();

    println!("Multiple choice ({}):", pack.mcqs.len());
    for (i, item) in pack.mcqs.iter().enumerate() {
        println!("  {:2}. {}", i + 1, item.question);
        for (slot, option) in item.options.iter() {
            let marker = if slot == item.correct { "*" } else { " " };
            println!("      {}{}) {}", marker, slot, option);
        }
    }
    println!();

    println!("Summary:");
    println!("  {}", preview(&pack.summary, 1200));
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || has_flag(&args, "--help") {
        eprintln!("{}", USAGE);
        return Ok(());
    }

    init_logging();

    let store = ConfigStore::default_config_dir().map(ConfigStore::new);
    let mut config = store.map(|s| s.load_or_default()).unwrap_or_default();

    if let Some(n) = parse_count(&args, "--questions")? {
        config.analysis.num_questions = n;
    }
    if let Some(n) = parse_count(&args, "--mcqs")? {
        config.analysis.num_mcqs = n;
    }
    if let Some(n) = parse_count(&args, "--topics")? {
        config.analysis.num_topics = n;
    }
    if let Some(n) = parse_count(&args, "--summary")? {
        config.analysis.summary_sentences = n;
    }
    if let Some(seed) = parse_arg_value(&args, "--seed") {
        config.analysis.seed = Some(seed.parse().with_context(|| format!("invalid --seed '{}'", seed))?);
    }

    let answer_question = parse_arg_value(&args, "--answer-question");
    let answer = parse_arg_value(&args, "--answer");
    if answer_question.is_some() != answer.is_some() {
        bail!("--answer-question and --answer must be given together");
    }

    let path = Path::new(&args[1]);
    let analyzer = Analyzer::new(config);

    let extracted = analyzer
        .load_document(path)
        .with_context(|| format!("cannot load {}", path.display()))?;
    let text = normalize_punctuation(&extracted);

    println!("File: {}", path.display());
    println!("Extracted: {} chars ({} bytes)", text.chars().count(), text.len());
    println!("Embedder: {}", analyzer.embedder().model_name());
    println!();

    let pack = analyzer.prepare_study_pack(&text).await;
    print_pack(&pack);

    if let (Some(question), Some(answer)) = (answer_question, answer) {
        let eval = analyzer.evaluate_answer(&question, &answer).await;
        println!();
        println!("Answer evaluation: {:.1}/10", eval.score);
        println!("  {}", eval.feedback);
        for s in &eval.strengths {
            println!("  + {}", s);
        }
        for s in &eval.improvements {
            println!("  - {}", s);
        }
    }

    if has_flag(&args, "--detect") {
        let result = analyzer.detect_ai_content(&text);
        println!();
        println!(
            "AI detection: {} (probability {:.2})",
            result.verdict, result.ai_probability
        );
        let f = &result.features;
        println!(
            "  avg_sentence_length={:.1} readability={:.1} ai_word_ratio={:.3} repetition={:.3} variation={:.2} words={}",
            f.avg_sentence_length,
            f.readability_score,
            f.ai_word_ratio,
            f.repetition_ratio,
            f.sentence_variation,
            f.word_count
        );
    }

    if has_flag(&args, "--rewrite") {
        let result = analyzer.rewrite_text(&text);
        println!();
        println!("Rewrite:");
        println!("  {}", preview(&result.improved_text, 600));
        for change in &result.changes {
            println!("  * {}", change);
        }
    }

    if let Some(out_path) = parse_arg_value(&args, "--out") {
        let json = serde_json::to_string_pretty(&pack).context("serialize study pack")?;
        std::fs::write(&out_path, json).with_context(|| format!("write {}", out_path))?;
        println!();
        println!("Wrote {}", out_path);
    }

    Ok(())
}
