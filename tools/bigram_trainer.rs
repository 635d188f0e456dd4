/// Bigram Trainer — builds a region bigram table from a list of given names.
///
/// Usage: bigram_trainer --input <names.txt> --output <bigrams.ron> [--min-count <n>]
///
/// Input lines hold given names separated by whitespace or commas.
/// `[era=1990s, gender=female]` lines tag the names that follow.
use std::env;
use std::path::Path;
use std::process;

use chinese_name_engine::core::bigram::{save_bigrams, BigramTrainer};

const USAGE: &str =
    "Usage: bigram_trainer --input <names.txt> --output <bigrams.ron> [--min-count <n>]";

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut output = None;
    let mut min_count = 1.0f64;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" if i + 1 < args.len() => {
                i += 1;
                input = Some(args[i].clone());
            }
            "--output" if i + 1 < args.len() => {
                i += 1;
                output = Some(args[i].clone());
            }
            "--min-count" if i + 1 < args.len() => {
                i += 1;
                min_count = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("Error: --min-count must be a number");
                    process::exit(1);
                });
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input_path = input.unwrap_or_else(|| {
        eprintln!("Error: --input is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let output_path = output.unwrap_or_else(|| {
        eprintln!("Error: --output is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let text = std::fs::read_to_string(&input_path).unwrap_or_else(|e| {
        eprintln!("Error reading input file '{}': {}", input_path, e);
        process::exit(1);
    });

    println!("Training bigrams from '{}'...", input_path);
    let mut bigrams = BigramTrainer::train(&text);
    let total = bigrams.len();
    bigrams.retain(|b| b.weight >= min_count);

    let tagged = bigrams
        .iter()
        .filter(|b| b.gender.is_some() || b.era.is_some())
        .count();
    println!(
        "Trained {} bigrams ({} below --min-count dropped, {} tagged)",
        bigrams.len(),
        total - bigrams.len(),
        tagged
    );

    save_bigrams(&bigrams, Path::new(&output_path)).unwrap_or_else(|e| {
        eprintln!("Error saving bigrams to '{}': {}", output_path, e);
        process::exit(1);
    });

    println!("Bigrams saved to '{}'", output_path);
}
