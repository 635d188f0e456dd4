/// Preview — interactive generation shell for trying requests against a
/// lexicon.
///
/// Usage: preview [--lexicon <dir>] [--config <engine.ron>] [--seed <text>]
///
/// Commands:
///   gen                — generate one name with the current request
///   batch <n>          — generate n names with the batch MMR pass
///   set <field> <val>  — change a request field (see `fields`)
///   unset <field>      — reset a field to its default
///   show               — print the current request as JSON
///   explain            — score breakdown of the last result
///   warm <CN,TW,HK>    — load regions ahead of time
///   help               — list commands
///   quit               — exit
///
/// Set RUST_LOG=debug to watch the pipeline stages.
use std::io::{self, BufRead, Write};
use std::path::Path;

use chinese_name_engine::core::pipeline::{EngineConfig, NameEngine};
use chinese_name_engine::schema::element::{ChineseZodiac, Element};
use chinese_name_engine::schema::lexicon::{Gender, Region};
use chinese_name_engine::schema::request::{GenerationPosition, NameRequest, SelectionMode};
use chinese_name_engine::schema::result::NameResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    let mut config = EngineConfig::default();
    let mut seed = "42".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--lexicon" if i + 1 < args.len() => {
                i += 1;
                config.lexicon_dir = Some(args[i].clone().into());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config = EngineConfig::load_from_ron(Path::new(&args[i])).unwrap_or_else(|e| {
                    eprintln!("Error loading config '{}': {}", args[i], e);
                    std::process::exit(1);
                });
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].clone();
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut engine = match NameEngine::builder().with_config(config).build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error building engine: {}", e);
            std::process::exit(1);
        }
    };

    let mut request = NameRequest {
        seed: Some(seed.clone()),
        ..Default::default()
    };
    let mut last: Option<NameResult> = None;

    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "fields" => print_fields(),
            "gen" | "g" => {
                let result = engine.generate(&request);
                print_result(&result);
                last = Some(result);
            }
            "batch" => {
                let count = match parts.get(1).map(|s| s.parse::<usize>()) {
                    Some(Ok(n)) if n > 0 => n,
                    _ => {
                        println!("Usage: batch <n>");
                        continue;
                    }
                };
                let batch = NameRequest {
                    count,
                    ..request.clone()
                };
                let results = engine.generate_batch(&batch);
                println!("\n=== Batch: {} names ===\n", results.len());
                for result in &results {
                    print_result(result);
                }
                last = results.into_iter().next();
            }
            "set" => {
                if parts.len() < 3 {
                    println!("Usage: set <field> <value>");
                    continue;
                }
                let value = parts[2..].join(" ");
                match apply_field(&mut request, parts[1], &value) {
                    Ok(()) => println!("{} = {}", parts[1], value),
                    Err(msg) => println!("ERROR: {}", msg),
                }
            }
            "unset" => {
                if parts.len() < 2 {
                    println!("Usage: unset <field>");
                    continue;
                }
                match reset_field(&mut request, parts[1]) {
                    Ok(()) => println!("{} reset", parts[1]),
                    Err(msg) => println!("ERROR: {}", msg),
                }
            }
            "show" => match serde_json::to_string_pretty(&request) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("ERROR: {}", e),
            },
            "explain" => match &last {
                Some(result) => print_breakdown(result),
                None => println!("Nothing generated yet."),
            },
            "warm" => {
                let regions: Vec<Region> = parts
                    .get(1)
                    .map(|list| list.split(',').filter_map(Region::parse).collect())
                    .unwrap_or_default();
                if regions.is_empty() {
                    println!("Usage: warm <CN,TW,HK>");
                    continue;
                }
                engine.warm_up(&regions);
                println!("Loaded {:?}", regions);
            }
            other => println!("Unknown command: {}. Type 'help'.", other),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

fn apply_field(request: &mut NameRequest, field: &str, value: &str) -> Result<(), String> {
    let number = || value.parse::<f64>().map_err(|_| format!("'{}' is not a number", value));
    let count = || value.parse::<usize>().map_err(|_| format!("'{}' is not a count", value));
    let strokes = || value.parse::<u32>().map_err(|_| format!("'{}' is not a stroke count", value));
    let flag = || matches!(value, "true" | "on" | "yes" | "1");

    match field {
        "gender" => request.gender = Gender::parse(value).ok_or("gender: male, female, unisex")?,
        "region" => request.region = Region::parse(value).ok_or("region: CN, TW, HK")?,
        "mode" => request.mode = SelectionMode::parse(value).ok_or("mode: max, sample, beam")?,
        "seed" => request.seed = Some(value.to_string()),
        "surname" => request.surname = Some(value.to_string()),
        "theme" => request.theme = Some(value.to_string()),
        "style" => request.style = Some(value.to_string()),
        "era" => request.era = Some(value.to_string()),
        "element" => request.element = Some(Element::from_tag(value).ok_or("unknown element")?),
        "zodiac" => {
            request.chinese_zodiac = Some(ChineseZodiac::parse(value).ok_or("unknown zodiac")?)
        }
        "hour" => {
            let hour = value.parse::<u8>().map_err(|_| "hour: 0-23".to_string())?;
            request.birth_hour = Some(hour.min(23));
        }
        "min-strokes" => request.min_stroke_per_char = Some(strokes()?),
        "max-strokes" => request.max_stroke_per_char = Some(strokes()?),
        "temperature" => request.temperature = number()?,
        "top-k" => request.top_k = count()?,
        "top-p" => request.top_p = number()?,
        "trials" => request.trials = count()?,
        "beam" => request.beam_size = count()?,
        "uniqueness" => request.uniqueness = number()?,
        "mix" => request.cross_region_mix = number()?,
        "generation" => {
            let mut chars = value.chars();
            request.generation_char = chars.next();
            request.generation_position = match chars.next() {
                Some('2') => GenerationPosition::Second,
                _ => GenerationPosition::First,
            };
        }
        "literary" => request.prefer_literary = flag(),
        "aesthetics" => request.aesthetics = flag(),
        "numerology" => request.numerology = flag(),
        "balance" => request.balance_elements = flag(),
        "single" => request.allow_single_char = flag(),
        "block" => request.preferences.blocked_chars.extend(value.chars()),
        "like" => request.preferences.liked_chars.extend(value.chars()),
        _ => return Err(format!("unknown field '{}' (see 'fields')", field)),
    }
    Ok(())
}

fn reset_field(request: &mut NameRequest, field: &str) -> Result<(), String> {
    let defaults = NameRequest::default();
    match field {
        "surname" => request.surname = None,
        "theme" => request.theme = None,
        "style" => request.style = None,
        "era" => request.era = None,
        "element" => request.element = None,
        "zodiac" => request.chinese_zodiac = None,
        "hour" => request.birth_hour = None,
        "min-strokes" => request.min_stroke_per_char = None,
        "max-strokes" => request.max_stroke_per_char = None,
        "generation" => request.generation_char = None,
        "block" | "like" => request.preferences = defaults.preferences,
        _ => return Err(format!("'{}' cannot be unset", field)),
    }
    Ok(())
}

fn print_result(result: &NameResult) {
    let strokes = result
        .total_strokes
        .map(|s| format!("{} strokes", s))
        .unwrap_or_else(|| "strokes unknown".to_string());
    println!(
        "{}  [{}]  score {:.3}  ({}, {})",
        result.full_name, result.meta.romanization, result.meta.score, result.meta.strategy, strokes
    );
    if !result.meta.reasons.is_empty() {
        println!("    {}", result.meta.reasons.join("; "));
    }
}

fn print_breakdown(result: &NameResult) {
    let p = &result.meta.parts;
    let s = &p.semantic_parts;
    println!("\n--- {} ---", result.full_name);
    println!("  bigram        {:>7.3}  (×{:.2})", p.bigram, result.meta.params.weights.bigram);
    println!("  char weight   {:>7.3}  (stroke balance {:.2})", p.char_weight, p.stroke_balance);
    println!("  phonetic      {:>7.3}", p.phonetic);
    println!("  semantics     {:>7.3}", p.semantics);
    println!(
        "    theme {:.2} style {:.2} synergy {:.2} conflict {:.2} element {:.2}",
        s.theme, s.style, s.synergy, s.conflict, s.element
    );
    println!(
        "    zodiac {:.2}/{:.2} hour {:.2} literary {:.2} aesthetics {:.2}",
        s.chinese_zodiac, s.western_zodiac, s.birth_hour, s.literary, s.aesthetics
    );
    println!(
        "    generation {:.2} siblings {:.2} numerology {:.2} preference {:.2}",
        s.generation, s.siblings, s.numerology, s.preference
    );
    println!("  era           {:>7.3}", p.era);
    println!(
        "  penalties     {:>7.3}  (structure {:.2}, popularity {:.2}, homophone {:.2}, diversity {:.2})",
        p.penalty_total(),
        p.structure_penalty,
        p.popularity_penalty,
        p.homophone_penalty,
        p.diversity_penalty
    );
    println!(
        "  seed {} · pool {} · mode {}\n",
        result.meta.params.seed, result.meta.params.pool_size, result.meta.params.mode
    );
}

fn print_usage() {
    println!("Usage: preview [--lexicon <dir>] [--config <engine.ron>] [--seed <text>]");
}

fn print_help() {
    println!("Commands:");
    println!("  gen                — generate one name");
    println!("  batch <n>          — generate n names");
    println!("  set <field> <val>  — change a request field");
    println!("  unset <field>      — clear a request field");
    println!("  fields             — list settable fields");
    println!("  show               — print the request as JSON");
    println!("  explain            — score breakdown of the last result");
    println!("  warm <CN,TW,HK>    — load regions ahead of time");
    println!("  quit               — exit");
}

fn print_fields() {
    println!("  gender region mode seed surname theme style era element zodiac hour");
    println!("  min-strokes max-strokes temperature top-k top-p trials beam uniqueness mix");
    println!("  generation <char>[1|2]  literary aesthetics numerology balance single (on/off)");
    println!("  block <chars>  like <chars>");
}
